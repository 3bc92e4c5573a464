//! GeoJSON and GeoJSON-lines footprint files, optionally gzip-compressed.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use geo::{Geometry, Intersects};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use serde::Deserialize;
use tracing::{info, warn};

use super::FootprintReader;
use crate::crs::Crs;
use crate::error::{GeocodeError, Result};
use crate::models::{Footprint, FootprintCollection, Mask};

/// Layout of a footprint file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Decide from the file extension
    #[default]
    Auto,
    /// A single GeoJSON document
    FeatureCollection,
    /// One GeoJSON feature per line
    Lines,
}

impl SourceFormat {
    pub fn resolve(self, path: &Path) -> SourceFormat {
        if self != SourceFormat::Auto {
            return self;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let stem = name.strip_suffix(".gz").unwrap_or(&name);

        // Microsoft's global release ships GeoJSON lines as .csv.gz
        match stem.rsplit('.').next() {
            Some("geojsonl" | "geojsons" | "ndjson" | "jsonl" | "csv") => SourceFormat::Lines,
            _ => SourceFormat::FeatureCollection,
        }
    }
}

/// Footprints stored in a GeoJSON file on disk
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    path: PathBuf,
    format: SourceFormat,
    crs: Option<Crs>,
}

impl GeoJsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: SourceFormat::Auto,
            crs: None,
        }
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }

    /// Override whatever CRS the file declares
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }
}

impl FootprintReader for GeoJsonSource {
    fn read_masked(&self, mask: &Mask) -> Result<FootprintCollection> {
        info!("Reading footprints from {}", self.path.display());
        read_filtered(&self.path, self.format, self.crs, Some(mask))
    }
}

/// Read every feature of a GeoJSON file without filtering
pub fn read_collection(
    path: &Path,
    format: SourceFormat,
    crs_override: Option<Crs>,
) -> Result<FootprintCollection> {
    read_filtered(path, format, crs_override, None)
}

fn read_filtered(
    path: &Path,
    format: SourceFormat,
    crs_override: Option<Crs>,
    mask: Option<&Mask>,
) -> Result<FootprintCollection> {
    let reader = open(path)?;
    match format.resolve(path) {
        SourceFormat::Lines => read_lines(path, reader, crs_override, mask),
        _ => read_document(path, reader, crs_override, mask),
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|source| GeocodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let gzipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    Ok(if gzipped {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

fn read_document(
    path: &Path,
    mut reader: Box<dyn BufRead>,
    crs_override: Option<Crs>,
    mask: Option<&Mask>,
) -> Result<FootprintCollection> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source| GeocodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let document: GeoJson = text.parse().map_err(|e| invalid(path, e))?;

    match document {
        GeoJson::FeatureCollection(fc) => {
            let crs = resolve_crs(crs_override, fc.foreign_members.as_ref())?;
            let mut collector = Collector::new(path, crs, mask)?;
            for feature in fc.features {
                collector.push(feature)?;
            }
            Ok(collector.finish())
        }
        GeoJson::Feature(feature) => {
            let crs = resolve_crs(crs_override, feature.foreign_members.as_ref())?;
            let mut collector = Collector::new(path, crs, mask)?;
            collector.push(feature)?;
            Ok(collector.finish())
        }
        GeoJson::Geometry(geometry) => {
            let crs = resolve_crs(crs_override, geometry.foreign_members.as_ref())?;
            let mut collector = Collector::new(path, crs, mask)?;
            collector.push(Feature::from(geometry))?;
            Ok(collector.finish())
        }
    }
}

fn read_lines(
    path: &Path,
    reader: Box<dyn BufRead>,
    crs_override: Option<Crs>,
    mask: Option<&Mask>,
) -> Result<FootprintCollection> {
    // Line-delimited files have nowhere to declare a CRS
    let crs = crs_override.unwrap_or(Crs::WGS84);
    let mut collector = Collector::new(path, crs, mask)?;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| GeocodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed: GeoJson = line
            .parse()
            .map_err(|e| invalid(path, format!("line {}: {}", idx + 1, e)))?;

        match parsed {
            GeoJson::Feature(feature) => collector.push(feature)?,
            GeoJson::Geometry(geometry) => collector.push(Feature::from(geometry))?,
            GeoJson::FeatureCollection(fc) => {
                for feature in fc.features {
                    collector.push(feature)?;
                }
            }
        }
    }

    Ok(collector.finish())
}

/// CRS override, else the legacy (pre-RFC 7946) `crs` member, else WGS84
fn resolve_crs(crs_override: Option<Crs>, members: Option<&JsonObject>) -> Result<Crs> {
    if let Some(crs) = crs_override {
        return Ok(crs);
    }
    Ok(legacy_crs(members)?.unwrap_or(Crs::WGS84))
}

fn legacy_crs(members: Option<&JsonObject>) -> Result<Option<Crs>> {
    let Some(crs) = members.and_then(|m| m.get("crs")) else {
        return Ok(None);
    };
    let properties = crs.get("properties");

    // {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::3857"}}
    if let Some(name) = properties
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
    {
        return name.parse().map(Some);
    }

    // {"type": "EPSG", "properties": {"code": 3857}}
    if let Some(code) = properties
        .and_then(|p| p.get("code"))
        .and_then(JsonValue::as_u64)
    {
        let code = u16::try_from(code).map_err(|_| GeocodeError::InvalidCrs(code.to_string()))?;
        return Crs::from_epsg(code).map(Some);
    }

    warn!("Ignoring unrecognised crs member: {}", crs);
    Ok(None)
}

fn invalid(path: &Path, reason: impl ToString) -> GeocodeError {
    GeocodeError::GeoJson {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Accumulates masked footprints while a file is scanned
struct Collector<'a> {
    path: &'a Path,
    crs: Crs,
    mask: Option<Geometry<f64>>,
    footprints: Vec<Footprint>,
    scanned: usize,
}

impl<'a> Collector<'a> {
    fn new(path: &'a Path, crs: Crs, mask: Option<&Mask>) -> Result<Self> {
        let mask = mask.map(|m| m.to_crs(crs)).transpose()?;
        Ok(Self {
            path,
            crs,
            mask,
            footprints: Vec::new(),
            scanned: 0,
        })
    }

    fn push(&mut self, feature: Feature) -> Result<()> {
        self.scanned += 1;

        let Some(geometry) = feature.geometry else {
            warn!(
                "Skipping feature {} in {}: no geometry",
                self.scanned,
                self.path.display()
            );
            return Ok(());
        };
        let geometry = Geometry::<f64>::try_from(geometry).map_err(|e| invalid(self.path, e))?;

        if let Some(mask) = &self.mask {
            if !mask.intersects(&geometry) {
                return Ok(());
            }
        }

        let mut properties = feature.properties.unwrap_or_default();
        let address = match properties.remove("address") {
            Some(JsonValue::String(address)) => Some(address),
            Some(other) => {
                properties.insert("address".to_string(), other);
                None
            }
            None => None,
        };
        // Derived from address, rebuilt by the parser
        properties.remove("parsed_address");

        self.footprints.push(Footprint {
            geometry,
            properties,
            address,
            parsed_address: None,
        });
        Ok(())
    }

    fn finish(self) -> FootprintCollection {
        info!(
            "Read {} of {} features from {} ({})",
            self.footprints.len(),
            self.scanned,
            self.path.display(),
            self.crs
        );
        FootprintCollection::new(self.crs, self.footprints)
    }
}
