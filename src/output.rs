//! Writers for geocoded footprint tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::{GeocodeError, Result};
use crate::models::FootprintCollection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoJson,
    /// Address columns only, keyed by row index
    Csv,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::GeoJson,
        }
    }
}

/// Write a collection, picking the format from the file extension
pub fn write_footprints(path: &Path, footprints: &FootprintCollection) -> Result<()> {
    match OutputFormat::from_path(path) {
        OutputFormat::GeoJson => write_geojson(path, footprints)?,
        OutputFormat::Csv => write_csv(path, footprints)?,
    }
    info!("Wrote {} footprints to {}", footprints.len(), path.display());
    Ok(())
}

/// GeoJSON with `address` and `parsed_address` added to each feature's
/// properties
pub fn to_feature_collection(footprints: &FootprintCollection) -> FeatureCollection {
    let features = footprints
        .iter()
        .map(|footprint| {
            let mut properties = footprint.properties.clone();
            properties.insert(
                "address".to_string(),
                footprint
                    .address
                    .clone()
                    .map(JsonValue::String)
                    .unwrap_or(JsonValue::Null),
            );
            properties.insert(
                "parsed_address".to_string(),
                footprint
                    .parsed_address
                    .as_ref()
                    .map(|p| JsonValue::String(p.to_string()))
                    .unwrap_or(JsonValue::Null),
            );

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &footprint.geometry,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    // Anything other than WGS84 needs the legacy crs member to be read back
    let foreign_members = (!footprints.crs.is_canonical()).then(|| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            json!({
                "type": "name",
                "properties": {
                    "name": format!("urn:ogc:def:crs:EPSG::{}", footprints.crs.epsg())
                }
            }),
        );
        members
    });

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| GeocodeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn write_geojson(path: &Path, footprints: &FootprintCollection) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer(&mut writer, &to_feature_collection(footprints))?;
    writer.flush().map_err(|source| GeocodeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
struct CsvRow<'a> {
    index: usize,
    address: Option<&'a str>,
    parsed_address: Option<String>,
}

fn write_csv(path: &Path, footprints: &FootprintCollection) -> Result<()> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    for (index, footprint) in footprints.iter().enumerate() {
        writer.serialize(CsvRow {
            index,
            address: footprint.address.as_deref(),
            parsed_address: footprint.parsed_address.as_ref().map(|p| p.to_string()),
        })?;
    }
    writer.flush().map_err(|source| GeocodeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use crate::models::{Footprint, NO_ADDRESS_FOUND};
    use crate::parser::parse_addresses;
    use crate::source::{read_collection, SourceFormat};
    use geo::{Geometry, Point};

    fn geocoded() -> FootprintCollection {
        let mut found = Footprint::new(Geometry::Point(Point::new(-89.65, 39.78)));
        found.properties.insert("release".to_string(), json!(1));
        found.address = Some(
            "123 Main St, Springfield, Clark County, Illinois, 62704, United States".to_string(),
        );

        let mut missing = Footprint::new(Geometry::Point(Point::new(-89.61, 39.76)));
        missing.address = Some(NO_ADDRESS_FOUND.to_string());

        parse_addresses(FootprintCollection::new(Crs::WGS84, vec![found, missing]))
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.CSV")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_path(Path::new("out.geojson")),
            OutputFormat::GeoJson
        );
    }

    #[test]
    fn test_feature_properties() {
        let fc = to_feature_collection(&geocoded());
        assert!(fc.foreign_members.is_none());

        let first = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(first["release"], 1);
        assert_eq!(
            first["parsed_address"],
            "123 Main St\nSpringfield, Illinois 62704"
        );

        let second = fc.features[1].properties.as_ref().unwrap();
        assert_eq!(second["address"], NO_ADDRESS_FOUND);
        assert!(second["parsed_address"].is_null());
    }

    #[test]
    fn test_geojson_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geocoded.geojson");
        let original = geocoded();
        write_footprints(&path, &original).unwrap();

        let restored =
            parse_addresses(read_collection(&path, SourceFormat::Auto, None).unwrap());
        assert_eq!(restored, original);
    }

    #[test]
    fn test_csv_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geocoded.csv");
        write_footprints(&path, &geocoded()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["index", "address", "parsed_address"]);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][2], "123 Main St\nSpringfield, Illinois 62704");
        assert_eq!(&rows[1][1], NO_ADDRESS_FOUND);
        assert_eq!(&rows[1][2], "");
    }
}
