//! Footprint geocoding coordinator.
//!
//! Loads masked footprints, computes their centroids in a projected CRS and
//! reverse geocodes each centroid in row order, one request at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use geo::{Centroid, Point};
use tracing::{debug, info};

use crate::crs::{CentroidCrs, Crs, Transformer};
use crate::error::{GeocodeError, Result};
use crate::geocoder::ReverseGeocoder;
use crate::models::{FootprintCollection, Mask, NO_ADDRESS_FOUND};
use crate::pacing::{FixedInterval, Pacer, RateLimit};
use crate::parser::parse_addresses;
use crate::progress::Progress;
use crate::source::FootprintReader;

/// Cooperative stop signal, checked before each geocoding request
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reverse geocodes the footprints of a source that fall inside a mask.
///
/// Requests are strictly sequential: the progress counters and the pacer
/// both assume one request in flight.
pub struct FootprintGeocoder<S, G, P = FixedInterval> {
    source: S,
    mask: Mask,
    geocoder: G,
    pacer: P,
    progress: Progress,
    geocoded_footprints: Option<FootprintCollection>,
    cancel: CancelFlag,
}

impl<S, G> FootprintGeocoder<S, G, FixedInterval>
where
    S: FootprintReader,
    G: ReverseGeocoder,
{
    /// Geocoder sleeping `rate_limit` after every request
    pub fn new(source: S, mask: Mask, geocoder: G, rate_limit: RateLimit) -> Self {
        Self::with_pacer(source, mask, geocoder, FixedInterval::from(rate_limit))
    }
}

impl<S, G, P> FootprintGeocoder<S, G, P>
where
    S: FootprintReader,
    G: ReverseGeocoder,
    P: Pacer,
{
    pub fn with_pacer(source: S, mask: Mask, geocoder: G, pacer: P) -> Self {
        Self {
            source,
            mask,
            geocoder,
            pacer,
            progress: Progress::default(),
            geocoded_footprints: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Replace the mask. Takes effect on the next `load`.
    pub fn set_mask(&mut self, mask: Mask) {
        self.mask = mask;
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Result of the last completed batch
    pub fn geocoded_footprints(&self) -> Option<&FootprintCollection> {
        self.geocoded_footprints.as_ref()
    }

    /// Read the footprints intersecting the mask, in WGS84.
    ///
    /// Resets the progress counters to the size of the new batch.
    pub fn load(&mut self) -> Result<FootprintCollection> {
        let footprints = self.source.read_masked(&self.mask)?;
        self.progress = Progress::new(footprints.len());

        if footprints.crs.is_canonical() {
            return Ok(footprints);
        }

        info!(
            "Reprojecting {} footprints from {} to {}",
            footprints.len(),
            footprints.crs,
            Crs::WGS84
        );
        footprints.to_crs(Crs::WGS84)
    }

    /// Reverse geocode one WGS84 point, then wait out the rate limit.
    ///
    /// Returns the address, or `NO_ADDRESS_FOUND` when the service has no
    /// match. A failed request leaves `progress` untouched.
    pub async fn reverse_geocode_point(
        &self,
        point: Point<f64>,
        progress: &mut Progress,
    ) -> Result<String> {
        let location = self.geocoder.reverse(point).await?;

        progress.advance();
        println!("{progress}");
        debug!(
            "({}, {}) -> {:?}",
            point.x(),
            point.y(),
            location.as_ref().map(|l| l.address.as_str())
        );

        self.pacer.wait().await;

        Ok(location
            .map(|l| l.address)
            .unwrap_or_else(|| NO_ADDRESS_FOUND.to_string()))
    }

    /// Load, locate and reverse geocode every footprint in row order.
    ///
    /// Centroids are computed in `crs` and discarded once geocoded. The
    /// geocoded table is kept on the coordinator and returned.
    pub async fn reverse_geocode_footprints(
        &mut self,
        crs: impl Into<CentroidCrs>,
    ) -> Result<FootprintCollection> {
        let mut footprints = self.load()?;

        let anchor = self.mask.centroid().unwrap_or_else(|| Point::new(0.0, 0.0));
        let crs = crs.into().resolve(anchor);
        info!(
            "Reverse geocoding {} footprints (centroids in {})",
            footprints.len(),
            crs
        );

        let centroids = compute_centroids(&footprints, crs)?;

        let mut progress = self.progress;
        let outcome = self
            .geocode_centroids(&mut footprints, centroids, &mut progress)
            .await;
        self.progress = progress;
        outcome?;

        info!("Reverse geocoded {} footprints", progress.start_count);
        self.geocoded_footprints = Some(footprints.clone());
        Ok(footprints)
    }

    async fn geocode_centroids(
        &self,
        footprints: &mut FootprintCollection,
        centroids: Vec<Option<Point<f64>>>,
        progress: &mut Progress,
    ) -> Result<()> {
        for (footprint, centroid) in footprints.footprints.iter_mut().zip(centroids) {
            if self.cancel.is_cancelled() {
                return Err(GeocodeError::Cancelled {
                    processed: progress.start_count,
                    total: progress.total_count,
                });
            }

            let address = match centroid {
                Some(point) => self.reverse_geocode_point(point, progress).await?,
                None => {
                    // Empty geometry: nothing to send
                    progress.advance();
                    println!("{progress}");
                    NO_ADDRESS_FOUND.to_string()
                }
            };
            footprint.address = Some(address);
        }
        Ok(())
    }

    /// Derive `parsed_address` from `address` for every row
    pub fn address_parser(&self, geocoded: FootprintCollection) -> FootprintCollection {
        parse_addresses(geocoded)
    }
}

/// Centroid of every footprint, computed in `crs` and returned in WGS84.
/// `None` for empty geometries.
pub fn compute_centroids(
    footprints: &FootprintCollection,
    crs: Crs,
) -> Result<Vec<Option<Point<f64>>>> {
    let forward = Transformer::new(footprints.crs, crs)?;
    let back = Transformer::new(crs, Crs::WGS84)?;

    footprints
        .iter()
        .map(|footprint| {
            forward
                .transform_geometry(&footprint.geometry)?
                .centroid()
                .map(|c| back.transform_point(c))
                .transpose()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Footprint;
    use geo::{polygon, Geometry};

    #[test]
    fn test_centroid_metric_vs_degrees() {
        let footprints = FootprintCollection::new(
            Crs::WGS84,
            vec![
                Footprint::new(
                    polygon![
                        (x: -89.6500, y: 39.7800),
                        (x: -89.6496, y: 39.7800),
                        (x: -89.6496, y: 39.7803),
                        (x: -89.6500, y: 39.7803),
                    ]
                    .into(),
                ),
                Footprint::new(Geometry::Polygon(geo::Polygon::new(
                    geo::LineString::new(vec![]),
                    vec![],
                ))),
            ],
        );

        let utm = Crs::from_epsg(32616).unwrap();
        let centroids = compute_centroids(&footprints, utm).unwrap();

        let centroid = centroids[0].unwrap();
        assert!((centroid.x() - -89.6498).abs() < 1e-6);
        assert!((centroid.y() - 39.78015).abs() < 1e-6);
        assert_eq!(centroids[1], None);
    }

    #[test]
    fn test_cancel_flag_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
