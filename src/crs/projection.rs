//! Coordinate transformation between EPSG systems using proj4rs.

use geo::{Coord, Geometry, MapCoords, Point};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use super::Crs;
use crate::error::{GeocodeError, Result};

/// Reprojects coordinates from one CRS to another.
///
/// The proj4rs definitions are parsed once, so a transformer can be reused
/// across a whole footprint collection.
pub struct Transformer {
    from: Crs,
    to: Crs,
    // None when both systems are the same
    projs: Option<(Proj, Proj)>,
}

impl Transformer {
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        if from == to {
            return Ok(Self {
                from,
                to,
                projs: None,
            });
        }

        let source = Self::load(from, from, to)?;
        let target = Self::load(to, from, to)?;

        Ok(Self {
            from,
            to,
            projs: Some((source, target)),
        })
    }

    fn load(crs: Crs, from: Crs, to: Crs) -> Result<Proj> {
        let definition = crs
            .proj_string()
            .ok_or(GeocodeError::UnsupportedCrs(crs.epsg()))?;
        Proj::from_proj_string(definition).map_err(|e| {
            projection_error(from, to, format!("invalid definition of {crs}: {e:?}"))
        })
    }

    pub fn is_noop(&self) -> bool {
        self.projs.is_none()
    }

    pub fn transform_coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let Some((source, target)) = &self.projs else {
            return Ok(coord);
        };

        // proj4rs works in radians for geographic systems
        let mut point = if self.from.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(source, target, &mut point)
            .map_err(|e| projection_error(self.from, self.to, format!("{e:?}")))?;

        let (x, y) = if self.to.is_geographic() {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(projection_error(
                self.from,
                self.to,
                format!("({}, {}) has no finite image", coord.x, coord.y),
            ));
        }

        Ok(Coord { x, y })
    }

    pub fn transform_point(&self, point: Point<f64>) -> Result<Point<f64>> {
        self.transform_coord(point.0).map(Point::from)
    }

    pub fn transform_geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        if self.is_noop() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|coord| self.transform_coord(coord))
    }
}

fn projection_error(from: Crs, to: Crs, reason: String) -> GeocodeError {
    GeocodeError::Projection {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    }
}
