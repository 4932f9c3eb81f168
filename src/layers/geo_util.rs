use geo::{Distance, Haversine, Point};
use geo_types::Coord;

/// Mean Earth radius in meters, the same sphere the haversine metric uses.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;
/// Meters spanned by one degree of latitude on that sphere.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Local planar frame in meters, anchored at a reference position.
///
/// An equirectangular projection: latitude maps to northing directly,
/// longitude is scaled by the cosine of the anchor latitude. Near the
/// anchor, planar distance agrees with haversine distance, which is what
/// makes a buffer radius given in meters meaningful at any latitude.
#[derive(Debug, Clone, Copy)]
pub struct PlanarProjection {
    anchor: Coord,
    meters_per_lon_degree: f64,
}

impl PlanarProjection {
    /// Builds a frame anchored at `anchor` (WGS84, lon/lat order).
    pub fn centered_on(anchor: Coord) -> PlanarProjection {
        PlanarProjection {
            anchor,
            meters_per_lon_degree: METERS_PER_DEGREE * anchor.y.to_radians().cos(),
        }
    }

    /// WGS84 coordinate to planar meters relative to the anchor.
    pub fn project(&self, c: Coord) -> Coord {
        Coord {
            x: (c.x - self.anchor.x) * self.meters_per_lon_degree,
            y: (c.y - self.anchor.y) * METERS_PER_DEGREE,
        }
    }

    /// Planar meters relative to the anchor back to WGS84.
    pub fn unproject(&self, c: Coord) -> Coord {
        Coord {
            x: self.anchor.x + c.x / self.meters_per_lon_degree,
            y: self.anchor.y + c.y / METERS_PER_DEGREE,
        }
    }
}

pub fn haversine(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    Haversine::distance(Point::new(x1, y1), Point::new(x2, y2))
}
