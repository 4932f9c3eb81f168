use std::time::Instant;

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::gtfs::feed::Feed;

use super::error::Error;
use super::geo_util::PlanarProjection;
use super::route_geometry::{build_routes, RouteGeometry};
use super::service_buffer::{ServiceBuffer, BUFFER_RADIUS_METERS};

/// Everything derived from one uploaded feed: the route lines, the
/// service buffer around them, and the map center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coverage {
    pub routes: Vec<RouteGeometry>,
    pub buffer: ServiceBuffer,
    /// Mean position of all shape points (WGS84), used to center the map
    pub center: Coord,
    pub skipped_shapes: usize,
}

impl Coverage {
    /// Prints statistics about the derived geometry
    pub fn print_stats(&self) {
        println!("Coverage:");
        println!("  Routes: {}", self.routes.len());
        println!("  Skipped shapes: {}", self.skipped_shapes);
        println!("  Buffer parts: {}", self.buffer.area.0.len());
        println!("  Buffer radius: {} m", self.buffer.radius_meters);
    }

    /// Build coverage from a feed
    ///
    /// # Parameters
    /// - `feed`: The GTFS feed
    ///
    /// # Returns
    /// The coverage, or `Error::NoRoutes` when no shape has two or more
    /// points
    pub fn from_feed(feed: &Feed) -> Result<Coverage, Error> {
        let start = Instant::now();
        let (routes, skipped_shapes) = build_routes(feed);
        if routes.is_empty() {
            return Err(Error::NoRoutes);
        }
        log::debug!(
            "Built {} route(s), skipped {} shape(s) in {}ms",
            routes.len(),
            skipped_shapes,
            start.elapsed().as_millis()
        );

        let center = mean_position(feed);
        let projection = PlanarProjection::centered_on(center);

        let buffer_start = Instant::now();
        let buffer = ServiceBuffer::around(&routes, &projection, BUFFER_RADIUS_METERS);
        log::debug!(
            "Service buffer built in {}ms",
            buffer_start.elapsed().as_millis()
        );

        Ok(Coverage {
            routes,
            buffer,
            center,
            skipped_shapes,
        })
    }

    /// Read a feed from ZIP bytes and build coverage from it.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Coverage, Error> {
        let feed = Feed::from_zip_bytes(bytes)?;
        Coverage::from_feed(&feed)
    }

    /// Read a feed from a ZIP file or directory and build coverage.
    pub fn from_path(path: &str) -> Result<Coverage, Error> {
        let feed = Feed::from_path(path)?;
        Coverage::from_feed(&feed)
    }
}

/// Mean over every shape point in the feed, including points of shapes
/// too short to form a line.
fn mean_position(feed: &Feed) -> Coord {
    let mut sum = Coord { x: 0.0, y: 0.0 };
    for sp in &feed.shape_points {
        sum.x += sp.shape_pt_lon;
        sum.y += sp.shape_pt_lat;
    }
    let n = feed.shape_points.len() as f64;
    Coord {
        x: sum.x / n,
        y: sum.y / n,
    }
}
