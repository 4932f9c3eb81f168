use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::geocode::nominatim::{Client, GeocodedPoint};
use crate::layers::coverage::Coverage;
use crate::render::html::AddressMarker;

/// The two address roles a user can check against the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Start,
    End,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Start => "Start",
            Role::End => "End",
        }
    }
}

/// Containment verdict for one selected address.
#[derive(Debug, Clone, Serialize)]
pub struct ContainmentResult {
    pub role: Role,
    pub point: GeocodedPoint,
    pub within: bool,
}

impl ContainmentResult {
    /// One of exactly two user-facing messages per role.
    pub fn message(&self) -> String {
        if self.within {
            format!(
                "{} address is within ¾ mile of the transit network.",
                self.role.label()
            )
        } else {
            format!("{} address is outside the ¾-mile buffer.", self.role.label())
        }
    }

    pub fn marker(&self) -> AddressMarker {
        AddressMarker {
            label: self.point.label.clone(),
            lat: self.point.lat,
            lon: self.point.lon,
            within: self.within,
        }
    }
}

/// State for the one session this server hosts.
///
/// Each field has a single writer: a feed upload replaces `coverage`, a
/// confirm commits the role selections and raises `show_map`. Selections
/// survive a feed replacement; the show-map flag does not, so a stale
/// verdict is never displayed against a new feed.
#[derive(Debug, Default)]
pub struct Session {
    pub coverage: Option<Coverage>,
    pub start: Option<GeocodedPoint>,
    pub end: Option<GeocodedPoint>,
    pub show_map: bool,
}

impl Session {
    pub fn selection(&self, role: Role) -> Option<&GeocodedPoint> {
        match role {
            Role::Start => self.start.as_ref(),
            Role::End => self.end.as_ref(),
        }
    }

    pub fn set_selection(&mut self, role: Role, point: GeocodedPoint) {
        match role {
            Role::Start => self.start = Some(point),
            Role::End => self.end = Some(point),
        }
    }

    pub fn install_coverage(&mut self, coverage: Coverage) {
        self.coverage = Some(coverage);
        self.show_map = false;
    }

    pub fn clear_coverage(&mut self) {
        self.coverage = None;
        self.show_map = false;
    }

    /// Containment verdicts for every selected address, start first.
    pub fn check_selections(&self) -> Vec<ContainmentResult> {
        let coverage = match &self.coverage {
            Some(coverage) => coverage,
            None => return Vec::new(),
        };
        [Role::Start, Role::End]
            .into_iter()
            .filter_map(|role| {
                self.selection(role).map(|point| ContainmentResult {
                    role,
                    within: coverage.buffer.contains(point.point()),
                    point: point.clone(),
                })
            })
            .collect()
    }

    pub fn markers(&self) -> Vec<AddressMarker> {
        self.check_selections()
            .iter()
            .map(|result| result.marker())
            .collect()
    }
}

/// Shared application state: the session plus the geocoding configuration.
pub struct AppState {
    pub session: Mutex<Session>,
    pub geocoder: Client,
}
