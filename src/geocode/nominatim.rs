use geo_types::Point;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "buffer-service";

/// Queries with fewer characters than this never reach the network.
const MIN_QUERY_CHARS: usize = 4;

/// One forward-geocoding candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPoint {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl GeocodedPoint {
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

/// Response item from the search service; coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct SearchItem {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("geocoding request failed: {0}")]
    Send(String),
    #[error("geocoding response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("geocoding service returned status {0}")]
    Status(u16),
}

/// Forward-geocoding client for a Nominatim-style search endpoint.
///
/// Holds configuration only and is cheap to clone; the HTTP client
/// itself is built per call. Lookups are best effort: one attempt, and
/// any failure degrades to an empty candidate list.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: String,
    user_agent: String,
}

impl Client {
    pub fn new(endpoint: &str, user_agent: &str) -> Client {
        Client {
            endpoint: endpoint.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Searches for an address
    ///
    /// # Parameters
    /// - `query`: Free-text address query
    ///
    /// # Returns
    /// Up to 7 candidates. Empty when the trimmed query is 3 characters
    /// or fewer, and on any lookup failure.
    pub async fn search(&self, query: &str) -> Vec<GeocodedPoint> {
        let query = query.trim();
        if too_short(query) {
            return Vec::new();
        }
        match self.request(query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Geocoding lookup for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn request(&self, query: &str) -> Result<Vec<GeocodedPoint>, Error> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "7"),
            ],
        )?;

        let client = awc::Client::default();
        let mut res = client
            .get(url.as_str())
            .insert_header(("User-Agent", self.user_agent.as_str()))
            .send()
            .await
            .map_err(|e| Error::Send(e.to_string()))?;

        if !res.status().is_success() {
            return Err(Error::Status(res.status().as_u16()));
        }

        let body = res
            .body()
            .limit(2 * 1024 * 1024)
            .await
            .map_err(|e| Error::Send(e.to_string()))?;
        parse_candidates(&body)
    }
}

fn too_short(query: &str) -> bool {
    query.chars().count() < MIN_QUERY_CHARS
}

/// Candidates whose coordinates fail to parse are dropped.
fn parse_candidates(body: &[u8]) -> Result<Vec<GeocodedPoint>, Error> {
    let items: Vec<SearchItem> = serde_json::from_slice(body)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match (item.lat.parse::<f64>(), item.lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Some(GeocodedPoint {
                label: item.display_name,
                lat,
                lon,
            }),
            _ => {
                warn!(
                    "Dropping candidate '{}' with unparseable coordinates",
                    item.display_name
                );
                None
            }
        })
        .collect())
}
