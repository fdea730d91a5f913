use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::GeoPoint;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_USER_AGENT: &str = "nyaysathi_nearby";

/// Appended to every free-text location before geocoding.
pub const COUNTRY_QUALIFIER: &str = ", India";

/// One raw result from a geocoding backend. Coordinates are kept as received
/// (Nominatim sends them as strings) and parsed on use.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lon: Value,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl RawPlace {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((float_of(&self.lat)?, float_of(&self.lon)?))
    }

    pub fn to_geo_point(&self) -> Option<GeoPoint> {
        let (latitude, longitude) = self.coordinates()?;
        let name = self.display_name.clone().unwrap_or_default();
        Some(GeoPoint {
            latitude,
            longitude,
            display_name: name.clone(),
            address: name,
        })
    }
}

fn float_of(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Free-text place lookup.
#[async_trait]
pub trait PlaceBackend: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawPlace>>;
}

/// OpenStreetMap Nominatim search API.
pub struct Nominatim {
    client: reqwest::Client,
    base_url: String,
}

impl Nominatim {
    pub fn from_env() -> Result<Self> {
        let base_url =
            dotenv::var("NOMINATIM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let user_agent =
            dotenv::var("NOMINATIM_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        Self::new(base_url, &user_agent)
    }

    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        // Nominatim's usage policy requires an identifying user agent.
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PlaceBackend for Nominatim {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawPlace>> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let limit = limit.to_string();
        let places: Vec<RawPlace> = self
            .client
            .get(url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", limit.as_str())])
            .send()
            .await
            .context("geocoding request failed")?
            .error_for_status()
            .context("geocoding service returned an error")?
            .json()
            .await
            .context("geocoding response is not a result list")?;
        debug!(query, count = places.len(), "geocoder results");
        Ok(places)
    }
}

/// Client-side politeness settings for the geocoding service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    /// Minimum spacing between consecutive requests.
    pub min_delay: Duration,
    /// Extra attempts after a failed request (location lookups only).
    pub max_retries: u32,
    /// Pause before retrying a failed request.
    pub error_wait: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_retries: 2,
            error_wait: Duration::from_secs(2),
        }
    }
}

/// The one shared, throttled handle onto a geocoding backend. Built once at
/// startup and handed to both `Geocoder` and `PlaceSearcher`.
pub struct GeocodingService {
    backend: Arc<dyn PlaceBackend>,
    limits: RateLimit,
    last_request: Mutex<Option<Instant>>,
}

impl GeocodingService {
    pub fn new(backend: Arc<dyn PlaceBackend>, limits: RateLimit) -> Self {
        Self {
            backend,
            limits,
            last_request: Mutex::new(None),
        }
    }

    pub fn limits(&self) -> RateLimit {
        self.limits
    }

    /// Wait until `min_delay` has passed since the previous request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.limits.min_delay {
                sleep(self.limits.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// A single throttled request.
    pub async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<RawPlace>> {
        self.throttle().await;
        self.backend.search(query, limit).await
    }

    /// A throttled request retried up to `max_retries` times.
    pub async fn lookup_with_retries(&self, query: &str, limit: usize) -> Result<Vec<RawPlace>> {
        let mut attempt = 0;
        loop {
            match self.lookup(query, limit).await {
                Ok(places) => return Ok(places),
                Err(e) if attempt < self.limits.max_retries => {
                    attempt += 1;
                    warn!(query, attempt, error = %e, "geocoding failed, retrying");
                    sleep(self.limits.error_wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Resolves a pincode or city name to a point.
pub struct Geocoder {
    service: Arc<GeocodingService>,
}

impl Geocoder {
    pub fn new(service: Arc<GeocodingService>) -> Self {
        Self { service }
    }

    pub async fn resolve(&self, text: &str) -> Option<GeoPoint> {
        let query = format!("{}{}", text.trim(), COUNTRY_QUALIFIER);
        match self.service.lookup_with_retries(&query, 1).await {
            Ok(places) => {
                let point = places.first().and_then(RawPlace::to_geo_point);
                if point.is_none() {
                    debug!(query, "location not found");
                }
                point
            }
            Err(e) => {
                warn!(query, error = %e, "geocoding gave up");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nearby::testing::{place, ScriptedBackend};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(backend: Arc<ScriptedBackend>, limits: RateLimit) -> Arc<GeocodingService> {
        Arc::new(GeocodingService::new(backend, limits))
    }

    fn no_wait(max_retries: u32) -> RateLimit {
        RateLimit {
            min_delay: Duration::ZERO,
            max_retries,
            error_wait: Duration::ZERO,
        }
    }

    #[test]
    fn test_raw_place_coordinates() {
        assert_eq!(place("12.97", "77.59", "x").coordinates(), Some((12.97, 77.59)));
        let numeric = RawPlace {
            lat: json!(1.5),
            lon: json!(-2),
            display_name: None,
        };
        assert_eq!(numeric.coordinates(), Some((1.5, -2.0)));
        assert_eq!(place("north", "77.59", "x").coordinates(), None);
        assert_eq!(place("NaN", "77.59", "x").coordinates(), None);
    }

    #[tokio::test]
    async fn test_resolve_appends_country() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![place(
            "12.9716",
            "77.5946",
            "Bengaluru, Karnataka, India",
        )])]));
        let geocoder = Geocoder::new(service(backend.clone(), no_wait(2)));

        let point = geocoder.resolve("560001 Bengaluru").await.unwrap();
        assert_eq!(point.latitude, 12.9716);
        assert_eq!(point.address, "Bengaluru, Karnataka, India");
        assert_eq!(
            backend.queries(),
            vec![("560001 Bengaluru, India".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_resolve_retries_then_succeeds() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err("timeout"),
            Ok(vec![place("19.07", "72.87", "Mumbai")]),
        ]));
        let geocoder = Geocoder::new(service(backend.clone(), no_wait(2)));

        assert!(geocoder.resolve("Mumbai").await.is_some());
        assert_eq!(backend.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_gives_up_after_retries() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err("down"),
            Err("down"),
            Err("down"),
            Ok(vec![place("1", "1", "never reached")]),
        ]));
        let geocoder = Geocoder::new(service(backend.clone(), no_wait(2)));

        assert_eq!(geocoder.resolve("Nowhere").await, None);
        assert_eq!(backend.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_empty_result() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![])]));
        let geocoder = Geocoder::new(service(backend, no_wait(0)));
        assert_eq!(geocoder.resolve("zzzz").await, None);
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let backend = Arc::new(ScriptedBackend::new(vec![Ok(vec![]), Ok(vec![])]));
        let limits = RateLimit {
            min_delay: Duration::from_millis(50),
            ..no_wait(0)
        };
        let service = service(backend, limits);

        let start = Instant::now();
        service.lookup("a", 1).await.unwrap();
        service.lookup("b", 1).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_nominatim_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Pune, India"))
            .and(query_param("format", "jsonv2"))
            .and(query_param("limit", "1"))
            .and(header("user-agent", "nyaysathi_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"lat": "18.5204", "lon": "73.8567", "display_name": "Pune, Maharashtra, India", "place_id": 1}
            ])))
            .mount(&server)
            .await;

        let nominatim = Nominatim::new(server.uri(), "nyaysathi_test").unwrap();
        let places = nominatim.search("Pune, India", 1).await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].coordinates(), Some((18.5204, 73.8567)));
    }

    #[tokio::test]
    async fn test_nominatim_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let nominatim = Nominatim::new(server.uri(), "nyaysathi_test").unwrap();
        assert!(nominatim.search("Pune", 1).await.is_err());
    }
}
