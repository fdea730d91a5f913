use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::geocoder::{GeocodingService, RawPlace};
use super::{GeoPoint, NearbyHit};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two (lat, lon) pairs in degrees.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Query strings to try for a category, most specific first.
pub fn query_variants(category: &str, reference: &GeoPoint) -> [String; 4] {
    let (lat, lon) = (reference.latitude, reference.longitude);
    [
        format!("{} near {},{}", category, lat, lon),
        format!("{} near India", category),
        format!("{} {} {}", category, lat, lon),
        format!("{} India", category),
    ]
}

/// Best-effort nearby search on top of the geocoding service.
pub struct PlaceSearcher {
    service: Arc<GeocodingService>,
}

impl PlaceSearcher {
    pub fn new(service: Arc<GeocodingService>) -> Self {
        Self { service }
    }

    /// Up to `limit` distinct places for `category`, nearest first. Uses the
    /// first query variant that returns anything; never fails.
    pub async fn search(&self, category: &str, reference: &GeoPoint, limit: usize) -> Vec<NearbyHit> {
        if limit == 0 {
            return Vec::new();
        }
        // Over-fetch so deduplication still leaves enough.
        let fetch = limit.saturating_mul(2);

        let mut places = Vec::new();
        for query in query_variants(category, reference) {
            match self.service.lookup(&query, fetch).await {
                Ok(found) if !found.is_empty() => {
                    debug!(query, count = found.len(), "search variant matched");
                    places = found;
                    break;
                }
                Ok(_) => debug!(query, "search variant empty"),
                Err(e) => warn!(query, error = %e, "search variant failed"),
            }
        }

        let hits: Vec<NearbyHit> = places
            .iter()
            .filter_map(|p| to_hit(p, category, reference))
            .collect();
        let hits = dedupe(hits, limit);
        info!(category, count = hits.len(), "nearby search complete");
        hits
    }
}

fn to_hit(place: &RawPlace, category: &str, reference: &GeoPoint) -> Option<NearbyHit> {
    let Some((latitude, longitude)) = place.coordinates() else {
        debug!(?place, "skipping place with unusable coordinates");
        return None;
    };
    let distance = haversine_km(
        (reference.latitude, reference.longitude),
        (latitude, longitude),
    );
    let display_name = place.display_name.clone().filter(|n| !n.is_empty());
    Some(NearbyHit {
        name: display_name.clone().unwrap_or_else(|| category.to_string()),
        address: display_name.unwrap_or_default(),
        latitude,
        longitude,
        distance_km: round2(distance),
    })
}

/// Collapse hits that share a 5-decimal coordinate key, keeping the nearest
/// (the first seen on a tie), then sort by distance and keep `limit`.
pub fn dedupe(hits: Vec<NearbyHit>, limit: usize) -> Vec<NearbyHit> {
    let mut slots: HashMap<(i64, i64), usize> = HashMap::new();
    let mut kept: Vec<NearbyHit> = Vec::new();

    for hit in hits {
        match slots.entry(hit.coordinate_key()) {
            Entry::Occupied(slot) => {
                let current = &mut kept[*slot.get()];
                if hit.distance_km < current.distance_km {
                    *current = hit;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(hit);
            }
        }
    }

    kept.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    kept.truncate(limit);
    kept
}
