use std::borrow::Cow;
use std::fmt::Write;

use super::NearbyHit;

const CSV_HEADER: &str = "name,address,lat,lon,distance_km";

/// Tabular export of a hit list, one row per hit.
pub fn to_csv(hits: &[NearbyHit]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for hit in hits {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            csv_field(&hit.name),
            csv_field(&hit.address),
            hit.latitude,
            hit.longitude,
            hit.distance_km
        );
    }
    out
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Coordinates only, for drawing on a map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
}

impl MapPoint {
    pub fn osm_url(&self) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=16/{lat}/{lon}",
            lat = self.lat,
            lon = self.lon
        )
    }
}

pub fn map_points(hits: &[NearbyHit]) -> Vec<MapPoint> {
    hits.iter()
        .map(|h| MapPoint {
            lat: h.latitude,
            lon: h.longitude,
        })
        .collect()
}
