pub mod export;
pub mod geocoder;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub address: String,
}

/// A place found near a reference point. Lives only for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyHit {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Great-circle distance from the reference point, 2 decimals.
    pub distance_km: f64,
}

impl NearbyHit {
    /// Coordinates rounded to 5 decimals (about a metre), as integers.
    pub fn coordinate_key(&self) -> (i64, i64) {
        (
            (self.latitude * 1e5).round() as i64,
            (self.longitude * 1e5).round() as i64,
        )
    }
}

/// Service categories, in the order they are searched and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    PoliceStations,
    LawFirms,
    Ngos,
    Hospitals,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PoliceStations,
        Category::LawFirms,
        Category::Ngos,
        Category::Hospitals,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::PoliceStations => "Police Stations",
            Category::LawFirms => "Law Firms / Lawyers",
            Category::Ngos => "NGOs / Helplines",
            Category::Hospitals => "Hospitals",
        }
    }

    /// Search term sent to the geocoder.
    pub fn query(self) -> &'static str {
        match self {
            Category::PoliceStations => "police station",
            Category::LawFirms => "law firm",
            Category::Ngos => "NGO",
            Category::Hospitals => "hospital",
        }
    }

    /// File name stem for exports, e.g. `Law_Firms_Lawyers`.
    pub fn file_stem(self) -> String {
        self.title()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }
}
