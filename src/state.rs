use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::advice::types::{Analysis, Language};
use crate::advice::AdviceEngine;
use crate::nearby::geocoder::{Geocoder, GeocodingService};
use crate::nearby::search::PlaceSearcher;

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const MAX_RESULTS_CAP: usize = 10;

/// Per-user preferences, set with `/nyay settings`. Held in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub language: Language,
    pub anonymous: bool,
    pub location: Option<String>,
    pub max_results: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            anonymous: false,
            location: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl UserSettings {
    pub fn describe(&self) -> String {
        format!(
            "**Your settings:**\n\
             `language`: {}\n\
             `anonymous`: {}\n\
             `location`: {}\n\
             `results`: {} per category",
            self.language.name(),
            self.anonymous,
            self.location.as_deref().unwrap_or("(not set)"),
            self.max_results
        )
    }
}

pub struct AppState {
    pub advice: Arc<AdviceEngine>,
    pub geocoding: Arc<GeocodingService>,
    pub geocoder: Arc<Geocoder>,
    pub places: Arc<PlaceSearcher>,
    pub admin_ids: HashSet<u64>,
    /// Last analysis per user, so drafts can be fetched after the fact.
    pub sessions: Arc<RwLock<HashMap<u64, Analysis>>>,
    pub settings: Arc<RwLock<HashMap<u64, UserSettings>>>,
}

impl AppState {
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    pub async fn settings_for(&self, user_id: u64) -> UserSettings {
        self.settings
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = UserSettings::default();
        assert_eq!(settings.language, Language::English);
        assert_eq!(settings.max_results, 5);
        assert!(settings.describe().contains("`location`: (not set)"));
    }
}
