use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::geocoder::{PlaceBackend, RawPlace};

pub fn place(lat: &str, lon: &str, name: &str) -> RawPlace {
    RawPlace {
        lat: Value::String(lat.to_string()),
        lon: Value::String(lon.to_string()),
        display_name: Some(name.to_string()),
    }
}

/// Replays canned responses in order and records every query it receives.
/// Once the script runs out it answers with no results.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<Vec<RawPlace>, &'static str>>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<Vec<RawPlace>, &'static str>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlaceBackend for ScriptedBackend {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawPlace>> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(places)) => Ok(places),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Ok(Vec::new()),
        }
    }
}
