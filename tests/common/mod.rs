// Shared test doubles
use async_trait::async_trait;
use bookmap::domain::error::BookmapError;
use bookmap::domain::model::Coordinate;
use bookmap::domain::traits::Geocoder;
use std::collections::HashMap;
use std::sync::Mutex;

/// Geocoder driven by a fixed script: known names resolve, everything else
/// is NotFound. Calls are recorded so tests can assert how often the
/// network seam was crossed.
pub struct ScriptedGeocoder {
    outcomes: HashMap<String, Coordinate>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn new(outcomes: &[(&str, Coordinate)]) -> Self {
        Self {
            outcomes: outcomes
                .iter()
                .map(|(name, coordinate)| (name.to_string(), *coordinate))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn resolve(&self, name: &str) -> Result<Coordinate, BookmapError> {
        self.calls.lock().unwrap().push(name.to_string());
        self.outcomes
            .get(name)
            .copied()
            .ok_or_else(|| BookmapError::NotFound(name.to_string()))
    }
}
