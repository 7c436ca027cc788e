use crate::domain::error::BookmapError;
use crate::domain::model::Coordinate;
use crate::domain::traits::Geocoder;
use crate::infrastructure::config::GeocoderConfig;
use crate::infrastructure::network::pacer::{RequestPacer, RetryPolicy};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Hard constraint of the public geocoding service: at most one request per
/// second, shared across everything a build does. A hair over a second keeps
/// us on the polite side of the budget. Not configuration.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

/// First rung of the backoff ladder for retryable failures.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

// Nominatim search response (jsonv2). Coordinates arrive as strings.
#[derive(Deserialize, Debug)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

pub struct NominatimClient {
    client: Client,
    endpoint: String,
    pacer: RequestPacer,
    retry: RetryPolicy,
}

impl NominatimClient {
    pub fn new(client: Client, config: &GeocoderConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            pacer: RequestPacer::new(MIN_REQUEST_INTERVAL),
            retry: RetryPolicy::new(config.retry_attempts, RETRY_BASE_DELAY),
        }
    }

    /// Replace the request gate. Tests pass `RequestPacer::unpaced()`.
    pub fn with_pacer(mut self, pacer: RequestPacer) -> Self {
        self.pacer = pacer;
        self
    }

    async fn attempt(&self, name: &str) -> Result<Coordinate, BookmapError> {
        self.pacer.pace().await;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", name), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| BookmapError::Network(format!("{}: {}", name, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(BookmapError::RateLimited(format!("{}: HTTP 429", name)));
        }
        if !status.is_success() {
            return Err(BookmapError::Network(format!("{}: HTTP {}", name, status)));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| BookmapError::Network(format!("{}: {}", name, e)))?;

        match places.into_iter().next() {
            Some(place) => parse_place(name, &place),
            None => Err(BookmapError::NotFound(name.to_string())),
        }
    }
}

fn parse_place(name: &str, place: &NominatimPlace) -> Result<Coordinate, BookmapError> {
    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| BookmapError::Network(format!("{}: bad latitude {:?}: {}", name, place.lat, e)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| BookmapError::Network(format!("{}: bad longitude {:?}: {}", name, place.lon, e)))?;

    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(BookmapError::Network(format!(
            "{}: coordinate out of range ({}, {})",
            name, latitude, longitude
        )));
    }

    debug!(
        "Resolved {:?} -> ({}, {}) [{}]",
        name, latitude, longitude, place.display_name
    );
    Ok(coordinate)
}

#[async_trait]
impl Geocoder for NominatimClient {
    /// `NotFound` is terminal; rate-limit and transport failures retry with
    /// exponential backoff until the attempt budget runs out.
    async fn resolve(&self, name: &str) -> Result<Coordinate, BookmapError> {
        let mut attempt = 1;
        loop {
            match self.attempt(name).await {
                Ok(coordinate) => return Ok(coordinate),
                Err(e) if e.is_retryable() => match self.retry.backoff_after(attempt) {
                    Some(delay) => {
                        warn!(
                            "Lookup for {:?} failed ({}); retrying in {:?}",
                            name, e, delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!("Lookup for {:?} gave up after {} attempts: {}", name, attempt, e);
                        return Err(e);
                    }
                },
                Err(e) => return Err(e),
            }
        }
    }
}
