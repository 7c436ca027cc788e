use crate::domain::error::BookmapError;
use crate::infrastructure::config::Config;
use crate::infrastructure::network::http::create_client;
use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http_client: Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BookmapError> {
        let http_client = create_client(&config.geocoder.email)?;
        Ok(Self {
            config,
            http_client,
        })
    }
}
