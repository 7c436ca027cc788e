use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookmapError {
    #[error("input error: {0}")]
    Input(String),

    #[error("place not found: {0}")]
    NotFound(String),

    #[error("geocoding service rate limited: {0}")]
    RateLimited(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("cache store error: {0}")]
    CacheIo(String),

    #[error("layout invariant violated: {0}")]
    Layout(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BookmapError {
    /// Worth another attempt after backoff. NotFound is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookmapError::RateLimited(_) | BookmapError::Network(_)
        )
    }

    /// Failures recovered per query: the point is recorded as failed and the
    /// build goes on.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            BookmapError::NotFound(_) | BookmapError::RateLimited(_) | BookmapError::Network(_)
        )
    }
}
