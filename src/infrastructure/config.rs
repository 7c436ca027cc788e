use crate::domain::error::BookmapError;
use crate::domain::model::Coordinate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "bookmap.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Contact address appended to the User-Agent, per the service's usage
    /// policy. Empty is tolerated but discouraged.
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LayoutConfig {
    /// Two points closer than this share a marker group.
    #[serde(default = "default_proximity_threshold_m")]
    pub proximity_threshold_m: f64,
    /// Ring radius for spreading a group's markers around its centroid.
    #[serde(default = "default_offset_radius_m")]
    pub offset_radius_m: f64,
}

/// Initial view of the rendered page; also the box that decides which
/// groups get off-screen indicators.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Viewport {
    #[serde(default = "default_min_lat")]
    pub min_lat: f64,
    #[serde(default = "default_min_lon")]
    pub min_lon: f64,
    #[serde(default = "default_max_lat")]
    pub max_lat: f64,
    #[serde(default = "default_max_lon")]
    pub max_lon: f64,
}

impl Viewport {
    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.latitude)
            && (self.min_lon..=self.max_lon).contains(&c.longitude)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            email: String::new(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: default_proximity_threshold_m(),
            offset_radius_m: default_offset_radius_m(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            min_lat: default_min_lat(),
            min_lon: default_min_lon(),
            max_lat: default_max_lat(),
            max_lon: default_max_lon(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            cache_file: default_cache_file(),
            title: default_title(),
            geocoder: GeocoderConfig::default(),
            layout: LayoutConfig::default(),
            viewport: Viewport::default(),
            logging: Logging::default(),
        }
    }
}

// Defaults
fn default_input() -> PathBuf {
    PathBuf::from("books.yaml")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_cache_file() -> PathBuf {
    PathBuf::from("cache/geocoding.json")
}
fn default_title() -> String {
    "Book Locations".to_string()
}
fn default_endpoint() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_proximity_threshold_m() -> f64 {
    500.0
}
fn default_offset_radius_m() -> f64 {
    60.0
}
fn default_min_lat() -> f64 {
    -60.0
}
fn default_min_lon() -> f64 {
    -170.0
}
fn default_max_lat() -> f64 {
    75.0
}
fn default_max_lon() -> f64 {
    170.0
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

/// Config lives next to the input document, not in a per-user directory:
/// a map build is a per-project artifact.
pub fn get_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE)
}

pub fn load_config() -> Result<Config, BookmapError> {
    load_config_from(&get_config_path())
}

/// Missing file means defaults; an unparseable file warns and falls back to
/// defaults rather than blocking the build.
pub fn load_config_from(path: &Path) -> Result<Config, BookmapError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        match toml::from_str::<Config>(&content) {
            Ok(config) => return Ok(config),
            Err(e) => {
                eprintln!(
                    "Warning: Failed to parse config file: {}. Using defaults.",
                    e
                );
            }
        }
    }

    Ok(Config::default())
}

pub fn generate_config_sample() -> Result<(), BookmapError> {
    let path = get_config_path();
    if path.exists() {
        eprintln!("Config file already exists at: {}", path.display());
        return Ok(());
    }

    let sample = Config::default();
    let toml_content = toml::to_string_pretty(&sample)
        .map_err(|e| BookmapError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(&path, toml_content)
        .map_err(|e| BookmapError::Config(format!("Failed to write config file: {}", e)))?;
    println!("Generated config file at: {}", path.display());

    Ok(())
}
