use crate::domain::error::BookmapError;
use crate::domain::model::Coordinate;
use async_trait::async_trait;

/// Trait for name-to-coordinate lookup services
///
/// The resolver only sees this seam, so the network client can be swapped
/// for a scripted double in tests. `name` is already normalized to the
/// cache-key form; implementations must not re-interpret it.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Coordinate, BookmapError>;
}
