pub mod client;
pub mod http;
pub mod metadata;
pub mod pacer;

// Re-export for convenience
pub use client::NominatimClient;
pub use pacer::RequestPacer;
