pub mod cache;

pub use cache::GeocodeStore;
