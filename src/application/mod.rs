pub mod build;
pub mod enrich;
pub mod layout;
pub mod resolve;
