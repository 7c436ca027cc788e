pub mod page;
pub mod summary;
