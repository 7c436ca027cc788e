pub mod books;
pub mod cli;
