pub mod book;
pub mod search;
pub mod store;
