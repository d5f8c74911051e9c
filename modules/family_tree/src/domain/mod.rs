pub mod error;
pub mod schema;
pub mod service;
pub mod store;
