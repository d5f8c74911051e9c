pub mod client;
pub mod error;
pub mod model;

pub use client::FamilyTreeApi;
pub use error::FamilyTreeError;
pub use model::{FamilyTree, Fields, Person};
