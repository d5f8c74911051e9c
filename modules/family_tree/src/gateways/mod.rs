pub mod compat;
pub mod local;

pub use compat::FamilyTreeCompatClient;
pub use local::FamilyTreeLocalClient;
