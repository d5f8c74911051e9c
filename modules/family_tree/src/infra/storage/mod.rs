pub mod firestore;
pub mod memory;

pub use firestore::FirestoreRestStore;
pub use memory::InMemoryDocumentStore;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::domain::store::{DocumentStore, StoreError};

/// Build the store selected in configuration.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    Ok(match config {
        StoreConfig::Memory => Arc::new(InMemoryDocumentStore::new()),
        StoreConfig::Firestore(cfg) => {
            Arc::new(FirestoreRestStore::new(reqwest::Client::new(), cfg)?)
        }
    })
}
