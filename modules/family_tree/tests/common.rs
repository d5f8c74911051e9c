#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use family_tree::config::FamilyTreeConfig;
use family_tree::contract::model::Fields;
use family_tree::domain::store::{
    CollectionPath, Document, DocumentPath, DocumentStore, Query, StoreError, Write, WriteData,
};
use family_tree::infra::storage::InMemoryDocumentStore;
use family_tree::FamilyTreeModule;

pub fn fields(v: Value) -> Fields {
    v.as_object().cloned().expect("test data must be a JSON object")
}

pub fn user_path(id: &str) -> DocumentPath {
    CollectionPath::root("users").doc(id)
}

/// In-memory store that counts every round trip.
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryDocumentStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path).await
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.run_query(query).await
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(writes).await
    }
}

/// Store whose backend is never reachable.
pub struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn run_query(&self, _query: &Query) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn commit(&self, _writes: Vec<Write>) -> Result<(), StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

/// Module over a counting store, with user `u1` already present.
pub async fn module_with_user(cfg: &FamilyTreeConfig) -> (FamilyTreeModule, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    store
        .commit(vec![Write::Set {
            path: user_path("u1"),
            data: WriteData::default().with_field("displayName", "Ada"),
        }])
        .await
        .expect("seed user");
    let module = FamilyTreeModule::with_store(store.clone(), cfg);
    (module, store)
}
