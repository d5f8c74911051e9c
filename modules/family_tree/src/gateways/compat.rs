//! Sentinel-returning facade for callers written against the coarse
//! contract: ids and lists come back as `Option`, mutations as `bool`, and
//! every failure is logged instead of returned.

use std::sync::Arc;

use tracing::error;

use crate::contract::{
    client::FamilyTreeApi,
    model::{Fields, Person},
};

#[derive(Clone)]
pub struct FamilyTreeCompatClient {
    api: Arc<dyn FamilyTreeApi>,
}

impl FamilyTreeCompatClient {
    pub fn new(api: Arc<dyn FamilyTreeApi>) -> Self {
        Self { api }
    }

    /// `None` data stands for an absent argument and fails like empty data.
    pub async fn add_person_to_tree(
        &self,
        person_data: Option<Fields>,
        family_tree_id: &str,
    ) -> Option<String> {
        match self
            .api
            .add_person_to_tree(person_data.unwrap_or_default(), family_tree_id)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(family_tree_id, error = %e, "Error adding person to tree");
                None
            }
        }
    }

    pub async fn get_persons_from_tree(&self, family_tree_id: &str) -> Option<Vec<Person>> {
        match self.api.get_persons_from_tree(family_tree_id).await {
            Ok(persons) => Some(persons),
            Err(e) => {
                error!(family_tree_id, error = %e, "Error getting persons from tree");
                None
            }
        }
    }

    pub async fn update_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
        update_data: Option<Fields>,
    ) -> bool {
        match self
            .api
            .update_person(family_tree_id, person_id, update_data.unwrap_or_default())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(family_tree_id, person_id, error = %e, "Error updating person");
                false
            }
        }
    }

    pub async fn delete_person(&self, family_tree_id: &str, person_id: &str) -> bool {
        match self.api.delete_person(family_tree_id, person_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(family_tree_id, person_id, error = %e, "Error deleting person");
                false
            }
        }
    }

    pub async fn create_family_tree(
        &self,
        tree_data: Option<Fields>,
        user_id: &str,
    ) -> Option<String> {
        match self
            .api
            .create_family_tree(tree_data.unwrap_or_default(), user_id)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                error!(user_id, error = %e, "Error creating family tree");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service::{Service, ServiceConfig};
    use crate::gateways::FamilyTreeLocalClient;
    use crate::domain::store::{
        Document, DocumentPath, DocumentStore, Query, StoreError, Write,
    };
    use crate::infra::storage::InMemoryDocumentStore;
    use async_trait::async_trait;
    use serde_json::json;
    use tracing_test::traced_test;

    /// Accepts reads, rejects every commit as a bad request.
    struct RejectingStore;

    #[async_trait]
    impl DocumentStore for RejectingStore {
        async fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, StoreError> {
            Ok(None)
        }

        async fn run_query(&self, _query: &Query) -> Result<Vec<Document>, StoreError> {
            Ok(Vec::new())
        }

        async fn commit(&self, _writes: Vec<Write>) -> Result<(), StoreError> {
            Err(StoreError::invalid_request("field name 'a.b' is not allowed"))
        }
    }

    fn compat() -> FamilyTreeCompatClient {
        let store = Arc::new(InMemoryDocumentStore::new());
        let service = Arc::new(Service::new(store, ServiceConfig::default()));
        FamilyTreeCompatClient::new(Arc::new(FamilyTreeLocalClient::new(service)))
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_logged_not_returned() {
        let client = compat();

        assert_eq!(client.add_person_to_tree(None, "t1").await, None);
        assert!(logs_contain("Error adding person to tree"));

        assert!(!client.update_person("t1", "ghost", Some(Fields::new())).await);
        assert!(logs_contain("Error updating person"));

        let mut tree = Fields::new();
        tree.insert("name".into(), json!("Smiths"));
        assert_eq!(client.create_family_tree(Some(tree), "nobody").await, None);
        assert!(logs_contain("Error creating family tree"));
        assert!(logs_contain("user nobody"));
    }

    #[tokio::test]
    #[traced_test]
    async fn successful_calls_log_no_errors() {
        let client = compat();
        let mut person = Fields::new();
        person.insert("firstName".into(), json!("Ada"));

        let id = client.add_person_to_tree(Some(person), "t1").await;
        assert!(id.is_some());
        assert!(client.delete_person("t1", id.as_deref().unwrap_or_default()).await);
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    #[traced_test]
    async fn rejected_writes_log_the_store_message() {
        let service = Arc::new(Service::new(
            Arc::new(RejectingStore),
            ServiceConfig::default(),
        ));
        let client = FamilyTreeCompatClient::new(Arc::new(FamilyTreeLocalClient::new(service)));

        let mut person = Fields::new();
        person.insert("a.b".into(), json!(1));
        assert_eq!(client.add_person_to_tree(Some(person), "t1").await, None);

        assert!(logs_contain("is not allowed"));
        assert!(logs_contain("Error adding person to tree"));
    }
}
