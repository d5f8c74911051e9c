use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument};

use crate::contract::model::{FamilyTree, Fields, Person};
use crate::domain::error::DomainError;
use crate::domain::schema::{self, CREATED_AT, FAMILY_TREE_ID, MEMBER_IDS, OWNER_ID, UPDATED_AT};
use crate::domain::store::{
    segment_error, Direction, DocumentStore, Query, StoreError, Write, WriteData,
};

/// Domain service for trees and their persons.
/// Depends only on the document store port, not on infra types.
#[derive(Clone)]
pub struct Service {
    store: Arc<dyn DocumentStore>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_fields_per_document: usize,
    /// Check that the tree exists before adding a person to it.
    pub verify_tree_exists: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_fields_per_document: 200,
            verify_tree_exists: false,
        }
    }
}

impl Service {
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    #[instrument(
        name = "family_tree.service.add_person_to_tree",
        skip(self, person_data),
        fields(family_tree_id = %family_tree_id)
    )]
    pub async fn add_person_to_tree(
        &self,
        person_data: Fields,
        family_tree_id: &str,
    ) -> Result<String, DomainError> {
        info!("Adding person to tree");

        self.validate_data("personData", &person_data, schema::PERSON_MANAGED_FIELDS)?;
        validate_id("familyTreeId", family_tree_id)?;

        if self.config.verify_tree_exists
            && self
                .store
                .get(&schema::family_tree_doc(family_tree_id))
                .await?
                .is_none()
        {
            return Err(DomainError::family_tree_not_found(family_tree_id));
        }

        let data = WriteData::new(person_data)
            .with_server_timestamp(CREATED_AT)
            .with_server_timestamp(UPDATED_AT);
        let path = self
            .store
            .add(&schema::persons(family_tree_id), data)
            .await?;

        info!("Successfully added person with id={}", path.id());
        Ok(path.id().to_string())
    }

    #[instrument(
        name = "family_tree.service.get_persons_from_tree",
        skip(self),
        fields(family_tree_id = %family_tree_id)
    )]
    pub async fn get_persons_from_tree(
        &self,
        family_tree_id: &str,
    ) -> Result<Vec<Person>, DomainError> {
        debug!("Listing persons of tree");

        validate_id("familyTreeId", family_tree_id)?;

        let query =
            Query::new(schema::persons(family_tree_id)).order_by(CREATED_AT, Direction::Descending);
        let persons: Vec<Person> = self
            .store
            .run_query(&query)
            .await?
            .into_iter()
            .map(|doc| schema::document_to_person(family_tree_id, doc))
            .collect();

        debug!("Successfully listed {} persons", persons.len());
        Ok(persons)
    }

    #[instrument(
        name = "family_tree.service.get_person",
        skip(self),
        fields(family_tree_id = %family_tree_id, person_id = %person_id)
    )]
    pub async fn get_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<Person, DomainError> {
        debug!("Getting person by id");

        validate_id("familyTreeId", family_tree_id)?;
        validate_id("personId", person_id)?;

        let doc = self
            .store
            .get(&schema::person_doc(family_tree_id, person_id))
            .await?
            .ok_or_else(|| DomainError::person_not_found(family_tree_id, person_id))?;
        Ok(schema::document_to_person(family_tree_id, doc))
    }

    #[instrument(
        name = "family_tree.service.update_person",
        skip(self, update_data),
        fields(family_tree_id = %family_tree_id, person_id = %person_id)
    )]
    pub async fn update_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
        update_data: Fields,
    ) -> Result<(), DomainError> {
        info!("Updating person");

        validate_id("familyTreeId", family_tree_id)?;
        validate_id("personId", person_id)?;
        self.validate_data("updateData", &update_data, schema::PERSON_MANAGED_FIELDS)?;

        let data = WriteData::new(update_data).with_server_timestamp(UPDATED_AT);
        self.store
            .update(&schema::person_doc(family_tree_id, person_id), data)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => {
                    DomainError::person_not_found(family_tree_id, person_id)
                }
                other => other.into(),
            })?;

        info!("Successfully updated person");
        Ok(())
    }

    #[instrument(
        name = "family_tree.service.delete_person",
        skip(self),
        fields(family_tree_id = %family_tree_id, person_id = %person_id)
    )]
    pub async fn delete_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<(), DomainError> {
        info!("Deleting person");

        validate_id("familyTreeId", family_tree_id)?;
        validate_id("personId", person_id)?;

        self.store
            .delete(&schema::person_doc(family_tree_id, person_id))
            .await?;

        info!("Successfully deleted person");
        Ok(())
    }

    /// Tree document and the owner's `familyTreeId` go out in one commit, so
    /// a missing user leaves no orphaned tree behind.
    #[instrument(
        name = "family_tree.service.create_family_tree",
        skip(self, tree_data),
        fields(user_id = %user_id)
    )]
    pub async fn create_family_tree(
        &self,
        tree_data: Fields,
        user_id: &str,
    ) -> Result<String, DomainError> {
        info!("Creating family tree");

        self.validate_data("treeData", &tree_data, schema::TREE_MANAGED_FIELDS)?;
        validate_id("userId", user_id)?;

        let tree_path = schema::family_trees().doc(self.store.new_document_id());
        let tree_id = tree_path.id().to_string();

        let tree = WriteData::new(tree_data)
            .with_field(OWNER_ID, user_id)
            .with_field(MEMBER_IDS, json!([user_id]))
            .with_server_timestamp(CREATED_AT)
            .with_server_timestamp(UPDATED_AT);
        let user = WriteData::default()
            .with_field(FAMILY_TREE_ID, tree_id.as_str())
            .with_server_timestamp(UPDATED_AT);

        self.store
            .commit(vec![
                Write::Create {
                    path: tree_path,
                    data: tree,
                },
                Write::Update {
                    path: schema::user_doc(user_id),
                    data: user,
                },
            ])
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => DomainError::user_not_found(user_id),
                other => other.into(),
            })?;

        info!("Successfully created family tree with id={}", tree_id);
        Ok(tree_id)
    }

    #[instrument(
        name = "family_tree.service.get_family_tree",
        skip(self),
        fields(family_tree_id = %family_tree_id)
    )]
    pub async fn get_family_tree(&self, family_tree_id: &str) -> Result<FamilyTree, DomainError> {
        debug!("Getting family tree by id");

        validate_id("familyTreeId", family_tree_id)?;

        let doc = self
            .store
            .get(&schema::family_tree_doc(family_tree_id))
            .await?
            .ok_or_else(|| DomainError::family_tree_not_found(family_tree_id))?;
        schema::document_to_family_tree(doc)
    }

    // --- validation helpers ---

    fn validate_data(
        &self,
        field: &str,
        data: &Fields,
        managed: &[&str],
    ) -> Result<(), DomainError> {
        if data.is_empty() {
            return Err(DomainError::invalid_argument(field, "must not be empty"));
        }
        if data.len() > self.config.max_fields_per_document {
            return Err(DomainError::invalid_argument(
                field,
                format!(
                    "too many fields: {} (max: {})",
                    data.len(),
                    self.config.max_fields_per_document
                ),
            ));
        }
        if let Some(key) = data.keys().find(|k| k.trim().is_empty()) {
            return Err(DomainError::invalid_argument(
                field,
                format!("field name '{}' is blank", key),
            ));
        }
        if let Some(key) = managed.iter().find(|k| data.contains_key(**k)) {
            return Err(DomainError::invalid_argument(
                field,
                format!("'{}' is managed by the store and cannot be set", key),
            ));
        }
        Ok(())
    }
}

/// Ids become path segments, so they must address exactly one document.
fn validate_id(field: &str, id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::invalid_argument(field, "must not be empty"));
    }
    match segment_error(id) {
        Some(why) => Err(DomainError::invalid_argument(field, why)),
        None => Ok(()),
    }
}
