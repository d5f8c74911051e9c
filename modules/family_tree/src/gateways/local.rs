use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::FamilyTreeApi,
    error::FamilyTreeError,
    model::{FamilyTree, Fields, Person},
};
use crate::domain::service::Service;

/// Local implementation of the FamilyTreeApi trait that delegates to the domain service
pub struct FamilyTreeLocalClient {
    service: Arc<Service>,
}

impl FamilyTreeLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl FamilyTreeApi for FamilyTreeLocalClient {
    async fn add_person_to_tree(
        &self,
        person_data: Fields,
        family_tree_id: &str,
    ) -> Result<String, FamilyTreeError> {
        self.service
            .add_person_to_tree(person_data, family_tree_id)
            .await
            .map_err(Into::into)
    }

    async fn get_persons_from_tree(
        &self,
        family_tree_id: &str,
    ) -> Result<Vec<Person>, FamilyTreeError> {
        self.service
            .get_persons_from_tree(family_tree_id)
            .await
            .map_err(Into::into)
    }

    async fn get_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<Person, FamilyTreeError> {
        self.service
            .get_person(family_tree_id, person_id)
            .await
            .map_err(Into::into)
    }

    async fn update_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
        update_data: Fields,
    ) -> Result<(), FamilyTreeError> {
        self.service
            .update_person(family_tree_id, person_id, update_data)
            .await
            .map_err(Into::into)
    }

    async fn delete_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<(), FamilyTreeError> {
        self.service
            .delete_person(family_tree_id, person_id)
            .await
            .map_err(Into::into)
    }

    async fn create_family_tree(
        &self,
        tree_data: Fields,
        user_id: &str,
    ) -> Result<String, FamilyTreeError> {
        self.service
            .create_family_tree(tree_data, user_id)
            .await
            .map_err(Into::into)
    }

    async fn get_family_tree(&self, family_tree_id: &str) -> Result<FamilyTree, FamilyTreeError> {
        self.service
            .get_family_tree(family_tree_id)
            .await
            .map_err(Into::into)
    }
}
