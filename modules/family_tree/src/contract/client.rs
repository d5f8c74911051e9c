use async_trait::async_trait;

use crate::contract::{
    error::FamilyTreeError,
    model::{FamilyTree, Fields, Person},
};

/// Public API trait for the family_tree module that other modules can use
#[async_trait]
pub trait FamilyTreeApi: Send + Sync {
    /// Add a person to a tree; returns the new person id
    async fn add_person_to_tree(
        &self,
        person_data: Fields,
        family_tree_id: &str,
    ) -> Result<String, FamilyTreeError>;

    /// All persons of a tree, most recently created first
    async fn get_persons_from_tree(
        &self,
        family_tree_id: &str,
    ) -> Result<Vec<Person>, FamilyTreeError>;

    /// Get a single person by id
    async fn get_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<Person, FamilyTreeError>;

    /// Merge `update_data` into an existing person
    async fn update_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
        update_data: Fields,
    ) -> Result<(), FamilyTreeError>;

    /// Delete a person; deleting a missing person succeeds
    async fn delete_person(
        &self,
        family_tree_id: &str,
        person_id: &str,
    ) -> Result<(), FamilyTreeError>;

    /// Create a tree owned by `user_id` and link it to the user; returns the new tree id
    async fn create_family_tree(
        &self,
        tree_data: Fields,
        user_id: &str,
    ) -> Result<String, FamilyTreeError>;

    /// Get a tree by id
    async fn get_family_tree(&self, family_tree_id: &str) -> Result<FamilyTree, FamilyTreeError>;
}
