use serde::{Deserialize, Serialize};

/// Configuration for the family_tree module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyTreeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_max_fields_per_document")]
    pub max_fields_per_document: usize,
    #[serde(default)]
    pub verify_tree_exists: bool,
}

/// Which document store backs the module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    #[default]
    Memory,
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Bearer token obtained elsewhere; sent as-is when present.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for FamilyTreeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            max_fields_per_document: default_max_fields_per_document(),
            verify_tree_exists: false,
        }
    }
}

fn default_max_fields_per_document() -> usize {
    200
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_database_id() -> String {
    "(default)".to_string()
}
