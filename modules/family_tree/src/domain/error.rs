use thiserror::Error;

use crate::domain::store::StoreError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Family tree not found: {id}")]
    FamilyTreeNotFound { id: String },

    #[error("Person not found: {id} (family tree {family_tree_id})")]
    PersonNotFound { family_tree_id: String, id: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Malformed document '{path}': {message}")]
    MalformedDocument { path: String, message: String },

    #[error("Store error: {message}")]
    Store { message: String },
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn family_tree_not_found(id: impl Into<String>) -> Self {
        Self::FamilyTreeNotFound { id: id.into() }
    }

    pub fn person_not_found(family_tree_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self::PersonNotFound {
            family_tree_id: family_tree_id.into(),
            id: id.into(),
        }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn malformed_document(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PermissionDenied { message } => Self::PermissionDenied { message },
            StoreError::Unavailable { message } => Self::StoreUnavailable { message },
            other => Self::store(other.to_string()),
        }
    }
}
