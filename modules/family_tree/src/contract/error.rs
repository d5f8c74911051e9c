use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FamilyTreeError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Internal error")]
    Internal,
}

impl FamilyTreeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for FamilyTreeError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            InvalidArgument { field, message } => {
                Self::invalid_argument(format!("{}: {}", field, message))
            }
            FamilyTreeNotFound { id } => Self::not_found(format!("family tree {}", id)),
            PersonNotFound { family_tree_id, id } => {
                Self::not_found(format!("person {} in family tree {}", id, family_tree_id))
            }
            UserNotFound { id } => Self::not_found(format!("user {}", id)),
            PermissionDenied { message } => Self::permission_denied(message),
            StoreUnavailable { message } => Self::store_unavailable(message),
            e @ (MalformedDocument { .. } | Store { .. }) => {
                // Log the store details; callers only see `Internal`
                tracing::error!(error = %e, "Store error occurred");
                Self::internal()
            }
        }
    }
}
