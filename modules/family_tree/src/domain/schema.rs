//! Collection layout and document ↔ model mapping.

use serde_json::Value;

use crate::contract::model::{FamilyTree, Person};
use crate::domain::error::DomainError;
use crate::domain::store::{CollectionPath, Document, DocumentPath};

pub const FAMILY_TREES: &str = "familyTrees";
pub const PERSONS: &str = "persons";
pub const USERS: &str = "users";

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const OWNER_ID: &str = "ownerId";
pub const MEMBER_IDS: &str = "memberIds";
pub const FAMILY_TREE_ID: &str = "familyTreeId";

/// Keys callers may not set on a person.
pub const PERSON_MANAGED_FIELDS: &[&str] = &["id", CREATED_AT, UPDATED_AT];
/// Keys callers may not set on a tree.
pub const TREE_MANAGED_FIELDS: &[&str] = &["id", CREATED_AT, UPDATED_AT, OWNER_ID, MEMBER_IDS];

pub fn family_trees() -> CollectionPath {
    CollectionPath::root(FAMILY_TREES)
}

pub fn family_tree_doc(family_tree_id: &str) -> DocumentPath {
    family_trees().doc(family_tree_id)
}

pub fn persons(family_tree_id: &str) -> CollectionPath {
    family_tree_doc(family_tree_id).collection(PERSONS)
}

pub fn person_doc(family_tree_id: &str, person_id: &str) -> DocumentPath {
    persons(family_tree_id).doc(person_id)
}

pub fn user_doc(user_id: &str) -> DocumentPath {
    CollectionPath::root(USERS).doc(user_id)
}

/// Convert a stored person document to the contract model
pub fn document_to_person(family_tree_id: &str, doc: Document) -> Person {
    let created_at = doc.timestamp(CREATED_AT);
    let updated_at = doc.timestamp(UPDATED_AT);
    let id = doc.id().to_string();
    let mut fields = doc.fields;
    fields.remove(CREATED_AT);
    fields.remove(UPDATED_AT);

    Person {
        id,
        family_tree_id: family_tree_id.to_string(),
        fields,
        created_at,
        updated_at,
    }
}

/// Convert a stored tree document to the contract model
pub fn document_to_family_tree(doc: Document) -> Result<FamilyTree, DomainError> {
    let created_at = doc.timestamp(CREATED_AT);
    let updated_at = doc.timestamp(UPDATED_AT);
    let path = doc.path.to_string();
    let id = doc.id().to_string();
    let mut fields = doc.fields;

    let owner_id = match fields.remove(OWNER_ID) {
        Some(Value::String(owner)) => owner,
        _ => return Err(DomainError::malformed_document(path, "ownerId is not a string")),
    };
    let member_ids = match fields.remove(MEMBER_IDS) {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(DomainError::malformed_document(
                    path.clone(),
                    "memberIds contains a non-string entry",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
        Some(_) => {
            return Err(DomainError::malformed_document(path, "memberIds is not an array"));
        }
    };
    fields.remove(CREATED_AT);
    fields.remove(UPDATED_AT);

    Ok(FamilyTree {
        id,
        owner_id,
        member_ids,
        fields,
        created_at,
        updated_at,
    })
}
