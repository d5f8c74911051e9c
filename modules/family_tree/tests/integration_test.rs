//! Configuration parsing and module wiring, including a Firestore-backed module.

use std::fs;

use httpmock::prelude::*;
use runtime::AppConfig;
use serde_json::json;
use tempfile::tempdir;

use family_tree::config::{FamilyTreeConfig, FirestoreConfig, StoreConfig};
use family_tree::contract::error::FamilyTreeError;
use family_tree::domain::error::DomainError;
use family_tree::domain::store::StoreError;
use family_tree::FamilyTreeModule;

fn fields(v: serde_json::Value) -> family_tree::contract::model::Fields {
    v.as_object().cloned().unwrap()
}

#[test]
fn empty_module_config_uses_defaults() {
    let cfg: FamilyTreeConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(cfg.store, StoreConfig::Memory);
    assert_eq!(cfg.max_fields_per_document, 200);
    assert!(!cfg.verify_tree_exists);
}

#[test]
fn firestore_store_config_fills_defaults() {
    let cfg: FamilyTreeConfig = serde_json::from_value(json!({
        "store": { "kind": "firestore", "project_id": "demo" },
        "verify_tree_exists": true
    }))
    .unwrap();

    assert_eq!(
        cfg.store,
        StoreConfig::Firestore(FirestoreConfig {
            base_url: "https://firestore.googleapis.com/v1".into(),
            project_id: "demo".into(),
            database_id: "(default)".into(),
            access_token: None,
        })
    );
    assert!(cfg.verify_tree_exists);
}

#[test]
fn unknown_keys_and_store_kinds_are_rejected() {
    assert!(serde_json::from_value::<FamilyTreeConfig>(json!({ "max_feilds": 3 })).is_err());
    assert!(
        serde_json::from_value::<FamilyTreeConfig>(json!({ "store": { "kind": "sqlite" } }))
            .is_err()
    );
    assert!(
        serde_json::from_value::<FamilyTreeConfig>(json!({ "store": { "kind": "firestore" } }))
            .is_err()
    );
}

#[test]
fn domain_errors_map_to_contract_errors() {
    assert_eq!(
        FamilyTreeError::from(DomainError::invalid_argument("personId", "must not be empty")),
        FamilyTreeError::invalid_argument("personId: must not be empty")
    );
    assert_eq!(
        FamilyTreeError::from(DomainError::person_not_found("t1", "p1")),
        FamilyTreeError::not_found("person p1 in family tree t1")
    );
    assert_eq!(
        FamilyTreeError::from(DomainError::from(StoreError::unavailable("timeout"))),
        FamilyTreeError::store_unavailable("timeout")
    );
    assert_eq!(
        FamilyTreeError::from(DomainError::from(StoreError::PermissionDenied {
            message: "rules".into()
        })),
        FamilyTreeError::permission_denied("rules")
    );
    assert_eq!(
        FamilyTreeError::from(DomainError::malformed_document("familyTrees/t1", "bad")),
        FamilyTreeError::Internal
    );
}

#[tokio::test]
async fn module_wires_from_yaml_file() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("family_tree.yaml");
    fs::write(
        &cfg_path,
        r#"
modules:
  family_tree:
    max_fields_per_document: 1
"#,
    )
    .unwrap();

    let app = AppConfig::load_layered(&cfg_path).unwrap();
    let module = FamilyTreeModule::from_app_config(&app).unwrap();
    let api = module.client();

    let err = api
        .add_person_to_tree(fields(json!({ "a": 1, "b": 2 })), "t1")
        .await
        .unwrap_err();
    assert!(matches!(err, FamilyTreeError::InvalidArgument { .. }));
    assert!(api
        .add_person_to_tree(fields(json!({ "a": 1 })), "t1")
        .await
        .is_ok());

    let persons = module.service().get_persons_from_tree("t1").await.unwrap();
    assert_eq!(persons.len(), 1);
}

#[test]
fn invalid_module_section_fails_wiring() {
    let mut app = AppConfig::default();
    app.modules.insert(
        "family_tree".into(),
        json!({ "store": { "kind": "firestore", "project_id": "demo", "base_url": "nope" } }),
    );
    assert!(FamilyTreeModule::from_app_config(&app).is_err());

    app.modules
        .insert("family_tree".into(), json!({ "verify_tree_exists": "yes" }));
    assert!(FamilyTreeModule::from_app_config(&app).is_err());
}

#[tokio::test]
async fn firestore_module_reports_missing_owner() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:commit");
            then.status(404).json_body(json!({
                "error": {
                    "code": 404,
                    "message": "No document to update: users/u9",
                    "status": "NOT_FOUND"
                }
            }));
        })
        .await;

    let cfg = FamilyTreeConfig {
        store: StoreConfig::Firestore(FirestoreConfig {
            base_url: format!("{}/v1", server.base_url()),
            project_id: "demo".into(),
            database_id: "(default)".into(),
            access_token: None,
        }),
        ..FamilyTreeConfig::default()
    };
    let module = FamilyTreeModule::from_config(&cfg).unwrap();

    let err = module
        .client()
        .create_family_tree(fields(json!({ "name": "Smiths" })), "u9")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, FamilyTreeError::not_found("user u9"));
}

#[tokio::test]
async fn firestore_module_lists_persons_newest_first() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(
                "/v1/projects/demo/databases/(default)/documents/familyTrees/t1:runQuery",
            );
            then.status(200).json_body(json!([
                {
                    "document": {
                        "name": "projects/demo/databases/(default)/documents/familyTrees/t1/persons/p2",
                        "fields": {
                            "firstName": { "stringValue": "Grace" },
                            "createdAt": { "timestampValue": "2024-05-02T08:00:00.000001Z" },
                            "updatedAt": { "timestampValue": "2024-05-02T08:00:00.000001Z" }
                        }
                    }
                },
                {
                    "document": {
                        "name": "projects/demo/databases/(default)/documents/familyTrees/t1/persons/p1",
                        "fields": {
                            "firstName": { "stringValue": "Ada" },
                            "createdAt": { "timestampValue": "2024-05-01T08:00:00Z" },
                            "updatedAt": { "timestampValue": "2024-05-03T08:00:00Z" }
                        }
                    }
                }
            ]));
        })
        .await;

    let cfg = FamilyTreeConfig {
        store: StoreConfig::Firestore(FirestoreConfig {
            base_url: format!("{}/v1", server.base_url()),
            project_id: "demo".into(),
            database_id: "(default)".into(),
            access_token: None,
        }),
        ..FamilyTreeConfig::default()
    };
    let module = FamilyTreeModule::from_config(&cfg).unwrap();

    let persons = module.client().get_persons_from_tree("t1").await.unwrap();
    let ids: Vec<&str> = persons.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);
    assert_eq!(persons[1].fields, fields(json!({ "firstName": "Ada" })));
    assert!(persons[1].updated_at > persons[1].created_at);
}
