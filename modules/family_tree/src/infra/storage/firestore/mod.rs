//! Firestore v1 REST adapter implementing the DocumentStore port.
//!
//! Writes always go through `documents:commit`, which applies a batch
//! atomically and resolves `REQUEST_TIME` transforms on the server.

mod value;

pub use value::{decode_fields, decode_value, encode_fields, encode_value};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::config::FirestoreConfig;
use crate::domain::store::{
    Direction, Document, DocumentPath, DocumentStore, Query, StoreError, Write, WriteData,
};

pub struct FirestoreRestStore {
    client: Client,
    base: Url,
    project_id: String,
    database_id: String,
    access_token: Option<String>,
}

impl FirestoreRestStore {
    pub fn new(client: Client, config: &FirestoreConfig) -> Result<Self, StoreError> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            StoreError::invalid_request(format!("invalid Firestore base URL: {}", e))
        })?;
        if base.cannot_be_a_base() {
            return Err(StoreError::invalid_request(format!(
                "invalid Firestore base URL: {}",
                config.base_url
            )));
        }
        if config.project_id.trim().is_empty() {
            return Err(StoreError::invalid_request("Firestore project_id is empty"));
        }

        Ok(Self {
            client,
            base,
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// `{base}/projects/{p}/databases/{d}/{tail...}`, percent-encoded per segment.
    fn endpoint(&self, tail: &[String]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([
                    "projects",
                    self.project_id.as_str(),
                    "databases",
                    self.database_id.as_str(),
                ])
                .extend(tail);
        }
        url
    }

    fn document_url(&self, path: &DocumentPath) -> Url {
        let mut tail = vec!["documents".to_string()];
        tail.extend(path.segments().iter().cloned());
        self.endpoint(&tail)
    }

    fn database_name(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.database_name(), path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let req = match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        req.send()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))
    }

    async fn read_json(resp: Response) -> Result<Value, StoreError> {
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| StoreError::unavailable(format!("unreadable Firestore response: {}", e)))
    }

    fn decode_document(&self, doc: &Value) -> Result<Document, StoreError> {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::invalid_request("Firestore document without name"))?;
        let relative = name
            .split_once("/documents/")
            .map(|(_, rest)| rest)
            .ok_or_else(|| {
                StoreError::invalid_request(format!("unexpected document name '{}'", name))
            })?;

        Ok(Document {
            path: DocumentPath::parse(relative)?,
            fields: decode_fields(doc.get("fields"))?,
        })
    }

    fn encode_write(&self, write: &Write) -> Value {
        match write {
            Write::Create { path, data } => {
                let mut entry = self.update_entry(path, data);
                entry["currentDocument"] = json!({ "exists": false });
                entry
            }
            Write::Set { path, data } => self.update_entry(path, data),
            Write::Update { path, data } => {
                let mut entry = self.update_entry(path, data);
                let mask: Vec<String> = data.fields.keys().map(|k| quote_field_path(k)).collect();
                entry["updateMask"] = json!({ "fieldPaths": mask });
                entry["currentDocument"] = json!({ "exists": true });
                entry
            }
            Write::Delete { path } => json!({ "delete": self.document_name(path) }),
        }
    }

    fn update_entry(&self, path: &DocumentPath, data: &WriteData) -> Value {
        let mut entry = json!({
            "update": {
                "name": self.document_name(path),
                "fields": encode_fields(&data.fields),
            }
        });
        if !data.server_timestamps.is_empty() {
            let transforms: Vec<Value> = data
                .server_timestamps
                .iter()
                .map(|f| json!({ "fieldPath": quote_field_path(f), "setToServerValue": "REQUEST_TIME" }))
                .collect();
            entry["updateTransforms"] = Value::Array(transforms);
        }
        entry
    }
}

#[async_trait]
impl DocumentStore for FirestoreRestStore {
    #[instrument(name = "family_tree.firestore.get", skip_all, fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        let resp = self
            .send(self.client.get(self.document_url(path)))
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!("document does not exist");
            return Ok(None);
        }
        let body = Self::read_json(resp).await?;
        self.decode_document(&body).map(Some)
    }

    #[instrument(
        name = "family_tree.firestore.run_query",
        skip_all,
        fields(collection = %query.collection)
    )]
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        query.collection.validate()?;
        let mut tail = vec!["documents".to_string()];
        match query.collection.parent() {
            Some(parent) => {
                let segments = parent.segments();
                tail.extend(segments[..segments.len() - 1].iter().cloned());
                tail.push(format!("{}:runQuery", parent.id()));
            }
            None => tail[0] = "documents:runQuery".to_string(),
        }

        let order_by: Vec<Value> = query
            .order_by
            .iter()
            .map(|o| {
                let direction = match o.direction {
                    Direction::Ascending => "ASCENDING",
                    Direction::Descending => "DESCENDING",
                };
                json!({
                    "field": { "fieldPath": quote_field_path(&o.field) },
                    "direction": direction,
                })
            })
            .collect();
        let mut structured = json!({ "from": [{ "collectionId": query.collection.id() }] });
        if !order_by.is_empty() {
            structured["orderBy"] = Value::Array(order_by);
        }

        let resp = self
            .send(
                self.client
                    .post(self.endpoint(&tail))
                    .json(&json!({ "structuredQuery": structured })),
            )
            .await?;
        let body = Self::read_json(resp).await?;

        // One entry per result; entries without "document" only carry a readTime.
        let docs = body
            .as_array()
            .ok_or_else(|| StoreError::invalid_request("runQuery response is not an array"))?
            .iter()
            .filter_map(|entry| entry.get("document"))
            .map(|doc| self.decode_document(doc))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("query returned {} documents", docs.len());
        Ok(docs)
    }

    #[instrument(name = "family_tree.firestore.commit", skip_all, fields(writes = writes.len()))]
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        for write in &writes {
            write.path().validate()?;
        }
        let body = json!({
            "writes": writes.iter().map(|w| self.encode_write(w)).collect::<Vec<_>>(),
        });
        let resp = self
            .send(
                self.client
                    .post(self.endpoint(&["documents:commit".to_string()]))
                    .json(&body),
            )
            .await?;
        Self::read_json(resp).await?;
        Ok(())
    }
}

async fn error_from_response(resp: Response) -> StoreError {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));

    match status.as_u16() {
        404 => StoreError::NotFound { path: message },
        409 => StoreError::AlreadyExists { path: message },
        401 | 403 => StoreError::PermissionDenied { message },
        408 | 429 | 500..=599 => StoreError::Unavailable { message },
        _ => StoreError::InvalidRequest { message },
    }
}

/// Simple names pass through; anything else is backtick-quoted.
fn quote_field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}
