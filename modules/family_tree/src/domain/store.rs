//! Port for the remote document store the domain writes to.
//!
//! The store is hierarchical: collections hold documents, documents may own
//! sub-collections. Paths alternate collection and document ids
//! (`familyTrees/{treeId}/persons/{personId}`).

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::contract::model::Fields;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document not found: {path}")]
    NotFound { path: String },

    #[error("document already exists: {path}")]
    AlreadyExists { path: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl StoreError {
    pub fn not_found(path: impl fmt::Display) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub fn already_exists(path: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            path: path.to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Path of a collection: an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path of a document: an even, non-zero number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

/// Why `segment` cannot be a collection or document id, if it cannot.
/// Dot segments would be collapsed by URL resolution and `__name__` ids are
/// reserved by the store.
pub fn segment_error(segment: &str) -> Option<&'static str> {
    if segment.is_empty() {
        Some("must not be empty")
    } else if segment.contains('/') {
        Some("must not contain '/'")
    } else if segment == "." || segment == ".." {
        Some("must not be '.' or '..'")
    } else if segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__") {
        Some("must not match the reserved '__name__' form")
    } else {
        None
    }
}

fn check_segments(kind: &str, segments: &[String]) -> Result<(), StoreError> {
    match segments
        .iter()
        .find_map(|seg| segment_error(seg).map(|why| (seg, why)))
    {
        Some((seg, why)) => Err(StoreError::invalid_request(format!(
            "invalid {} segment '{}' in '{}': {}",
            kind,
            seg,
            segments.join("/"),
            why
        ))),
        None => Ok(()),
    }
}

impl CollectionPath {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            segments: vec![id.into()],
        }
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        DocumentPath { segments }
    }

    /// Last segment, e.g. `persons`.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Owning document for sub-collections, `None` for root collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        (self.segments.len() > 1).then(|| DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every segment is a usable id; adapters check this before addressing the store.
    pub fn validate(&self) -> Result<(), StoreError> {
        check_segments("collection path", &self.segments)
    }
}

impl DocumentPath {
    /// Parse `a/b/c/d`. Rejects empty segments and odd segment counts.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if segments.len() % 2 != 0 {
            return Err(StoreError::invalid_request(format!(
                "not a document path: '{}'",
                raw
            )));
        }
        let path = Self { segments };
        path.validate()?;
        Ok(path)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        check_segments("document path", &self.segments)
    }

    pub fn collection(&self, id: impl Into<String>) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        CollectionPath { segments }
    }

    /// Document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Fields to write plus the fields the store sets to its own clock at commit
/// time. A server timestamp wins over a plain field of the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteData {
    pub fields: Fields,
    pub server_timestamps: BTreeSet<String>,
}

impl WriteData {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: BTreeSet::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_server_timestamp(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.fields.remove(&name);
        self.server_timestamps.insert(name);
        self
    }

    /// Plain fields with every server timestamp replaced by `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Fields {
        let stamp = Value::String(format_timestamp(now));
        let mut out = self.fields.clone();
        for name in &self.server_timestamps {
            out.insert(name.clone(), stamp.clone());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Fails with `AlreadyExists` if the document exists.
    Create { path: DocumentPath, data: WriteData },
    /// Replaces the whole document.
    Set { path: DocumentPath, data: WriteData },
    /// Merges top-level fields; fails with `NotFound` if the document is missing.
    Update { path: DocumentPath, data: WriteData },
    /// Removes the document; missing documents are not an error.
    Delete { path: DocumentPath },
}

impl Write {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Write::Create { path, .. }
            | Write::Set { path, .. }
            | Write::Update { path, .. }
            | Write::Delete { path } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// All documents of one collection, ordered by the given fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: CollectionPath,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            order_by: Vec::new(),
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }
}

/// RFC 3339, UTC, fixed microsecond precision so string order matches time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Persistence operations the domain needs from a document store.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load one document, `None` if it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Documents of a collection in query order. Documents missing an
    /// ordering field are not returned.
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Apply all writes atomically: either every write lands or none does.
    /// Server timestamps resolve to a single instant per commit.
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError>;

    /// Fresh id for a document about to be created.
    fn new_document_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Create a document with a store-assigned id.
    async fn add(
        &self,
        collection: &CollectionPath,
        data: WriteData,
    ) -> Result<DocumentPath, StoreError> {
        let path = collection.doc(self.new_document_id());
        self.commit(vec![Write::Create {
            path: path.clone(),
            data,
        }])
        .await?;
        Ok(path)
    }

    async fn update(&self, path: &DocumentPath, data: WriteData) -> Result<(), StoreError> {
        self.commit(vec![Write::Update {
            path: path.clone(),
            data,
        }])
        .await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.commit(vec![Write::Delete { path: path.clone() }])
            .await
    }
}
