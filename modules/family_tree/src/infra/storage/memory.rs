//! In-process document store.
//!
//! Documents live in one ordered map behind a lock; a commit checks every
//! precondition before touching the map, then applies all writes under the
//! same write guard. The store's own clock plays the role of the server clock.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::contract::model::Fields;
use crate::domain::store::{
    parse_timestamp, Direction, Document, DocumentPath, DocumentStore, OrderBy, Query, StoreError,
    Write,
};

#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<BTreeMap<DocumentPath, Fields>>,
    last_commit: Mutex<Option<DateTime<Utc>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Strictly increasing across commits, even within one clock tick.
    fn next_commit_time(&self) -> DateTime<Utc> {
        let mut last = self.last_commit.lock();
        let now = Utc::now();
        let ts = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(ts);
        ts
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[instrument(name = "family_tree.memory.get", skip_all, fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        let doc = self.docs.read().get(path).map(|fields| Document {
            path: path.clone(),
            fields: fields.clone(),
        });
        debug!(found = doc.is_some(), "document lookup");
        Ok(doc)
    }

    #[instrument(
        name = "family_tree.memory.run_query",
        skip_all,
        fields(collection = %query.collection)
    )]
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        query.collection.validate()?;
        let docs = self.docs.read();
        let mut out: Vec<Document> = docs
            .iter()
            .filter(|(path, _)| path.parent() == query.collection)
            .filter(|(_, fields)| query.order_by.iter().all(|o| fields.contains_key(&o.field)))
            .map(|(path, fields)| Document {
                path: path.clone(),
                fields: fields.clone(),
            })
            .collect();

        out.sort_by(|a, b| compare_documents(a, b, &query.order_by));
        debug!("query matched {} documents", out.len());
        Ok(out)
    }

    #[instrument(name = "family_tree.memory.commit", skip_all, fields(writes = writes.len()))]
    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        for write in &writes {
            write.path().validate()?;
        }
        let mut docs = self.docs.write();

        // Preconditions first so a failing write leaves nothing behind.
        let mut staged: BTreeMap<&DocumentPath, bool> = BTreeMap::new();
        for write in &writes {
            let path = write.path();
            let exists = staged
                .get(path)
                .copied()
                .unwrap_or_else(|| docs.contains_key(path));
            match write {
                Write::Create { .. } if exists => return Err(StoreError::already_exists(path)),
                Write::Update { .. } if !exists => return Err(StoreError::not_found(path)),
                Write::Delete { .. } => {
                    staged.insert(path, false);
                }
                _ => {
                    staged.insert(path, true);
                }
            }
        }

        let now = self.next_commit_time();
        for write in writes {
            match write {
                Write::Create { path, data } | Write::Set { path, data } => {
                    docs.insert(path, data.resolve(now));
                }
                Write::Update { path, data } => {
                    let current = docs.entry(path).or_default();
                    for (name, value) in data.resolve(now) {
                        current.insert(name, value);
                    }
                }
                Write::Delete { path } => {
                    docs.remove(&path);
                }
            }
        }
        Ok(())
    }
}

fn compare_documents(a: &Document, b: &Document, order_by: &[OrderBy]) -> Ordering {
    for o in order_by {
        let ord = compare_values(
            a.fields.get(&o.field).unwrap_or(&Value::Null),
            b.fields.get(&o.field).unwrap_or(&Value::Null),
        );
        let ord = apply_direction(ord, o.direction);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    // Ties break on document id, in the direction of the last clause.
    let direction = order_by
        .last()
        .map(|o| o.direction)
        .unwrap_or(Direction::Ascending);
    apply_direction(a.id().cmp(b.id()), direction)
}

fn apply_direction(ord: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Cross-type ordering: null < bool < number < string < array < map.
/// Strings that are both timestamps compare as instants.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(tx), Some(ty)) => tx.cmp(&ty),
            _ => x.cmp(y),
        },
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
