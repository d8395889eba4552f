use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use super::r#trait::{
    DocumentStore, IndexDefinition, KeyRange, PutResponse, SecurityObject, StoreError,
    UpdateValidator,
};

#[derive(Debug, Clone)]
struct StoredDoc {
    seq: u64,
    rev: String,
    deleted: bool,
    body: JsonValue,
}

#[derive(Debug, Default)]
struct Database {
    security: SecurityObject,
    validators: BTreeMap<&'static str, UpdateValidator>,
    indexes: BTreeMap<&'static str, IndexDefinition>,
    docs: BTreeMap<String, StoredDoc>,
}

/// In-memory document store with CouchDB-like revision semantics.
///
/// Intended for tests/dev. Keys are kept in lexical order so range scans and
/// index queries come back in a stable order.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    db: RwLock<Option<Database>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current security object, if the database exists.
    pub fn security(&self) -> Option<SecurityObject> {
        self.db.read().ok()?.as_ref().map(|db| db.security.clone())
    }

    /// Names of installed validators and indexes, for inspection in tests.
    pub fn design(&self) -> (Vec<&'static str>, Vec<&'static str>) {
        match self.db.read().ok().as_deref() {
            Some(Some(db)) => (
                db.validators.keys().copied().collect(),
                db.indexes.keys().copied().collect(),
            ),
            _ => (vec![], vec![]),
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let guard = self
            .db
            .read()
            .map_err(|_| StoreError::Transport("lock poisoned".to_string()))?;
        let db = guard.as_ref().ok_or_else(missing_database)?;
        f(db)
    }

    fn with_db_mut<T>(
        &self,
        f: impl FnOnce(&mut Database) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .db
            .write()
            .map_err(|_| StoreError::Transport("lock poisoned".to_string()))?;
        let db = guard.as_mut().ok_or_else(missing_database)?;
        f(db)
    }
}

fn missing_database() -> StoreError {
    StoreError::NotFound("Database does not exist.".to_string())
}

fn conflict() -> StoreError {
    StoreError::Conflict("Document update conflict.".to_string())
}

fn next_rev(seq: u64) -> String {
    format!("{seq}-{}", Uuid::now_v7().simple())
}

impl Database {
    fn put(&mut self, key: &str, mut doc: JsonValue) -> Result<PutResponse, StoreError> {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::from_status(400, "Document must be a JSON object"))?;

        match obj.get("_id") {
            Some(JsonValue::String(id)) if id != key => {
                return Err(StoreError::from_status(400, "Document id must match the key"));
            }
            Some(JsonValue::String(_)) | None => {}
            Some(_) => return Err(StoreError::from_status(400, "Document id must be a string")),
        }

        let deleted = obj.get("_deleted").and_then(JsonValue::as_bool).unwrap_or(false);
        let supplied_rev = obj.get("_rev").and_then(JsonValue::as_str).map(str::to_owned);

        if !deleted {
            for validator in self.validators.values() {
                (validator.check)(&doc).map_err(StoreError::Forbidden)?;
            }
        }

        let seq = match (self.docs.get(key), supplied_rev.as_deref()) {
            (None, _) if deleted => return Err(StoreError::NotFound("missing".to_string())),
            (None, None) => 1,
            (None, Some(_)) => return Err(conflict()),
            (Some(existing), _) if existing.deleted && deleted => {
                return Err(StoreError::NotFound("deleted".to_string()));
            }
            // A tombstone may be overwritten without naming its revision.
            (Some(existing), None) if existing.deleted => existing.seq + 1,
            (Some(existing), Some(rev)) if rev == existing.rev => existing.seq + 1,
            (Some(_), _) => return Err(conflict()),
        };

        let rev = next_rev(seq);
        let body = if deleted {
            json!({ "_id": key, "_rev": rev, "_deleted": true })
        } else {
            let mut body = doc;
            if let Some(obj) = body.as_object_mut() {
                obj.insert("_id".to_string(), JsonValue::String(key.to_string()));
                obj.insert("_rev".to_string(), JsonValue::String(rev.clone()));
            }
            body
        };

        self.docs.insert(
            key.to_string(),
            StoredDoc {
                seq,
                rev: rev.clone(),
                deleted,
                body,
            },
        );

        Ok(PutResponse {
            ok: true,
            id: key.to_string(),
            rev,
        })
    }

    fn live_docs(&self) -> impl Iterator<Item = (&String, &StoredDoc)> {
        self.docs.iter().filter(|(_, d)| !d.deleted)
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn ensure_database(&self) -> Result<(), StoreError> {
        let mut guard = self
            .db
            .write()
            .map_err(|_| StoreError::Transport("lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(Database::default());
        }
        Ok(())
    }

    async fn set_security(&self, security: &SecurityObject) -> Result<(), StoreError> {
        self.with_db_mut(|db| {
            db.security = security.clone();
            Ok(())
        })
    }

    async fn set_validator(&self, validator: &UpdateValidator) -> Result<(), StoreError> {
        self.with_db_mut(|db| {
            db.validators.insert(validator.name, *validator);
            Ok(())
        })
    }

    async fn define_index(&self, index: &IndexDefinition) -> Result<(), StoreError> {
        self.with_db_mut(|db| {
            db.indexes.insert(index.name, *index);
            Ok(())
        })
    }

    async fn get(&self, key: &str) -> Result<JsonValue, StoreError> {
        self.with_db(|db| match db.docs.get(key) {
            None => Err(StoreError::NotFound("missing".to_string())),
            Some(d) if d.deleted => Err(StoreError::NotFound("deleted".to_string())),
            Some(d) => Ok(d.body.clone()),
        })
    }

    async fn put(&self, key: &str, doc: JsonValue) -> Result<PutResponse, StoreError> {
        self.with_db_mut(|db| db.put(key, doc))
    }

    async fn all_docs(&self, range: &KeyRange) -> Result<Vec<JsonValue>, StoreError> {
        self.with_db(|db| {
            Ok(db
                .docs
                .range::<str, _>((std::ops::Bound::Included(range.start.as_str()), std::ops::Bound::Unbounded))
                .take_while(|(key, _)| range.contains(key))
                .filter(|(_, d)| !d.deleted)
                .map(|(_, d)| d.body.clone())
                .collect())
        })
    }

    async fn query(&self, index: &str, key: &JsonValue) -> Result<Vec<JsonValue>, StoreError> {
        self.with_db(|db| {
            let def = db
                .indexes
                .get(index)
                .ok_or_else(|| StoreError::NotFound("missing_named_view".to_string()))?;
            Ok(db
                .live_docs()
                .filter_map(|(_, d)| (def.emit)(&d.body))
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v)
                .collect())
        })
    }
}
