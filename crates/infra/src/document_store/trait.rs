use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

/// Result of a successful write: the key written and its new revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResponse {
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Document store operation error.
///
/// Every variant maps to the HTTP status the store reported (or would report),
/// so callers can forward it unchanged.
///
/// ## Error Categories
///
/// - **NotFound** (404): key absent or tombstoned, or an unknown index
/// - **Conflict** (409): revision token missing or stale
/// - **Forbidden** (403): rejected by an installed update validator
/// - **Status**: any other non-success status the store returned
/// - **Transport**: no usable response at all (connection, decode); reported as 500
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Build an error from a store status code and its reason text.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::Status { status, message },
        }
    }

    /// HTTP status to surface; 500 when the store gave none.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Forbidden(_) => 403,
            Self::Status { status, .. } => *status,
            Self::Transport(_) => 500,
        }
    }
}

/// Lexical key range `[start, end)` for scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

impl KeyRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.end.as_str()
    }
}

/// Names and roles allowed into one access tier of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Database access-control rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityObject {
    pub admins: SecurityGroup,
    pub members: SecurityGroup,
}

/// Server-side check run on every write.
///
/// Carried in two forms: `source` is the JavaScript installed into stores that
/// execute it themselves; `check` is the same rule for stores that run it
/// natively. `Err` carries the `forbidden` reason.
#[derive(Debug, Clone, Copy)]
pub struct UpdateValidator {
    pub name: &'static str,
    pub source: &'static str,
    pub check: fn(&JsonValue) -> Result<(), String>,
}

/// Secondary index defined by a map function.
///
/// `emit` mirrors `map_source`: it returns the `(key, value)` row for a live
/// document, or `None` to skip it.
#[derive(Debug, Clone, Copy)]
pub struct IndexDefinition {
    pub name: &'static str,
    pub map_source: &'static str,
    pub emit: fn(&JsonValue) -> Option<(JsonValue, JsonValue)>,
}

/// Body of a tombstone write for `key` at revision `rev`.
pub fn tombstone(key: &str, rev: &str) -> JsonValue {
    json!({
        "_id": key,
        "_rev": rev,
        "_deleted": true,
    })
}

/// Narrow document database contract.
///
/// ## Write Semantics
///
/// `put()` is an upsert guarded by revision tokens:
/// - a new key is written without `_rev`
/// - an existing live key requires the current `_rev`, otherwise `Conflict`
/// - a body with `_deleted: true` records a tombstone (soft delete)
/// - on success the store issues a fresh revision
///
/// ## Read Semantics
///
/// `get()` returns `NotFound` for absent and tombstoned keys. `all_docs()` and
/// `query()` return live documents only, in store order.
///
/// ## Setup
///
/// `ensure_database`, `set_security`, `set_validator` and `define_index` are
/// idempotent and intended to be run once at startup.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the backing database unless it already exists.
    async fn ensure_database(&self) -> Result<(), StoreError>;

    /// Replace the database's access-control rules.
    async fn set_security(&self, security: &SecurityObject) -> Result<(), StoreError>;

    /// Install (or replace) a server-enforced update validator.
    async fn set_validator(&self, validator: &UpdateValidator) -> Result<(), StoreError>;

    /// Define (or replace) a secondary index.
    async fn define_index(&self, index: &IndexDefinition) -> Result<(), StoreError>;

    /// Fetch the live document at `key`.
    async fn get(&self, key: &str) -> Result<JsonValue, StoreError>;

    /// Write `doc` at `key`.
    async fn put(&self, key: &str, doc: JsonValue) -> Result<PutResponse, StoreError>;

    /// Live documents whose key lies in `range`, in key order.
    async fn all_docs(&self, range: &KeyRange) -> Result<Vec<JsonValue>, StoreError>;

    /// Values emitted by `index` under exactly `key`.
    async fn query(&self, index: &str, key: &JsonValue) -> Result<Vec<JsonValue>, StoreError>;
}
