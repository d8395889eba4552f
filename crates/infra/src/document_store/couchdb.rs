//! CouchDB-backed document store.
//!
//! Speaks the CouchDB HTTP API directly with `reqwest`. Document keys are sent
//! as single path segments, so the `/` separators inside a contact key travel
//! as `%2F`.
//!
//! ## Error Mapping
//!
//! | CouchDB response | StoreError |
//! |------------------|------------|
//! | 403 `forbidden` (validator) | `Forbidden` |
//! | 404 `not_found` | `NotFound` |
//! | 409 `conflict` | `Conflict` |
//! | other non-2xx | `Status { status, reason }` |
//! | non-2xx without a JSON body | same mapping, canonical reason as message |
//! | connection / decode failure | `Transport` |
//!
//! Validators and indexes are installed as design documents named after
//! them (`_design/{name}`), overwriting any previous revision.

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, instrument};
use url::Url;

use super::r#trait::{
    DocumentStore, IndexDefinition, KeyRange, PutResponse, SecurityObject, StoreError,
    UpdateValidator,
};

/// Connection settings for a CouchDB database.
#[derive(Debug, Clone)]
pub struct CouchDbConfig {
    pub url: Url,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Document store backed by one CouchDB database.
///
/// Cheap to share: the underlying `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct CouchDbStore {
    client: Client,
    config: CouchDbConfig,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    rows: Vec<ViewRow>,
}

#[derive(Debug, Deserialize)]
struct ViewRow {
    #[serde(default)]
    doc: Option<JsonValue>,
    #[serde(default)]
    value: JsonValue,
}

impl CouchDbStore {
    pub fn new(config: CouchDbConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// URL of `segments` inside the database; each segment is escaped whole.
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.config.url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("cannot-be-a-base url: {}", self.config.url)))?
            .pop_if_empty()
            .push(&self.config.database)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.config.username {
            Some(user) => req.basic_auth(user, self.config.password.as_deref()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<JsonValue, StoreError> {
        let res = req
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = res.status();
        if status.is_success() {
            return res
                .json()
                .await
                .map_err(|e| StoreError::Transport(format!("invalid response body: {e}")));
        }

        // Non-JSON error bodies (proxy pages, empty) still map by status.
        let text = res.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<JsonValue>(&text) {
            Ok(body) => error_from_body(status.as_u16(), &body),
            Err(_) => StoreError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("store error"),
            ),
        })
    }

    /// Create or overwrite a design document.
    async fn put_design(&self, name: &str, mut body: JsonValue) -> Result<(), StoreError> {
        let url = self.url(&["_design", name])?;
        let current = self.send(self.request(Method::GET, url.clone())).await;
        match current {
            Ok(existing) => {
                if let (Some(rev), Some(obj)) = (existing.get("_rev").cloned(), body.as_object_mut()) {
                    obj.insert("_rev".to_string(), rev);
                }
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(())
    }
}

fn error_from_body(status: u16, body: &JsonValue) -> StoreError {
    let message = body
        .get("reason")
        .or_else(|| body.get("error"))
        .and_then(JsonValue::as_str)
        .unwrap_or("unknown store error");
    StoreError::from_status(status, message)
}

#[async_trait::async_trait]
impl DocumentStore for CouchDbStore {
    #[instrument(skip(self), fields(database = %self.config.database))]
    async fn ensure_database(&self) -> Result<(), StoreError> {
        let url = self.url(&[])?;
        match self.send(self.request(Method::PUT, url)).await {
            Ok(_) => Ok(()),
            // 412 file_exists
            Err(StoreError::Status { status: 412, .. }) => {
                debug!("database already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, security), fields(database = %self.config.database))]
    async fn set_security(&self, security: &SecurityObject) -> Result<(), StoreError> {
        let url = self.url(&["_security"])?;
        self.send(self.request(Method::PUT, url).json(security)).await?;
        Ok(())
    }

    #[instrument(skip(self, validator), fields(validator = validator.name))]
    async fn set_validator(&self, validator: &UpdateValidator) -> Result<(), StoreError> {
        let body = json!({
            "_id": format!("_design/{}", validator.name),
            "validate_doc_update": validator.source,
        });
        self.put_design(validator.name, body).await
    }

    #[instrument(skip(self, index), fields(index = index.name))]
    async fn define_index(&self, index: &IndexDefinition) -> Result<(), StoreError> {
        let mut views = serde_json::Map::new();
        views.insert(index.name.to_string(), json!({ "map": index.map_source }));
        let body = json!({
            "_id": format!("_design/{}", index.name),
            "views": views,
        });
        self.put_design(index.name, body).await
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<JsonValue, StoreError> {
        let url = self.url(&[key])?;
        self.send(self.request(Method::GET, url)).await
    }

    #[instrument(skip(self, doc))]
    async fn put(&self, key: &str, doc: JsonValue) -> Result<PutResponse, StoreError> {
        let url = self.url(&[key])?;
        let body = self.send(self.request(Method::PUT, url).json(&doc)).await?;
        serde_json::from_value(body).map_err(|e| StoreError::Transport(format!("invalid put response: {e}")))
    }

    #[instrument(skip(self))]
    async fn all_docs(&self, range: &KeyRange) -> Result<Vec<JsonValue>, StoreError> {
        let url = self.url(&["_all_docs"])?;
        let query = range_query(range)?;
        let body = self.send(self.request(Method::GET, url).query(&query)).await?;
        let view: ViewResponse = serde_json::from_value(body)
            .map_err(|e| StoreError::Transport(format!("invalid _all_docs response: {e}")))?;
        Ok(view.rows.into_iter().filter_map(|row| row.doc).collect())
    }

    #[instrument(skip(self))]
    async fn query(&self, index: &str, key: &JsonValue) -> Result<Vec<JsonValue>, StoreError> {
        let url = self.url(&["_design", index, "_view", index])?;
        let key = serde_json::to_string(key).map_err(|e| StoreError::Transport(e.to_string()))?;
        let body = self
            .send(self.request(Method::GET, url).query(&[("key", key)]))
            .await?;
        let view: ViewResponse = serde_json::from_value(body)
            .map_err(|e| StoreError::Transport(format!("invalid view response: {e}")))?;
        Ok(view.rows.into_iter().map(|row| row.value).collect())
    }
}

/// `_all_docs` parameters for a half-open key range, documents included.
fn range_query(range: &KeyRange) -> Result<Vec<(&'static str, String)>, StoreError> {
    let encode = |s: &str| serde_json::to_string(s).map_err(|e| StoreError::Transport(e.to_string()));
    Ok(vec![
        ("startkey", encode(&range.start)?),
        ("endkey", encode(&range.end)?),
        ("inclusive_end", "false".to_string()),
        ("include_docs", "true".to_string()),
    ])
}
