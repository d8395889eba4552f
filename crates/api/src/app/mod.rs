//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: store wiring and the contact operations
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use contacts_infra::{DocumentStore, StoreError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Register the contacts database, then build the full HTTP router.
///
/// Registration failure is returned to the caller; the service must not start
/// serving without its index and validator in place.
pub async fn build_app(jwt_secret: String, store: Arc<dyn DocumentStore>) -> Result<Router, StoreError> {
    contacts_infra::register(store.as_ref()).await?;

    let jwt = Arc::new(contacts_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let contacts = services::ContactService::new(store);

    // Protected routes: require a valid bearer token.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(Extension(contacts))
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            )),
    );

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use contacts_infra::document_store::InMemoryDocumentStore;
    use tower::ServiceExt;

    use contacts_infra::document_store::{IndexDefinition, KeyRange, PutResponse, SecurityObject, UpdateValidator};
    use serde_json::Value as JsonValue;

    /// Registration step that the store refuses.
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Refuse {
        Validator,
        Index,
    }

    /// In-memory store that rejects one registration step.
    struct RefusingStore {
        inner: InMemoryDocumentStore,
        refuse: Refuse,
    }

    impl RefusingStore {
        fn new(refuse: Refuse) -> Self {
            Self {
                inner: InMemoryDocumentStore::new(),
                refuse,
            }
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for RefusingStore {
        async fn ensure_database(&self) -> Result<(), StoreError> {
            self.inner.ensure_database().await
        }

        async fn set_security(&self, security: &SecurityObject) -> Result<(), StoreError> {
            self.inner.set_security(security).await
        }

        async fn set_validator(&self, validator: &UpdateValidator) -> Result<(), StoreError> {
            if self.refuse == Refuse::Validator {
                return Err(StoreError::Forbidden("only admin can update design docs".to_string()));
            }
            self.inner.set_validator(validator).await
        }

        async fn define_index(&self, index: &IndexDefinition) -> Result<(), StoreError> {
            if self.refuse == Refuse::Index {
                return Err(StoreError::Status {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                });
            }
            self.inner.define_index(index).await
        }

        async fn get(&self, key: &str) -> Result<JsonValue, StoreError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, doc: JsonValue) -> Result<PutResponse, StoreError> {
            self.inner.put(key, doc).await
        }

        async fn all_docs(&self, range: &KeyRange) -> Result<Vec<JsonValue>, StoreError> {
            self.inner.all_docs(range).await
        }

        async fn query(&self, index: &str, key: &JsonValue) -> Result<Vec<JsonValue>, StoreError> {
            self.inner.query(index, key).await
        }
    }

    async fn app() -> Router {
        build_app("test-secret".to_string(), Arc::new(InMemoryDocumentStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let res = app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn contacts_require_a_token() {
        let res = app()
            .await
            .oneshot(Request::get("/_contacts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refused_validator_stops_startup() {
        let err = build_app("test-secret".to_string(), Arc::new(RefusingStore::new(Refuse::Validator)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Forbidden("only admin can update design docs".to_string()));
    }

    #[tokio::test]
    async fn refused_index_stops_startup() {
        let store = Arc::new(RefusingStore::new(Refuse::Index));
        let res = build_app("test-secret".to_string(), store.clone()).await;

        assert!(matches!(res, Err(StoreError::Status { status: 503, .. })));
        // Steps before the failure did run.
        assert_eq!(store.inner.design(), (vec!["require_type"], vec![]));
    }
}
