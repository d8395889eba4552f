//! `/_contacts` resource.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/_contacts` | [`list_contacts`] |
//! | GET | `/_contacts/:id` | [`get_contact`] |
//! | PUT | `/_contacts/:id` | [`put_contact`] |
//! | DELETE | `/_contacts/:id?rev=` | [`remove_contact`] |

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use contacts_core::ContactId;

use crate::app::services::ContactService;
use crate::app::{dto, errors};
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_contacts))
        .route("/:id", get(get_contact).put(put_contact).delete(remove_contact))
}

pub async fn list_contacts(
    Extension(contacts): Extension<ContactService>,
    Extension(caller): Extension<CallerContext>,
) -> axum::response::Response {
    match contacts.list(caller.caller()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_contact(
    Extension(contacts): Extension<ContactService>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match ContactId::new(id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match contacts.get(caller.caller(), id).await {
        Ok(contact) => (StatusCode::OK, Json(contact)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn put_contact(
    Extension(contacts): Extension<ContactService>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    query: Result<Query<dto::PutContactQuery>, QueryRejection>,
    body: Result<Json<dto::PutContactRequest>, JsonRejection>,
) -> axum::response::Response {
    let id = match ContactId::new(id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return query_rejected(rejection),
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text());
        }
    };
    let rev = query.rev.filter(|r| !r.is_empty());

    match contacts.put(caller.caller(), id, body.into(), rev, Utc::now()).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_contact(
    Extension(contacts): Extension<ContactService>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    query: Result<Query<dto::RemoveContactQuery>, QueryRejection>,
) -> axum::response::Response {
    let id = match ContactId::new(id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return query_rejected(rejection),
    };
    let Some(rev) = query.rev else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "\"rev\" is required");
    };

    match contacts.remove(caller.caller(), id, rev).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn query_rejected(rejection: QueryRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}
