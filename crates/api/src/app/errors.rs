use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use contacts_core::DomainError;
use contacts_infra::StoreError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::MalformedDocument(msg) => {
            tracing::error!(error = %msg, "stored document did not parse");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "malformed_document", msg)
        }
    }
}

/// Forward a store failure with the store's own status and reason.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = match &err {
        StoreError::NotFound(_) => "not_found",
        StoreError::Conflict(_) => "conflict",
        StoreError::Forbidden(_) => "forbidden",
        StoreError::Status { .. } | StoreError::Transport(_) => "store_error",
    };

    if status.is_server_error() {
        tracing::warn!(status = status.as_u16(), error = %err, "document store request failed");
    }

    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
