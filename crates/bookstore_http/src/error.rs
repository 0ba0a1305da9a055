//! Error types for the HTTP layer.

use crate::alert::failure_alert;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_core::{EntityKind, ServiceError};
use log::{debug, error};
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const INVALID_BODY_KEY: &str = "invalidbody";

/// Failure of one API request, rendered as a problem JSON body.
#[derive(Debug)]
pub enum ApiError {
    /// Typed service failure, with the application name for headers.
    Service { app: Arc<str>, error: ServiceError },
    /// Request body is not a valid JSON payload for the entity.
    InvalidBody {
        app: Arc<str>,
        kind: EntityKind,
        status: StatusCode,
        detail: String,
    },
    /// Infrastructure failure outside the service (worker or lock).
    Internal(String),
}

impl ApiError {
    pub(crate) fn invalid_body(app: &str, kind: EntityKind, rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            app: Arc::from(app),
            kind,
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service { error, .. } => match error {
                ServiceError::IdAlreadyPresent { .. }
                | ServiceError::IdMissing { .. }
                | ServiceError::IdMismatch { .. }
                | ServiceError::UnknownReference { .. } => StatusCode::BAD_REQUEST,
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidBody { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service { error, .. } => write!(f, "{error}"),
            Self::InvalidBody { kind, detail, .. } => write!(f, "invalid {kind} body: {detail}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Service { error, .. } => Some(error),
            Self::InvalidBody { .. } | Self::Internal(_) => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let title = self.to_string();
        match self {
            Self::Service { app, error } if error.is_validation() => {
                let entity_name = error.entity_kind().map(|kind| kind.name()).unwrap_or("");
                problem(&app, status, &title, entity_name, error.error_key())
            }
            Self::InvalidBody { app, kind, .. } => {
                debug!(
                    "event=http_request module=http status=rejected entity={kind} reason=invalid_body"
                );
                problem(&app, status, &title, kind.name(), INVALID_BODY_KEY)
            }
            other => {
                error!("event=http_request module=http status=error error={other}");
                let body = json!({
                    "status": status.as_u16(),
                    "title": "Internal Server Error",
                    "message": "error.internal",
                });
                (status, Json(body)).into_response()
            }
        }
    }
}

fn problem(app: &str, status: StatusCode, title: &str, entity_name: &str, key: &str) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "title": title,
        "entityName": entity_name,
        "errorKey": key,
        "message": format!("error.{key}"),
    });
    (status, failure_alert(app, entity_name, key), Json(body)).into_response()
}

/// Errors that stop the HTTP server.
#[derive(Debug)]
pub enum ServerError {
    Bind { addr: String, source: std::io::Error },
    Serve(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "failed to bind on {addr}: {source}"),
            Self::Serve(source) => write!(f, "server error: {source}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Bind { source, .. } | Self::Serve(source) => Some(source),
        }
    }
}
