use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::policy::AccessError;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Error body returned by every endpoint: `{"error": "<Title>", "message": "<detail>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::validation(m),
            ServiceError::NotFound(m) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(m)),
            ServiceError::Conflict(m) => Self::new(StatusCode::CONFLICT, "Conflict", Some(m)),
            ServiceError::Unavailable(m) => {
                error!(error = %m, "store unavailable");
                // the driver message stays in the log
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    Some("the data store is temporarily unavailable".into()),
                )
            }
        }
    }
}

impl From<AccessError> for JsonApiError {
    fn from(e: AccessError) -> Self {
        let status = match e {
            AccessError::Unauthenticated | AccessError::InvalidToken => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden => StatusCode::FORBIDDEN,
        };
        let title = if status == StatusCode::FORBIDDEN { "Forbidden" } else { "Unauthorized" };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, title = self.title, "request failed");
        } else if self.status != StatusCode::NOT_FOUND {
            warn!(status = %self.status, title = self.title, detail = ?self.detail, "request rejected");
        }
        let body = ErrorBody {
            error: self.title.to_string(),
            message: self.detail.unwrap_or_else(|| self.title.to_string()),
        };
        let mut resp = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        resp
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
