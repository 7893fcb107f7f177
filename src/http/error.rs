//! HTTP error handling and response types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::engine::EngineError;

pub const VENUE_BOOKED: &str = "Venue already booked at that time";

/// Error response body. `error` is the human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Required request fields absent or blank.
    MissingFields(&'static str),
    /// Malformed request (unparseable body, bad date/time, ...).
    BadRequest(String),
    Engine(EngineError),
    Auth(AuthError),
}

impl AppError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("FIELDS_REQUIRED", *msg))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("BAD_REQUEST", msg.clone()))
            }
            AppError::Auth(e @ AuthError::MissingCredentials) => {
                (StatusCode::UNAUTHORIZED, ErrorBody::new("UNAUTHORIZED", e.to_string()))
            }
            AppError::Auth(e @ AuthError::InvalidToken) => {
                (StatusCode::FORBIDDEN, ErrorBody::new("FORBIDDEN", e.to_string()))
            }
            AppError::Engine(e) => engine_status_and_body(e),
        }
    }
}

fn engine_status_and_body(e: &EngineError) -> (StatusCode, ErrorBody) {
    match e {
        EngineError::EmptyField(_)
        | EngineError::InvalidSpan(_)
        | EngineError::InvalidCapacity
        | EngineError::LimitExceeded(_) => {
            (StatusCode::BAD_REQUEST, ErrorBody::new("BAD_REQUEST", e.to_string()))
        }
        EngineError::UnknownVenue(_) => {
            (StatusCode::NOT_FOUND, ErrorBody::new("UNKNOWN_VENUE", e.to_string()))
        }
        EngineError::VenueExists(_) => {
            (StatusCode::CONFLICT, ErrorBody::new("VENUE_EXISTS", e.to_string()))
        }
        EngineError::Conflict { .. } => (
            StatusCode::CONFLICT,
            ErrorBody::new("VENUE_BOOKED", VENUE_BOOKED).with_details(e.to_string()),
        ),
        EngineError::Closed => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new("STORE_CLOSED", "Store is shutting down"),
        ),
        EngineError::WalError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("STORAGE_ERROR", "Storage error"),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Engine(e) = &self
            && !e.is_client_error()
        {
            tracing::error!("storage failure: {e}");
        }
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::Engine(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
