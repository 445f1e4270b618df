//!
//! # Custom Error Handling
//!
//! This module defines the error type `AppError` used throughout the application.
//! Handlers, extractors, the auth middleware and the datastore layer all return it, and
//! its `actix_web::error::ResponseError` implementation is the single place where an
//! error becomes a status code and a `{status, code, message}` JSON body.
//!
//! Internal details (database errors, hashing failures) are logged here and replaced by
//! an opaque message before they reach the client. `From` implementations for the
//! crates we call into keep the `?` operator usable everywhere.

use actix_web::{
    error::{BlockingError, ResponseError},
    http::StatusCode,
    HttpResponse,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

const INVALID_REQUEST_MESSAGE: &str = "invalid request";
const UNAUTHORIZED_MESSAGE: &str = "unauthorized, please login again";
const NOT_FOUND_MESSAGE: &str = "not found";
const INTERNAL_SERVER_MESSAGE: &str = "something went wrong, please try again later";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or unparseable input (HTTP 400).
    /// The detail is client-safe and is returned as the response message.
    InvalidRequest(Option<String>),
    /// Missing, invalid or expired token, or bad credentials (HTTP 401).
    /// Carries no detail so that the failure subtypes stay indistinguishable.
    Unauthorized,
    /// Resource absent or not owned by the caller (HTTP 404).
    NotFound,
    /// Datastore or unexpected failure (HTTP 500).
    /// The detail is logged and never sent to the client.
    InternalServer(String),
}

/// JSON shape of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Shorthand for an `InvalidRequest` with a client-facing message.
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(Some(message.into()))
    }

    /// Shorthand for an `InternalServer` error with a log-only detail.
    pub fn internal(detail: impl Into<String>) -> Self {
        AppError::InternalServer(detail.into())
    }

    /// Builds the body returned to the client for this error.
    pub fn body(&self) -> ErrorBody {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidRequest(Some(msg)) => msg.clone(),
            AppError::InvalidRequest(None) => INVALID_REQUEST_MESSAGE.to_string(),
            AppError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
            AppError::NotFound => NOT_FOUND_MESSAGE.to_string(),
            AppError::InternalServer(_) => INTERNAL_SERVER_MESSAGE.to_string(),
        };
        ErrorBody {
            status: status.as_u16(),
            code: status.as_u16().to_string(),
            message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::InvalidRequest(Some(msg)) => write!(f, "Invalid Request: {}", msg),
            AppError::InvalidRequest(None) => write!(f, "Invalid Request"),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::NotFound => write!(f, "Not Found"),
            AppError::InternalServer(detail) => write!(f, "Internal Server Error: {}", detail),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InternalServer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::InternalServer(detail) = self {
            log::error!("internal server error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`; everything else is an opaque internal error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound,
            _ => AppError::InternalServer(format!("database error: {}", error)),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::InternalServer(format!("migration error: {}", error))
    }
}

/// Converts `validator::ValidationErrors` into `AppError::InvalidRequest`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::InvalidRequest(Some(error.to_string()))
    }
}

/// Any token processing failure is reported as a plain `Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        log::debug!("rejecting token: {}", error);
        AppError::Unauthorized
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServer(format!("password hashing failed: {}", error))
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServer(format!("blocking task failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::InvalidRequest(None).error_response().status(), 400);
        assert_eq!(AppError::Unauthorized.error_response().status(), 401);
        assert_eq!(AppError::NotFound.error_response().status(), 404);
        assert_eq!(
            AppError::internal("pool timed out").error_response().status(),
            500
        );
    }

    #[actix_rt::test]
    async fn test_internal_detail_is_not_exposed() {
        let response = AppError::internal("relation \"todo_tasks\" does not exist").error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            body,
            ErrorBody {
                status: 500,
                code: "500".into(),
                message: INTERNAL_SERVER_MESSAGE.into(),
            }
        );
    }

    #[test]
    fn test_invalid_request_detail_is_kept() {
        let body = AppError::invalid("nothing to update").body();
        assert_eq!(body.status, 400);
        assert_eq!(body.code, "400");
        assert_eq!(body.message, "nothing to update");

        assert_eq!(AppError::InvalidRequest(None).body().message, "invalid request");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(sqlx::Error::PoolTimedOut),
            AppError::InternalServer(_)
        ));
    }
}
