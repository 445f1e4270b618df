//! Authentication: password hashing, token signing, the auth gate middleware and the
//! cookie that carries the token between requests.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use actix_web::cookie::{time::OffsetDateTime, Cookie, CookieBuilder};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;

pub use extractors::{subject, AuthenticatedUserId, Subject};
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use token::{Claims, IssuedToken, TokenSigner, TokenVerifier, VerifiedToken};

/// Name of the cookie holding the bearer token.
pub const TOKEN_COOKIE: &str = "token";

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Cookie carrying `token`, expiring exactly when the token does.
pub fn token_cookie(issued: &IssuedToken) -> Result<Cookie<'static>, AppError> {
    Ok(base_cookie(issued.token.clone())
        .expires(to_offset_date_time(issued.expires_at)?)
        .finish())
}

/// Empty cookie with an expiry in the past, instructing the client to drop it.
pub fn expired_token_cookie() -> Cookie<'static> {
    base_cookie(String::new())
        .expires(OffsetDateTime::UNIX_EPOCH)
        .finish()
}

fn base_cookie(value: String) -> CookieBuilder<'static> {
    Cookie::build(TOKEN_COOKIE, value)
        .http_only(true)
        .secure(true)
        .path("/")
}

fn to_offset_date_time(at: DateTime<Utc>) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| AppError::internal(format!("cookie expiry out of range: {}", e)))
}
