use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

/// The authenticated user id, stored in request extensions by `AuthMiddleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub Uuid);

/// Returns the subject bound to this request, if `AuthMiddleware` set one.
pub fn subject(req: &HttpRequest) -> Option<Uuid> {
    req.extensions().get::<Subject>().map(|subject| subject.0)
}

/// Extracts the authenticated user's ID from request extensions.
///
/// Intended for routes wrapped by `AuthMiddleware`. If no subject was recorded the
/// extractor fails with `AppError::Unauthorized`.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUserId(pub Uuid);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match subject(req) {
            Some(user_id) => ready(Ok(AuthenticatedUserId(user_id))),
            None => ready(Err(AppError::Unauthorized.into())),
        }
    }
}
