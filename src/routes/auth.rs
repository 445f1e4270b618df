use actix_web::{get, post, web, HttpResponse};
use serde_json::Map;

use crate::auth::{expired_token_cookie, token_cookie, AuthenticatedUserId, LoginRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Logs a user in.
///
/// Looks the user up by username and compares the password on the blocking pool. An
/// unknown username still pays for one bcrypt comparison, and both failure branches
/// return the same `401` body. On success the token is set as the `token` cookie and the
/// user is returned.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { username, password } = login_data.into_inner();

    let user = state.users.find_user_by_username(&username).await?;

    let hasher = state.hasher.clone();
    let stored_hash = user.as_ref().map(|user| user.password.clone());
    let password_ok = web::block(move || match stored_hash {
        Some(hash) => hasher.verify_password(&password, &hash),
        None => {
            hasher.burn(&password);
            false
        }
    })
    .await?;

    let user = match user {
        Some(user) if password_ok => user,
        _ => {
            log::debug!("rejecting login for {:?}", username);
            return Err(AppError::Unauthorized);
        }
    };

    let issued = state.tokens.issue(user.id, Map::new())?;
    log::info!("user {} logged in", user.id);

    Ok(HttpResponse::Ok().cookie(token_cookie(&issued)?).json(user))
}

/// Clears the token cookie. Works with or without a valid session.
#[post("/logout")]
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().cookie(expired_token_cookie()).finish()
}

/// Returns the authenticated user.
#[get("")]
pub async fn me(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .find_user(user_id.0)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(user))
}
