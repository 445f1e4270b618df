#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde_json::Map;
use std::sync::Arc;
use todoforge::auth::{PasswordHasher, TokenSigner, TOKEN_COOKIE};
use todoforge::models::User;
use todoforge::routes;
use todoforge::state::AppState;
use todoforge::store::{MemoryStore, UserStore};

pub const PASSWORD: &str = "correct horse battery";
pub const SECRET: &[u8] = b"TEST_SECRET";

/// State over an in-memory store, with the lowest bcrypt cost to keep tests fast.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenSigner::new(Algorithm::HS256, SECRET, Duration::hours(1)).unwrap();
        let hasher = PasswordHasher::new(4).unwrap();
        let state = web::Data::new(AppState::new(store.clone(), tokens, hasher));
        Self { store, state }
    }

    pub async fn seed_user(&self, username: &str) -> User {
        let hash = self.state.hasher.hash_password(PASSWORD).unwrap();
        self.store.create_user(username, &hash).await.unwrap()
    }

    /// Cookie with a freshly issued token for `user`.
    pub fn cookie_for(&self, user: &User) -> Cookie<'static> {
        let issued = self.state.tokens.issue(user.id, Map::new()).unwrap();
        token_cookie(&issued.token)
    }
}

pub fn token_cookie(token: &str) -> Cookie<'static> {
    Cookie::new(TOKEN_COOKIE, token.to_string())
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(App::new().configure(move |cfg| routes::config(cfg, state))).await
}
