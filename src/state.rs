use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenSigner};
use crate::store::{TaskStore, TodoStore, UserStore};

/// Handles shared by every worker. Nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: Arc<TokenSigner>,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Builds the state from one value implementing all three datastore capabilities.
    pub fn new<S>(store: Arc<S>, tokens: TokenSigner, hasher: PasswordHasher) -> Self
    where
        S: UserStore + TodoStore + TaskStore + 'static,
    {
        Self {
            users: store.clone(),
            todos: store.clone(),
            tasks: store,
            tokens: Arc::new(tokens),
            hasher,
        }
    }
}
