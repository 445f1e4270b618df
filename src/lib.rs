#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Authentication, ownership-scoped todo and task resources, the datastore layer and"]
#![doc = "its ordered task protocol, configuration and error mapping. The binary in `main.rs`"]
#![doc = "wires them into an `HttpServer`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
