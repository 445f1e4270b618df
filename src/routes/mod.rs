pub mod auth;
pub mod health;
pub mod tasks;
pub mod todos;

use actix_web::{error, web, HttpResponse};

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::state::AppState;

/// Registers every route together with the state and extractor configuration they need.
///
/// `/login`, `/logout` and `/health` are public; `/me` and everything under `/todos`
/// sit behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let gate = AuthMiddleware::new(state.tokens.clone());

    cfg.app_data(state)
        .app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(auth::login)
        .service(auth::logout)
        .service(web::scope("/me").wrap(gate.clone()).service(auth::me))
        .service(
            web::scope("/todos")
                .wrap(gate)
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .default_service(web::to(not_found));
}

async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}

/// Body extraction failures become the same `400` every other bad input gets.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req| {
        log::debug!("rejecting request body: {}", err);
        AppError::InvalidRequest(None).into()
    })
}

/// A path id that is not a UUID cannot name an existing resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req| {
        log::debug!("rejecting path: {}", err);
        AppError::NotFound.into()
    })
}
