use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUserId;
use crate::error::AppError;
use crate::models::CreateTodoRequest;
use crate::state::AppState;

/// Lists the caller's todos, oldest first.
#[get("")]
pub async fn list_todos(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let todos = state.todos.list_todos(user_id.0).await?;
    Ok(HttpResponse::Ok().json(todos))
}

/// Fetches one todo. Someone else's todo is reported as `404`, same as a missing one.
#[get("/{todo_id}")]
pub async fn get_todo(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let todo = state
        .todos
        .get_todo(user_id.0, todo_id.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("")]
pub async fn create_todo(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    todo_data: web::Json<CreateTodoRequest>,
) -> Result<HttpResponse, AppError> {
    todo_data.validate()?;
    let todo = state.todos.create_todo(user_id.0, &todo_data.name).await?;
    Ok(HttpResponse::Created().json(todo))
}
