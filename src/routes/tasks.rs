use actix_web::{delete, get, patch, post, web, HttpResponse};
use uuid::Uuid;

use crate::auth::AuthenticatedUserId;
use crate::error::AppError;
use crate::models::{CreateTaskRequest, NewTask, TaskChanges, UpdateTaskRequest};
use crate::state::AppState;

/// Lists the live tasks of a todo ordered by `sortOrder`.
///
/// A todo the caller does not own simply has no tasks.
#[get("/{todo_id}/tasks")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let tasks = state.tasks.list_tasks(user_id.0, todo_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Appends a task to the end of a todo.
///
/// ## Responses:
/// - `201 Created`: the new task, with `sortOrder` one past the current last task.
/// - `400 Bad Request`: malformed body, empty name, or a field over its length limit.
/// - `404 Not Found`: the todo does not exist or belongs to someone else.
#[post("/{todo_id}/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    todo_id: web::Path<Uuid>,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    let new_task = NewTask::try_from(task_data.into_inner())?;
    let task = state
        .tasks
        .create_task(user_id.0, todo_id.into_inner(), new_task)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Created().json(task))
}

/// Partially updates a task.
///
/// Only the fields present in the body are written. `dueDate: null` clears the due date;
/// `null` for any other field is rejected. A body with no fields is a `400`.
#[patch("/{todo_id}/tasks/{task_id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    path: web::Path<(Uuid, Uuid)>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, AppError> {
    let (todo_id, task_id) = path.into_inner();
    let changes = TaskChanges::try_from(task_data.into_inner())?;
    let task = state
        .tasks
        .update_task(user_id.0, todo_id, task_id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task and shifts the ones after it up by one.
///
/// Always `204`; deleting a task that is already gone is not an error.
#[delete("/{todo_id}/tasks/{task_id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user_id: AuthenticatedUserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (todo_id, task_id) = path.into_inner();
    let deleted = state.tasks.delete_task(user_id.0, todo_id, task_id).await?;
    if !deleted {
        log::debug!("task {} of todo {} was already gone", task_id, todo_id);
    }
    Ok(HttpResponse::NoContent().finish())
}
