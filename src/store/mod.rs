//! Datastore capabilities, one trait per resource.
//!
//! Every todo and task operation takes the authenticated owner id and filters on it, so
//! a lookup of somebody else's resource looks exactly like a missing one. Soft-deleted
//! rows are invisible to every method.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, TaskChanges, Todo, TodoTask, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Inserts a user with an already hashed password.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError>;

    async fn get_todo(&self, owner: Uuid, todo_id: Uuid) -> Result<Option<Todo>, AppError>;

    async fn create_todo(&self, owner: Uuid, name: &str) -> Result<Todo, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Live tasks of the todo, ordered by `sort_order`.
    async fn list_tasks(&self, owner: Uuid, todo_id: Uuid) -> Result<Vec<TodoTask>, AppError>;

    async fn get_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<TodoTask>, AppError>;

    /// Appends a task at position `max + 1` (1 for an empty todo) atomically.
    ///
    /// `Ok(None)` when the todo is not a live todo of `owner`.
    async fn create_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task: NewTask,
    ) -> Result<Option<TodoTask>, AppError>;

    /// Writes only the fields present in `changes`; `sort_order` is never touched.
    ///
    /// `Ok(None)` when no such live task exists for `owner`.
    async fn update_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TodoTask>, AppError>;

    /// Soft-deletes the task and closes the gap it leaves, as one atomic step.
    ///
    /// Returns whether a task was deleted; deleting a missing task is not an error.
    async fn delete_task(&self, owner: Uuid, todo_id: Uuid, task_id: Uuid) -> Result<bool, AppError>;
}
