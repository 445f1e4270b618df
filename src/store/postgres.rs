use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{NewTask, Patch, TaskChanges, Todo, TodoTask, User};
use crate::store::{TaskStore, TodoStore, UserStore};

const USER_COLUMNS: &str = "id, username, password, created_at, updated_at, deleted_at";
const TODO_COLUMNS: &str = "id, name, user_id, created_at, updated_at, deleted_at";
const TASK_COLUMNS: &str = "id, todo_id, user_id, name, description, completed, due_date, \
                            sort_order, created_at, updated_at, deleted_at";

/// Opens a pool whose connections abort any statement running longer than the
/// configured timeout.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let options = PgConnectOptions::from_str(&config.url)?
        .options([("statement_timeout", config.timeout.as_millis().to_string())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres implementation of all datastore capabilities.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::invalid("username already taken"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at, id",
            TODO_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn get_todo(&self, owner: Uuid, todo_id: Uuid) -> Result<Option<Todo>, AppError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE user_id = $1 AND id = $2 AND deleted_at IS NULL",
            TODO_COLUMNS
        ))
        .bind(owner)
        .bind(todo_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn create_todo(&self, owner: Uuid, name: &str) -> Result<Todo, AppError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, name, user_id) VALUES ($1, $2, $3) RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(todo)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, owner: Uuid, todo_id: Uuid) -> Result<Vec<TodoTask>, AppError> {
        let tasks = sqlx::query_as::<_, TodoTask>(&format!(
            "SELECT {} FROM todo_tasks \
             WHERE user_id = $1 AND todo_id = $2 AND deleted_at IS NULL \
             ORDER BY sort_order",
            TASK_COLUMNS
        ))
        .bind(owner)
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    async fn get_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<TodoTask>, AppError> {
        let task = sqlx::query_as::<_, TodoTask>(&format!(
            "SELECT {} FROM todo_tasks \
             WHERE user_id = $1 AND todo_id = $2 AND id = $3 AND deleted_at IS NULL",
            TASK_COLUMNS
        ))
        .bind(owner)
        .bind(todo_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn create_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task: NewTask,
    ) -> Result<Option<TodoTask>, AppError> {
        let mut tx = self.pool.begin().await?;

        // The parent row lock orders concurrent creates and deletes on the same todo.
        let parent = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM todos WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(todo_id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;
        if parent.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let created = sqlx::query_as::<_, TodoTask>(&format!(
            "INSERT INTO todo_tasks \
                 (id, todo_id, user_id, name, description, completed, due_date, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, ( \
                 SELECT COALESCE(MAX(sort_order), 0) + 1 FROM todo_tasks \
                 WHERE user_id = $3 AND todo_id = $2 AND deleted_at IS NULL \
             )) \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(todo_id)
        .bind(owner)
        .bind(task.name)
        .bind(task.description)
        .bind(task.completed)
        .bind(task.due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn update_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TodoTask>, AppError> {
        if changes.is_empty() {
            return Err(AppError::invalid("nothing to update"));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE todo_tasks SET updated_at = NOW()");
        if let Some(name) = changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(completed) = changes.completed {
            builder.push(", completed = ").push_bind(completed);
        }
        match changes.due_date {
            Patch::Missing => {}
            Patch::Null => {
                builder.push(", due_date = NULL");
            }
            Patch::Value(due_date) => {
                builder.push(", due_date = ").push_bind(due_date);
            }
        }
        builder
            .push(" WHERE user_id = ")
            .push_bind(owner)
            .push(" AND todo_id = ")
            .push_bind(todo_id)
            .push(" AND id = ")
            .push_bind(task_id)
            .push(" AND deleted_at IS NULL RETURNING ")
            .push(TASK_COLUMNS);

        let task = builder
            .build_query_as::<TodoTask>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, owner: Uuid, todo_id: Uuid, task_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM todos WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(todo_id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?;

        let deleted_order = sqlx::query_scalar::<_, i32>(
            "UPDATE todo_tasks SET deleted_at = NOW(), updated_at = NOW() \
             WHERE user_id = $1 AND todo_id = $2 AND id = $3 AND deleted_at IS NULL \
             RETURNING sort_order",
        )
        .bind(owner)
        .bind(todo_id)
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await?;

        let deleted_order = match deleted_order {
            Some(order) => order,
            None => {
                tx.commit().await?;
                return Ok(false);
            }
        };

        sqlx::query(
            "UPDATE todo_tasks SET sort_order = sort_order - 1, updated_at = NOW() \
             WHERE user_id = $1 AND todo_id = $2 AND deleted_at IS NULL AND sort_order > $3",
        )
        .bind(owner)
        .bind(todo_id)
        .bind(deleted_order)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
