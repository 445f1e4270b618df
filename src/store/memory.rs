use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTask, TaskChanges, Todo, TodoTask, User};
use crate::store::{TaskStore, TodoStore, UserStore};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    todos: Vec<Todo>,
    tasks: Vec<TodoTask>,
}

impl Tables {
    fn owns_live_todo(&self, owner: Uuid, todo_id: Uuid) -> bool {
        self.todos
            .iter()
            .any(|todo| todo.id == todo_id && todo.user_id == owner && todo.deleted_at.is_none())
    }

    fn live_tasks(&self, owner: Uuid, todo_id: Uuid) -> impl Iterator<Item = &TodoTask> {
        self.tasks.iter().filter(move |task| {
            task.user_id == owner && task.todo_id == todo_id && task.deleted_at.is_none()
        })
    }

    fn live_tasks_mut(&mut self, owner: Uuid, todo_id: Uuid) -> impl Iterator<Item = &mut TodoTask> {
        self.tasks.iter_mut().filter(move |task| {
            task.user_id == owner && task.todo_id == todo_id && task.deleted_at.is_none()
        })
    }
}

/// In-process datastore with the same semantics as `PgStore`.
///
/// A single lock guards all tables, so every operation is atomic. `set_unavailable`
/// makes every call fail with an internal error.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::internal("memory store marked unavailable"));
        }
        Ok(())
    }

    /// All task rows of a todo, soft-deleted ones included.
    pub async fn raw_tasks(&self, todo_id: Uuid) -> Vec<TodoTask> {
        let tables = self.tables.read().await;
        let tasks = tables
            .tasks
            .iter()
            .filter(|task| task.todo_id == todo_id)
            .cloned()
            .collect();
        tasks
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let user = tables
            .users
            .iter()
            .find(|user| user.username == username && user.deleted_at.is_none())
            .cloned();
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let user = tables
            .users
            .iter()
            .find(|user| user.id == user_id && user.deleted_at.is_none())
            .cloned();
        Ok(user)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|user| user.username == username && user.deleted_at.is_none())
        {
            return Err(AppError::invalid("username already taken"));
        }
        let user = User::new(username, password_hash);
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list_todos(&self, owner: Uuid) -> Result<Vec<Todo>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut todos: Vec<Todo> = tables
            .todos
            .iter()
            .filter(|todo| todo.user_id == owner && todo.deleted_at.is_none())
            .cloned()
            .collect();
        todos.sort_by_key(|todo| todo.created_at);
        Ok(todos)
    }

    async fn get_todo(&self, owner: Uuid, todo_id: Uuid) -> Result<Option<Todo>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let todo = tables
            .todos
            .iter()
            .find(|todo| todo.id == todo_id && todo.user_id == owner && todo.deleted_at.is_none())
            .cloned();
        Ok(todo)
    }

    async fn create_todo(&self, owner: Uuid, name: &str) -> Result<Todo, AppError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let todo = Todo::new(owner, name);
        tables.todos.push(todo.clone());
        Ok(todo)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, owner: Uuid, todo_id: Uuid) -> Result<Vec<TodoTask>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut tasks: Vec<TodoTask> = tables.live_tasks(owner, todo_id).cloned().collect();
        tasks.sort_by_key(|task| task.sort_order);
        Ok(tasks)
    }

    async fn get_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<TodoTask>, AppError> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let task = tables
            .live_tasks(owner, todo_id)
            .find(|task| task.id == task_id)
            .cloned();
        Ok(task)
    }

    async fn create_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task: NewTask,
    ) -> Result<Option<TodoTask>, AppError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if !tables.owns_live_todo(owner, todo_id) {
            return Ok(None);
        }
        let next = tables
            .live_tasks(owner, todo_id)
            .map(|task| task.sort_order)
            .max()
            .unwrap_or(0)
            + 1;
        let task = TodoTask::new(owner, todo_id, task, next);
        tables.tasks.push(task.clone());
        Ok(Some(task))
    }

    async fn update_task(
        &self,
        owner: Uuid,
        todo_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<TodoTask>, AppError> {
        self.check_available()?;
        if changes.is_empty() {
            return Err(AppError::invalid("nothing to update"));
        }
        let mut tables = self.tables.write().await;
        let task = tables.live_tasks_mut(owner, todo_id).find(|task| task.id == task_id);
        Ok(task.map(|task| {
            task.apply(changes);
            task.clone()
        }))
    }

    async fn delete_task(&self, owner: Uuid, todo_id: Uuid, task_id: Uuid) -> Result<bool, AppError> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let deleted_order = match tables.live_tasks_mut(owner, todo_id).find(|task| task.id == task_id) {
            Some(task) => {
                task.deleted_at = Some(now);
                task.updated_at = now;
                task.sort_order
            }
            None => return Ok(false),
        };

        for task in tables.live_tasks_mut(owner, todo_id) {
            if task.sort_order > deleted_order {
                task.sort_order -= 1;
                task.updated_at = now;
            }
        }
        Ok(true)
    }
}
