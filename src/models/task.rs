use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::Patch;

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// A task inside a todo.
///
/// `sort_order` is the 1-based display position among the live tasks of the same
/// (owner, todo) pair. Only the datastore assigns or changes it.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TodoTask {
    pub id: Uuid,
    pub todo_id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TodoTask {
    pub fn new(owner: Uuid, todo_id: Uuid, input: NewTask, sort_order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            todo_id,
            user_id: owner,
            name: input.name,
            description: input.description,
            completed: input.completed,
            due_date: input.due_date,
            sort_order,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Writes the present fields of `changes`. `sort_order` is left alone.
    pub fn apply(&mut self, changes: TaskChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        changes.due_date.apply_to_option(&mut self.due_date);
        self.updated_at = Utc::now();
    }
}

/// Body of `POST /todos/{todoId}/tasks`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub due_date: Option<NaiveDate>,
}

/// Validated input for a task insert.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

impl TryFrom<CreateTaskRequest> for NewTask {
    type Error = AppError;

    fn try_from(request: CreateTaskRequest) -> Result<Self, Self::Error> {
        request.validate()?;
        Ok(Self {
            name: request.name,
            description: request.description,
            completed: request.completed,
            due_date: request.due_date,
        })
    }
}

/// Body of `PATCH /todos/{todoId}/tasks/{taskId}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub completed: Patch<bool>,
    #[serde(default, deserialize_with = "deserialize_date_patch")]
    pub due_date: Patch<NaiveDate>,
}

/// The validated, non-empty set of fields a partial update writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    /// `Null` clears the due date.
    pub due_date: Patch<NaiveDate>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.due_date.is_missing()
    }
}

impl TryFrom<UpdateTaskRequest> for TaskChanges {
    type Error = AppError;

    fn try_from(request: UpdateTaskRequest) -> Result<Self, Self::Error> {
        let name = required("name", request.name)?;
        if let Some(name) = &name {
            if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
                return Err(AppError::invalid("name must be between 1 and 200 characters"));
            }
        }

        let description = required("description", request.description)?;
        if let Some(description) = &description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(AppError::invalid("description must be at most 1000 characters"));
            }
        }

        let changes = Self {
            name,
            description,
            completed: required("completed", request.completed)?,
            due_date: request.due_date,
        };
        if changes.is_empty() {
            return Err(AppError::invalid("nothing to update"));
        }
        Ok(changes)
    }
}

/// Non-nullable columns accept a value or nothing, never `null`.
fn required<T>(field: &str, patch: Patch<T>) -> Result<Option<T>, AppError> {
    match patch {
        Patch::Missing => Ok(None),
        Patch::Null => Err(AppError::invalid(format!("{} cannot be null", field))),
        Patch::Value(value) => Ok(Some(value)),
    }
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp (date part kept), `""` or `null`.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let raw = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| de::Error::custom(format!("invalid date {:?}, expected YYYY-MM-DD", raw)))
}

fn deserialize_date_patch<'de, D>(deserializer: D) -> Result<Patch<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match deserialize_date(deserializer)? {
        Some(date) => Patch::Value(date),
        None => Patch::Null,
    })
}
