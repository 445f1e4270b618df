pub mod patch;
pub mod task;
pub mod todo;
pub mod user;

pub use patch::Patch;
pub use task::{CreateTaskRequest, NewTask, TaskChanges, TodoTask, UpdateTaskRequest};
pub use todo::{CreateTodoRequest, Todo};
pub use user::User;
