pub mod memory;
pub mod pg;

use crate::errors::StoreError;
use crate::models::todo_model::{NewTodo, Todo, TodoPatch};

pub use memory::MemoryTodoStore;
pub use pg::PgTodoStore;

/// Data access for todos.
///
/// Implementations are blocking; the HTTP layer runs them through
/// `web::block`. Every listing is ordered newest first.
pub trait TodoStore: Send + Sync {
    fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError>;

    fn find_all(&self) -> Result<Vec<Todo>, StoreError>;

    fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Todo, StoreError>;

    /// Fetch, apply and save. There is no version check, so two concurrent
    /// updates of one todo are last-write-wins.
    fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, StoreError>;

    /// Returns the removed todo
    fn delete_by_id(&self, id: &str) -> Result<Todo, StoreError>;

    fn delete_all(&self) -> Result<usize, StoreError>;

    fn delete_all_completed(&self) -> Result<usize, StoreError>;

    fn is_connected(&self) -> bool;
}

/// Parses a client supplied id, anything that is not a uuid is malformed.
pub fn parse_id(id: &str) -> Result<uuid::Uuid, StoreError> {
    Ok(uuid::Uuid::parse_str(id)?)
}
