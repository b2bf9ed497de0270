use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{parse_id, TodoStore};
use crate::errors::StoreError;
use crate::models::todo_model::{sort_newest_first, NewTodo, Todo, TodoPatch};

/// Process local store, for tests and `--in-memory` runs
#[derive(Default)]
pub struct MemoryTodoStore {
    todos: RwLock<HashMap<uuid::Uuid, Todo>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<uuid::Uuid, Todo>>, StoreError> {
        self.todos
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<uuid::Uuid, Todo>>, StoreError> {
        self.todos
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn collect<F>(&self, filter: F) -> Result<Vec<Todo>, StoreError>
    where
        F: Fn(&Todo) -> bool,
    {
        let mut list: Vec<Todo> = self.read()?.values().filter(|t| filter(t)).cloned().collect();

        sort_newest_first(&mut list);

        Ok(list)
    }

    fn remove_where<F>(&self, filter: F) -> Result<usize, StoreError>
    where
        F: Fn(&Todo) -> bool,
    {
        let mut todos = self.write()?;
        let before = todos.len();

        todos.retain(|_, todo| !filter(todo));

        Ok(before - todos.len())
    }
}

impl TodoStore for MemoryTodoStore {
    fn create(&self, new_todo: NewTodo) -> Result<Todo, StoreError> {
        let todo = Todo::from_new(new_todo);

        let mut todos = self.write()?;

        if todos.contains_key(&todo.id) {
            return Err(StoreError::DuplicateKey(todo.id.to_string()));
        }

        todos.insert(todo.id, todo.clone());

        Ok(todo)
    }

    fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        self.collect(|_| true)
    }

    fn find_by_completed(&self, completed: bool) -> Result<Vec<Todo>, StoreError> {
        self.collect(|todo| todo.completed == completed)
    }

    fn find_by_id(&self, id: &str) -> Result<Todo, StoreError> {
        let uid = parse_id(id)?;

        self.read()?.get(&uid).cloned().ok_or(StoreError::NotFound)
    }

    fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, StoreError> {
        let mut todo = self.find_by_id(id)?;

        todo.apply(patch)?;

        // The lock is dropped between the read and this write, same window as
        // the database backend.
        match self.write()?.get_mut(&todo.id) {
            Some(stored) => {
                *stored = todo.clone();
                Ok(todo)
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn delete_by_id(&self, id: &str) -> Result<Todo, StoreError> {
        let uid = parse_id(id)?;

        self.write()?.remove(&uid).ok_or(StoreError::NotFound)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        self.remove_where(|_| true)
    }

    fn delete_all_completed(&self) -> Result<usize, StoreError> {
        self.remove_where(|todo| todo.completed)
    }

    fn is_connected(&self) -> bool {
        true
    }
}
