use serde::{Deserialize, Deserializer};

use crate::errors::ValidationError;
use crate::models::todo_model::{NewTodo, TodoPatch};

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoDTO {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Body of a partial update. The outer `Option` is "was the key sent", the
/// inner one "was it `null`".
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoDTO {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub completed: Option<Option<bool>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTodosQuery {
    pub completed: Option<bool>,
}

/// Only called when the key is present, so an explicit `null` becomes
/// `Some(None)` instead of collapsing into `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TryFrom<CreateTodoDTO> for NewTodo {
    type Error = ValidationError;

    fn try_from(dto: CreateTodoDTO) -> Result<Self, Self::Error> {
        NewTodo::new(
            dto.title.as_deref().unwrap_or_default(),
            dto.description.as_deref(),
            dto.completed.unwrap_or(false),
        )
    }
}

impl From<UpdateTodoDTO> for TodoPatch {
    /// `null` clears: an empty title (rejected later), an empty description,
    /// `completed = false`.
    fn from(dto: UpdateTodoDTO) -> Self {
        TodoPatch {
            title: dto.title.map(Option::unwrap_or_default),
            description: dto.description.map(Option::unwrap_or_default),
            completed: dto.completed.map(Option::unwrap_or_default),
        }
    }
}
