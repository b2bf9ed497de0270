use crate::errors::ValidationError;
use crate::schema::*;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// A stored todo, exactly as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Insertable, Queryable)]
#[serde(rename_all = "camelCase")]
#[table_name = "todos"]
pub struct Todo {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a todo that does not exist yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    title: String,
    description: String,
    completed: bool,
}

/// Field replacements for an existing todo. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Current time at the precision the database keeps (microseconds), so a
/// record handed back after a write equals the one read later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn checked_title(raw: &str, blank: ValidationError) -> Result<String, ValidationError> {
    let title = raw.trim();

    if title.is_empty() {
        return Err(blank);
    }

    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong);
    }

    Ok(title.to_string())
}

fn checked_description(raw: &str) -> Result<String, ValidationError> {
    let description = raw.trim();

    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::DescriptionTooLong);
    }

    Ok(description.to_string())
}

impl NewTodo {
    pub fn new(
        title: &str,
        description: Option<&str>,
        completed: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: checked_title(title, ValidationError::TitleRequired)?,
            description: checked_description(description.unwrap_or_default())?,
            completed,
        })
    }
}

impl Todo {
    /// Assigns the id and both timestamps; `created_at == updated_at`.
    pub fn from_new(new_todo: NewTodo) -> Self {
        let created_at = now();

        Self {
            id: uuid::Uuid::new_v4(),
            title: new_todo.title,
            description: new_todo.description,
            completed: new_todo.completed,
            created_at,
            updated_at: created_at,
        }
    }

    /// Applies every field present in `patch`. Nothing is changed when any
    /// field is invalid.
    pub fn apply(&mut self, patch: &TodoPatch) -> Result<(), ValidationError> {
        let title = patch
            .title
            .as_deref()
            .map(|t| checked_title(t, ValidationError::TitleEmpty))
            .transpose()?;

        let description = patch
            .description
            .as_deref()
            .map(checked_description)
            .transpose()?;

        if let Some(title) = title {
            self.title = title;
        }

        if let Some(description) = description {
            self.description = description;
        }

        if let Some(completed) = patch.completed {
            self.completed = completed;
        }

        self.touch();

        Ok(())
    }

    /// Moves `updated_at` forward, by one microsecond if the clock has not.
    fn touch(&mut self) {
        let now = now();

        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

/// Newest first, the order every listing uses
pub fn sort_newest_first(list: &mut [Todo]) {
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
