//! Record types for the todo store.
//!
//! # Design
//! `Todo` is the stored shape; it is only ever produced by a gateway.
//! `NewTodo` and `TodoPatch` are what the validator hands to the command
//! layer. `TodoPatch` replaces spread-style merging: every field is optional
//! and only the present ones are applied.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned record identity.
pub type TodoId = i64;

/// Category of a todo. Storage defaults it to `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodoType {
    #[default]
    Active,
    Cultural,
    Restorative,
    Planning,
}

impl TodoType {
    pub const ALL: [TodoType; 4] = [
        TodoType::Active,
        TodoType::Cultural,
        TodoType::Restorative,
        TodoType::Planning,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TodoType::Active => "ACTIVE",
            TodoType::Cultural => "CULTURAL",
            TodoType::Restorative => "RESTORATIVE",
            TodoType::Planning => "PLANNING",
        }
    }
}

impl fmt::Display for TodoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names none of the four todo types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTodoType(pub String);

impl fmt::Display for UnknownTodoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown todo type: {}", self.0)
    }
}

impl std::error::Error for UnknownTodoType {}

impl FromStr for TodoType {
    type Err = UnknownTodoType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TodoType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTodoType(s.to_string()))
    }
}

/// A stored todo record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub todo_type: TodoType,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for an insert. Type and completion are left to storage
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: None,
            description: None,
        }
    }
}

/// Validated partial update. Only the fields that are `Some` are written;
/// omitted fields remain unchanged in storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo_type: Option<TodoType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Write the present fields onto `todo`. Timestamps are the caller's job.
    pub fn apply_to(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(summary) = &self.summary {
            todo.summary = Some(summary.clone());
        }
        if let Some(description) = &self.description {
            todo.description = Some(description.clone());
        }
        if let Some(todo_type) = self.todo_type {
            todo.todo_type = todo_type;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}
