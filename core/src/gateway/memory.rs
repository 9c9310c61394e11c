use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::Gateway;
use crate::error::StorageError;
use crate::types::{NewTodo, Todo, TodoId, TodoPatch, TodoType};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<TodoId, Todo>,
    last_id: TodoId,
    last_created_at: DateTime<Utc>,
}

/// In-process store. Clones share the same table.
///
/// Ids come from a counter that only moves forward, so a deleted id is never
/// handed out again. Listing is newest id first; `created_at` is clamped so
/// it never runs behind an earlier insert even if the wall clock does.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    table: Arc<RwLock<Table>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Gateway for MemoryGateway {
    async fn list(&self) -> Result<Vec<Todo>, StorageError> {
        let table = self.table.read().await;
        Ok(table.rows.values().rev().cloned().collect())
    }

    async fn insert(&self, fields: NewTodo) -> Result<Todo, StorageError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let now = Utc::now().max(table.last_created_at);
        table.last_created_at = now;
        let todo = Todo {
            id: table.last_id,
            title: fields.title,
            summary: fields.summary,
            description: fields.description,
            todo_type: TodoType::default(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(todo.id, todo.clone());
        debug!(id = todo.id, "memory insert");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<(), StorageError> {
        let mut table = self.table.write().await;
        let Some(todo) = table.rows.get_mut(&id) else {
            debug!(id, "memory update matched no row");
            return Ok(());
        };
        patch.apply_to(todo);
        todo.updated_at = Utc::now().max(todo.updated_at);
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<(), StorageError> {
        let removed = self.table.write().await.rows.remove(&id).is_some();
        debug!(id, removed, "memory delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_applies_storage_defaults() {
        let gateway = MemoryGateway::new();
        let todo = gateway.insert(NewTodo::new("Buy groceries")).await.unwrap();
        assert_eq!(todo.id, 1);
        assert_eq!(todo.todo_type, TodoType::Active);
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let gateway = MemoryGateway::new();
        for title in ["first todo", "second todo", "third todo"] {
            gateway.insert(NewTodo::new(title)).await.unwrap();
        }
        let titles: Vec<String> = gateway.list().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["third todo", "second todo", "first todo"]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let gateway = MemoryGateway::new();
        let first = gateway.insert(NewTodo::new("first todo")).await.unwrap();
        gateway.delete(first.id).await.unwrap();
        let second = gateway.insert(NewTodo::new("second todo")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_id_are_no_ops() {
        let gateway = MemoryGateway::new();
        gateway.update(99, TodoPatch::completed(true)).await.unwrap();
        gateway.delete(99).await.unwrap();
        assert!(gateway.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_the_table() {
        let gateway = MemoryGateway::new();
        let other = gateway.clone();
        gateway.insert(NewTodo::new("shared todo")).await.unwrap();
        assert_eq!(other.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn order_and_timestamps_survive_a_clock_step_back() {
        let gateway = MemoryGateway::new();
        let ahead = Utc::now() + chrono::Duration::days(1);
        gateway.table.write().await.last_created_at = ahead;

        let first = gateway.insert(NewTodo::new("first todo")).await.unwrap();
        let second = gateway.insert(NewTodo::new("second todo")).await.unwrap();
        assert!(first.created_at >= ahead);
        assert!(second.created_at >= first.created_at);

        // A row whose timestamp went backwards still lists by insertion.
        gateway.table.write().await.rows.get_mut(&second.id).unwrap().created_at =
            DateTime::<Utc>::default();
        let titles: Vec<String> = gateway.list().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, ["second todo", "first todo"]);
    }
}
