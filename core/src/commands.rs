//! The four commands exposed to the UI layer.
//!
//! # Design
//! `TodoCommands` holds only a gateway and carries no state between calls.
//! Mutations validate first and return `ValidationFailure` without touching
//! storage; a `StorageError` from the gateway is passed through as-is.
//! Existence of an id is never checked, so update and delete of a missing
//! record succeed as no-ops.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CommandError, StorageError};
use crate::gateway::Gateway;
use crate::schema::{validate_new, validate_patch};
use crate::types::{Todo, TodoId};

#[derive(Debug, Clone)]
pub struct TodoCommands<G> {
    gateway: G,
}

impl<G: Gateway> TodoCommands<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Full record set, newest-created first.
    pub async fn list(&self) -> Result<Vec<Todo>, StorageError> {
        let todos = self.gateway.list().await.inspect_err(log_storage("list"))?;
        debug!(count = todos.len(), "listed todos");
        Ok(todos)
    }

    pub async fn create(&self, payload: &Value) -> Result<Todo, CommandError> {
        let fields = validate_new(payload).inspect_err(|failure| {
            debug!(%failure, "create rejected");
        })?;
        let todo = self
            .gateway
            .insert(fields)
            .await
            .inspect_err(log_storage("create"))?;
        info!(id = todo.id, "todo created");
        Ok(todo)
    }

    /// Apply the fields present in `payload`; everything else is left alone.
    pub async fn update(&self, id: TodoId, payload: &Value) -> Result<(), CommandError> {
        let patch = validate_patch(payload).inspect_err(|failure| {
            debug!(id, %failure, "update rejected");
        })?;
        self.gateway
            .update(id, patch)
            .await
            .inspect_err(log_storage("update"))?;
        info!(id, "todo updated");
        Ok(())
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), StorageError> {
        self.gateway
            .delete(id)
            .await
            .inspect_err(log_storage("delete"))?;
        info!(id, "todo deleted");
        Ok(())
    }
}

fn log_storage(command: &'static str) -> impl Fn(&StorageError) {
    move |error: &StorageError| warn!(command, %error, "storage failure")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::types::TodoType;

    fn commands() -> TodoCommands<MemoryGateway> {
        TodoCommands::new(MemoryGateway::new())
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let commands = commands();
        let created = commands
            .create(&json!({"title": "Buy groceries", "summary": "Weekly shop"}))
            .await
            .unwrap();

        let todos = commands.list().await.unwrap();
        assert_eq!(todos, vec![created.clone()]);
        assert_eq!(created.summary.as_deref(), Some("Weekly shop"));
        assert_eq!(created.todo_type, TodoType::Active);
        assert!(!created.completed);
    }

    #[tokio::test]
    async fn create_ignores_type_and_completion_and_uses_defaults() {
        let commands = commands();
        let created = commands
            .create(&json!({"title": "Museum visit", "todoType": "CULTURAL", "completed": true}))
            .await
            .unwrap();
        assert_eq!(created.todo_type, TodoType::Active);
        assert!(!created.completed);
    }

    #[tokio::test]
    async fn invalid_create_is_a_validation_failure() {
        let commands = commands();
        let err = commands.create(&json!({"title": "ab"})).await.unwrap_err();
        let failure = err.as_validation().unwrap();
        assert_eq!(failure.messages("title"), ["Title must be at least 5 characters."]);
        assert!(commands.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_id_is_ok() {
        let commands = commands();
        commands.update(404, &json!({"completed": true})).await.unwrap();
    }

    #[tokio::test]
    async fn delete_twice_is_ok() {
        let commands = commands();
        let created = commands.create(&json!({"title": "Buy groceries"})).await.unwrap();
        commands.delete(created.id).await.unwrap();
        commands.delete(created.id).await.unwrap();
        assert!(commands.list().await.unwrap().is_empty());
    }
}
