//! Persistence gateway: the only code that touches durable storage.
//!
//! # Design
//! Gateways trust their caller. Input has already been validated by the
//! command layer, so nothing here re-checks field constraints. Update and
//! delete against an id that does not exist succeed without doing anything;
//! existence is never verified before writing.
//!
//! Methods return `Send` futures so a gateway can sit behind axum handlers
//! and be shared across tasks.

use std::future::Future;

use crate::error::StorageError;
use crate::types::{NewTodo, Todo, TodoId, TodoPatch};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

pub trait Gateway: Send + Sync {
    /// Every stored record, newest-created first.
    fn list(&self) -> impl Future<Output = Result<Vec<Todo>, StorageError>> + Send;

    /// Store a record, assigning id, timestamps and defaults.
    fn insert(&self, fields: NewTodo) -> impl Future<Output = Result<Todo, StorageError>> + Send;

    /// Write the present fields of `patch` and refresh `updated_at`.
    /// A missing id is a no-op.
    fn update(
        &self,
        id: TodoId,
        patch: TodoPatch,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove a record. A missing id is a no-op.
    fn delete(&self, id: TodoId) -> impl Future<Output = Result<(), StorageError>> + Send;
}
