//! Validated data access and list synchronization for todo records.
//!
//! # Overview
//! A todo goes UI → `MutationOrchestrator` → `TodoCommands` → validator →
//! `Gateway` → store. A successful mutation invalidates the single cached
//! list view and the next read refetches it in full.
//!
//! # Design
//! - `schema` checks raw JSON payloads and reports every violation at once.
//! - `gateway` is the only storage boundary; `SqliteGateway` is durable,
//!   `MemoryGateway` lives in process.
//! - `commands` composes the two and never checks that an id exists, so
//!   update and delete of a missing record are no-ops.
//! - `cache` and `orchestrator` hold all client-side state as explicit
//!   objects; there is no global.

pub mod cache;
pub mod commands;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod schema;
pub mod types;

pub use cache::{ListCache, RecordView, ViewState, TODOS_KEY};
pub use commands::TodoCommands;
pub use error::{CommandError, StorageError, ValidationFailure};
pub use gateway::{Gateway, MemoryGateway, SqliteGateway};
pub use orchestrator::{
    Mutation, MutationId, MutationKind, MutationOrchestrator, MutationRecord, MutationResult,
    MutationState, SETTLED_KEPT,
};
pub use schema::{validate_new, validate_patch};
pub use types::{NewTodo, Todo, TodoId, TodoPatch, TodoType};
