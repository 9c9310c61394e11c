//! Pending/success/failure lifecycle around each mutation.
//!
//! # Design
//! Every create, update and delete is registered under a fresh `MutationId`
//! as `Pending` before it reaches the command layer. A success invalidates
//! the list cache and only then is recorded as `Success`, so anyone who
//! observes the success also observes the stale cache. A failure leaves the
//! cache alone. Mutations are neither queued nor de-duplicated; concurrent
//! ones each invalidate on their own success.
//!
//! Invalidation never fetches by itself. The consumer calls `read` (or
//! `refetch`) and gets the fresh list from storage.
//!
//! Each mutation hands back its `MutationId` with the result. The registry
//! keeps every pending record and at most `SETTLED_KEPT` settled ones. When
//! a mutation settles past the cap, the oldest other settled records go.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{ListCache, RecordView, ViewState};
use crate::commands::TodoCommands;
use crate::error::CommandError;
use crate::gateway::Gateway;
use crate::types::{Todo, TodoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(Uuid);

impl MutationId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update(TodoId),
    Delete(TodoId),
}

#[derive(Debug, Clone)]
pub enum MutationState {
    Pending,
    Success,
    Failure(Arc<CommandError>),
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationState::Success)
    }
}

#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub id: MutationId,
    pub kind: MutationKind,
    pub state: MutationState,
}

pub type MutationResult<T> = Result<T, Arc<CommandError>>;

/// Settled records retained for `mutation`/`mutations` lookups.
pub const SETTLED_KEPT: usize = 32;

/// A finished mutation: the id it was registered under and its result.
#[derive(Debug)]
pub struct Mutation<T> {
    pub id: MutationId,
    pub result: MutationResult<T>,
}

impl<T> Mutation<T> {
    pub fn into_result(self) -> MutationResult<T> {
        self.result
    }
}

#[derive(Debug)]
pub struct MutationOrchestrator<G> {
    commands: TodoCommands<G>,
    cache: Arc<ListCache>,
    mutations: Mutex<Vec<MutationRecord>>,
}

impl<G: Gateway> MutationOrchestrator<G> {
    pub fn new(commands: TodoCommands<G>) -> Self {
        Self::with_cache(commands, Arc::new(ListCache::new()))
    }

    /// Share an existing cache with whatever else composes reads.
    pub fn with_cache(commands: TodoCommands<G>, cache: Arc<ListCache>) -> Self {
        Self {
            commands,
            cache,
            mutations: Mutex::new(Vec::new()),
        }
    }

    pub fn cache(&self) -> Arc<ListCache> {
        Arc::clone(&self.cache)
    }

    pub fn commands(&self) -> &TodoCommands<G> {
        &self.commands
    }

    /// Current view without any I/O.
    pub fn peek(&self) -> ViewState {
        self.cache.state()
    }

    /// Cached list, refetched from storage when never loaded or invalidated.
    pub async fn read(&self) -> ViewState {
        if self.cache.needs_fetch() {
            return self.refetch().await;
        }
        self.cache.state()
    }

    /// Fetch the full list regardless of cache validity.
    pub async fn refetch(&self) -> ViewState {
        let ticket = self.cache.begin_fetch();
        let result = self.commands.list().await;
        self.cache.complete(ticket, result)
    }

    /// Resolve one record against the current list.
    pub async fn lookup(&self, id: TodoId) -> RecordView {
        RecordView::from_state(&self.read().await, id)
    }

    pub async fn create(&self, payload: &Value) -> Mutation<Todo> {
        self.run(MutationKind::Create, self.commands.create(payload))
            .await
    }

    pub async fn update(&self, id: TodoId, payload: &Value) -> Mutation<()> {
        self.run(MutationKind::Update(id), self.commands.update(id, payload))
            .await
    }

    /// Completion toggle from the list view.
    pub async fn set_completed(&self, id: TodoId, completed: bool) -> Mutation<()> {
        self.update(id, &json!({ "completed": completed })).await
    }

    pub async fn delete(&self, id: TodoId) -> Mutation<()> {
        let delete = async move { self.commands.delete(id).await.map_err(CommandError::from) };
        self.run(MutationKind::Delete(id), delete).await
    }

    pub fn is_pending(&self) -> bool {
        self.registry().iter().any(|m| m.state.is_pending())
    }

    pub fn mutation(&self, id: MutationId) -> Option<MutationRecord> {
        self.registry().iter().find(|m| m.id == id).cloned()
    }

    /// Every tracked mutation, oldest first. Bounded by `SETTLED_KEPT` plus
    /// whatever is still pending.
    pub fn mutations(&self) -> Vec<MutationRecord> {
        self.registry().clone()
    }

    /// Forget mutations that are no longer pending.
    pub fn clear_settled(&self) {
        self.registry().retain(|m| m.state.is_pending());
    }

    async fn run<T>(
        &self,
        kind: MutationKind,
        command: impl Future<Output = Result<T, CommandError>>,
    ) -> Mutation<T> {
        let id = MutationId::new();
        self.registry().push(MutationRecord {
            id,
            kind,
            state: MutationState::Pending,
        });
        debug!(%id, ?kind, "mutation pending");

        match command.await {
            Ok(value) => {
                self.cache.invalidate();
                self.settle(id, MutationState::Success);
                debug!(%id, "mutation succeeded, list invalidated");
                Mutation { id, result: Ok(value) }
            }
            Err(error) => {
                let error = Arc::new(error);
                self.settle(id, MutationState::Failure(Arc::clone(&error)));
                debug!(%id, %error, "mutation failed");
                Mutation { id, result: Err(error) }
            }
        }
    }

    fn settle(&self, id: MutationId, state: MutationState) {
        let mut registry = self.registry();
        if let Some(record) = registry.iter_mut().find(|m| m.id == id) {
            record.state = state;
        }
        let settled = registry.iter().filter(|m| !m.state.is_pending()).count();
        let mut excess = settled.saturating_sub(SETTLED_KEPT);
        // Oldest first, never the record that just settled.
        registry.retain(|m| {
            if excess > 0 && m.id != id && !m.state.is_pending() {
                excess -= 1;
                return false;
            }
            true
        });
    }

    fn registry(&self) -> MutexGuard<'_, Vec<MutationRecord>> {
        self.mutations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
