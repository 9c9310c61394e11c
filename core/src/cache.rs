//! Single-slot cache for the todo list view.
//!
//! # Design
//! There is exactly one collection view, so there is exactly one slot, under
//! a constant key. A successful mutation invalidates the whole slot; nothing
//! patches cached rows in place. The next read refetches the full set.
//!
//! Every fetch gets a ticket carrying a sequence number and the invalidation
//! epoch it started in. A result older than one already applied is dropped.
//! A result from a fetch that started before the latest invalidation is
//! stored but leaves the slot invalid, so the next read goes back to storage.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;
use crate::types::{Todo, TodoId};

/// Key of the only cached view.
pub const TODOS_KEY: &str = "todos";

/// What a reader of the list view currently sees.
#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Loading,
    Ready(Arc<Vec<Todo>>),
    Error(Arc<StorageError>),
}

impl ViewState {
    pub fn todos(&self) -> Option<&[Todo]> {
        match self {
            ViewState::Ready(todos) => Some(todos.as_slice()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// Result of looking up one record in the list view. A missing id is a
/// display state, not an error.
#[derive(Debug, Clone)]
pub enum RecordView {
    Loading,
    Failed(Arc<StorageError>),
    NotFound,
    Found(Todo),
}

impl RecordView {
    pub fn from_state(state: &ViewState, id: TodoId) -> Self {
        match state {
            ViewState::Idle | ViewState::Loading => RecordView::Loading,
            ViewState::Error(cause) => RecordView::Failed(Arc::clone(cause)),
            ViewState::Ready(todos) => todos
                .iter()
                .find(|todo| todo.id == id)
                .cloned()
                .map_or(RecordView::NotFound, RecordView::Found),
        }
    }
}

/// Handed out by `begin_fetch` and returned with the fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    epoch: u64,
}

#[derive(Debug)]
struct Slot {
    state: ViewState,
    invalid: bool,
    epoch: u64,
    issued: u64,
    applied: u64,
}

#[derive(Debug)]
pub struct ListCache {
    slot: Mutex<Slot>,
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ListCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                state: ViewState::Idle,
                invalid: false,
                epoch: 0,
                issued: 0,
                applied: 0,
            }),
        }
    }

    pub fn key(&self) -> &'static str {
        TODOS_KEY
    }

    pub fn state(&self) -> ViewState {
        self.slot().state.clone()
    }

    pub fn is_invalid(&self) -> bool {
        self.slot().invalid
    }

    /// True when a read must go to storage: never loaded, invalidated, or
    /// not holding data.
    pub fn needs_fetch(&self) -> bool {
        let slot = self.slot();
        slot.invalid || !matches!(slot.state, ViewState::Ready(_))
    }

    /// Mark the cached list stale. The data stays visible until the next
    /// fetch replaces it.
    pub fn invalidate(&self) {
        let mut slot = self.slot();
        slot.invalid = true;
        slot.epoch += 1;
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        let mut slot = self.slot();
        slot.issued += 1;
        slot.state = ViewState::Loading;
        FetchTicket {
            seq: slot.issued,
            epoch: slot.epoch,
        }
    }

    /// Store a fetch result unless a newer one has already landed. Returns
    /// the state after the call.
    pub fn complete(&self, ticket: FetchTicket, result: Result<Vec<Todo>, StorageError>) -> ViewState {
        let mut slot = self.slot();
        if ticket.seq < slot.applied {
            return slot.state.clone();
        }
        slot.applied = ticket.seq;
        match result {
            Ok(todos) => {
                slot.state = ViewState::Ready(Arc::new(todos));
                slot.invalid = ticket.epoch != slot.epoch;
            }
            Err(error) => {
                slot.state = ViewState::Error(Arc::new(error));
                slot.invalid = true;
            }
        }
        slot.state.clone()
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
