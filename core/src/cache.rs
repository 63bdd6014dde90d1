//! The single client-side view of the todo collection.
//!
//! # Design
//! `TodoCache` owns one sorted `Vec<Todo>` behind an `Arc`; every change
//! swaps in a new `Arc` and hands it to subscribers, so a snapshot a caller
//! holds never changes underneath it. All mutations round-trip through the
//! `RemoteStore` first and only touch local state with what the server
//! confirmed.
//!
//! Responses can complete out of order. Full-collection loads (refresh and
//! reorder) take a ticket when issued and only the newest ticket may apply.
//! Single-entry patches (create, update, delete) remember the generation at
//! issue time; if a full load landed in between, the patch is dropped and the
//! cache reloads instead of guessing how the two combine.
//!
//! The state mutex is never held across an `.await` or while subscribers run.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::CacheOptions;
use crate::error::ApiError;
use crate::ordering::{is_dense, move_item, renumber, reorder_requests, sort_by_order};
use crate::remote::RemoteStore;
use crate::types::{CreateTodo, Snapshot, Todo, TodoId, UpdateTodo};

type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Observers {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

/// Handle returned by `TodoCache::subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

struct State {
    todos: Snapshot,
    /// Bumped whenever a full-collection load is applied.
    generation: u64,
    /// Ticket of the most recently issued full-collection load.
    latest_ticket: u64,
    reorders_in_flight: usize,
}

/// Releases the reorder slot even if the reorder future is dropped.
struct ReorderSlot<'a> {
    state: &'a Mutex<State>,
}

impl Drop for ReorderSlot<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.reorders_in_flight = state.reorders_in_flight.saturating_sub(1);
    }
}

pub struct TodoCache<S> {
    store: S,
    options: CacheOptions,
    state: Mutex<State>,
    observers: Arc<Mutex<Observers>>,
}

impl<S: RemoteStore> TodoCache<S> {
    /// An empty cache. Call `initialize` to load from the store.
    pub fn new(store: S) -> Self {
        Self::with_options(store, CacheOptions::default())
    }

    pub fn with_options(store: S, options: CacheOptions) -> Self {
        Self {
            store,
            options,
            state: Mutex::new(State {
                todos: Arc::new(Vec::new()),
                generation: 0,
                latest_ticket: 0,
                reorders_in_flight: 0,
            }),
            observers: Arc::new(Mutex::new(Observers::default())),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register `callback` to receive every published snapshot. The current
    /// snapshot is not replayed; read it with `snapshot()`.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let mut observers = self.observers.lock();
        observers.next_id += 1;
        let id = observers.next_id;
        observers.callbacks.push((id, Arc::new(callback)));
        Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().todos.clone()
    }

    pub fn find(&self, id: TodoId) -> Option<Todo> {
        self.state.lock().todos.iter().find(|t| t.id == id).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn len(&self) -> usize {
        self.state.lock().todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the collection. A failed load publishes an empty list rather
    /// than leaving subscribers without data; the error is only logged.
    pub async fn initialize(&self) -> Snapshot {
        let ticket = self.issue_ticket();
        let todos = match self.store.list().await {
            Ok(todos) => todos,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load todos, starting empty");
                Vec::new()
            }
        };
        let snapshot = keep_current(self.apply_full(ticket, todos), || self.snapshot());
        tracing::info!(count = snapshot.len(), "todo cache initialized");
        snapshot
    }

    /// Reload from the store. Like `initialize`, a failed load publishes an
    /// empty list; the error is also returned to the caller.
    pub async fn refresh(&self) -> Result<Snapshot, ApiError> {
        let ticket = self.issue_ticket();
        match self.store.list().await {
            Ok(todos) => Ok(keep_current(self.apply_full(ticket, todos), || self.snapshot())),
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed, publishing empty collection");
                let _ = self.apply_full(ticket, Vec::new());
                Err(err)
            }
        }
    }

    pub async fn create(&self, input: &CreateTodo) -> Result<Todo, ApiError> {
        let issued_at = self.generation();
        let created = self.store.create(input).await.map_err(|err| {
            tracing::warn!(error = %err, "create failed");
            err
        })?;

        let outcome = self.apply_patch(issued_at, |todos| {
            todos.retain(|t| t.id != created.id);
            todos.push(created.clone());
            sort_by_order(todos);
            // The server numbered it before any delete that landed since.
            renumber(todos);
            true
        });
        if outcome.is_err() {
            self.reconcile("create").await;
        }
        Ok(created)
    }

    /// Apply a partial update. An update that changes `order` moves the todo
    /// and renumbers the rest, matching what the server does. Any other
    /// update keeps the todo where it is locally.
    pub async fn update(&self, id: TodoId, input: &UpdateTodo) -> Result<Todo, ApiError> {
        let issued_at = self.generation();
        let updated = self.store.update(id, input).await.map_err(|err| {
            tracing::warn!(id, error = %err, "update failed");
            err
        })?;

        let outcome = self.apply_patch(issued_at, |todos| {
            let Some(index) = todos.iter().position(|t| t.id == updated.id) else {
                tracing::debug!(id, "updated todo is no longer cached, not re-adding it");
                return false;
            };
            if input.changes_order() {
                todos.remove(index);
                let target = (updated.order as usize).saturating_sub(1).min(todos.len());
                todos.insert(target, updated.clone());
                renumber(todos);
            } else {
                // The response's order predates any delete that landed since.
                let order = todos[index].order;
                todos[index] = Todo {
                    order,
                    ..updated.clone()
                };
            }
            true
        });
        if outcome.is_err() {
            self.reconcile("update").await;
        }
        Ok(updated)
    }

    /// Remove a todo once the server confirms the delete. Remaining entries
    /// are renumbered to close the gap.
    pub async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
        let issued_at = self.generation();
        self.store.delete(id).await.map_err(|err| {
            tracing::warn!(id, error = %err, "delete failed");
            err
        })?;

        let outcome = self.apply_patch(issued_at, |todos| {
            let before = todos.len();
            todos.retain(|t| t.id != id);
            if todos.len() == before {
                return false;
            }
            renumber(todos);
            true
        });
        if outcome.is_err() {
            self.reconcile("delete").await;
        }
        Ok(())
    }

    /// Move the todo at `from` to position `to` and persist the whole new
    /// order. The server's response replaces the collection; on failure the
    /// unchanged collection is republished so speculative views revert.
    pub async fn reorder_by_drag(&self, from: usize, to: usize) -> Result<Snapshot, ApiError> {
        if from == to {
            return Ok(self.snapshot());
        }

        let (requests, ticket, _slot) = {
            let mut state = self.state.lock();
            if state.reorders_in_flight > 0 && !self.options.allow_concurrent_reorders {
                tracing::debug!(from, to, "reorder rejected, another is in flight");
                return Err(ApiError::Busy);
            }
            let moved = move_item(state.todos.as_slice(), from, to).ok_or_else(|| {
                ApiError::InvalidArgument(format!(
                    "cannot move position {from} to {to} in a list of {}",
                    state.todos.len()
                ))
            })?;
            state.reorders_in_flight += 1;
            state.latest_ticket += 1;
            (
                reorder_requests(&moved),
                state.latest_ticket,
                ReorderSlot { state: &self.state },
            )
        };

        tracing::debug!(from, to, ticket, "sending reorder");
        match self.store.reorder(&requests).await {
            Ok(todos) => Ok(keep_current(self.apply_full(ticket, todos), || self.snapshot())),
            Err(err) => {
                tracing::warn!(from, to, error = %err, "reorder failed, restoring previous order");
                let current = self.snapshot();
                self.publish(&current);
                Err(err)
            }
        }
    }

    fn issue_ticket(&self) -> u64 {
        let mut state = self.state.lock();
        state.latest_ticket += 1;
        state.latest_ticket
    }

    /// Replace the collection with a full server listing, unless a newer
    /// full load has been issued since `ticket`.
    fn apply_full(&self, ticket: u64, mut todos: Vec<Todo>) -> Result<Snapshot, ApiError> {
        sort_by_order(&mut todos);
        if !is_dense(&todos) {
            tracing::warn!(count = todos.len(), "server returned a non-contiguous order");
        }

        let snapshot = {
            let mut state = self.state.lock();
            if ticket != state.latest_ticket {
                tracing::debug!(ticket, latest = state.latest_ticket, "discarding stale collection");
                return Err(ApiError::StaleResponse);
            }
            state.generation += 1;
            state.todos = Arc::new(todos);
            state.todos.clone()
        };
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Apply a single-entry change computed from a server response. `patch`
    /// returns false when there is nothing to change.
    fn apply_patch<F>(&self, issued_at: u64, patch: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut Vec<Todo>) -> bool,
    {
        let snapshot = {
            let mut state = self.state.lock();
            if state.generation != issued_at {
                return Err(ApiError::StaleResponse);
            }
            let mut todos = state.todos.as_ref().clone();
            if !patch(&mut todos) {
                return Ok(());
            }
            state.todos = Arc::new(todos);
            state.todos.clone()
        };
        self.publish(&snapshot);
        Ok(())
    }

    async fn reconcile(&self, operation: &'static str) {
        tracing::debug!(operation, "collection changed while in flight, reloading");
        if let Err(err) = self.refresh().await {
            tracing::warn!(operation, error = %err, "reload after stale response failed");
        }
    }

    fn publish(&self, snapshot: &Snapshot) {
        let callbacks: Vec<Callback> = self
            .observers
            .lock()
            .callbacks
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

/// A stale full load leaves the current collection in place.
fn keep_current(result: Result<Snapshot, ApiError>, current: impl FnOnce() -> Snapshot) -> Snapshot {
    match result {
        Ok(snapshot) => snapshot,
        Err(_) => current(),
    }
}
