//! Keyed async resources
//!
//! A [`Resource`] holds one fetched collection for one page. Each fetch is
//! started under a generation number; only the most recently started fetch
//! may commit. A response that arrives after its key changed, after a newer
//! refresh started, or after the page was torn down is dropped on arrival.
//!
//! ```text
//! idle ──set_key──▶ loading ──commit──▶ loaded | error
//!                      ▲                    │
//!                      └──refresh/set_key───┘
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::api::ApiError;

/// Lifecycle of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What a page renders from
///
/// `data` is the last successfully committed collection; it survives both
/// reloads and failed fetches.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub state: LoadState,
    pub data: Option<Arc<T>>,
    pub error: Option<String>,
    pub generation: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            data: self.data.clone(),
            error: self.error.clone(),
            generation: self.generation,
        }
    }
}

impl<T> Snapshot<T> {
    fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            data: None,
            error: None,
            generation: 0,
        }
    }
}

/// Proof that a fetch was started; required to commit its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a started fetch must be committed or it stays loading"]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of trying to commit a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// New data is now visible
    Applied,
    /// The fetch failed; the error is visible and old data kept
    Failed,
    /// A newer fetch started (or the page closed) before this one returned
    Discarded,
    /// The key did not change, so nothing was fetched
    Unchanged,
}

struct Control<K> {
    key: Option<K>,
    generation: u64,
    disposed: bool,
}

/// One page's copy of a fetched collection, keyed by its dependencies
pub struct Resource<K, T> {
    name: &'static str,
    control: Mutex<Control<K>>,
    state: watch::Sender<Snapshot<T>>,
}

impl<K, T> Resource<K, T>
where
    K: Clone + PartialEq + fmt::Debug,
{
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(Snapshot::idle());
        Self {
            name,
            control: Mutex::new(Control {
                key: None,
                generation: 0,
                disposed: false,
            }),
            state,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current dependency key
    pub fn key(&self) -> Option<K> {
        self.control().key.clone()
    }

    /// Change the dependency key
    ///
    /// Starts a fetch only when the key differs from the current one (or no
    /// fetch ever started). Any fetch started under the old key is
    /// superseded.
    pub fn set_key(&self, key: K) -> Option<Ticket> {
        let mut control = self.control();
        if control.disposed || control.key.as_ref() == Some(&key) {
            return None;
        }
        tracing::debug!(resource = self.name, key = ?key, "Dependency changed");
        control.key = Some(key);
        Some(self.begin(&mut control))
    }

    /// Start a fetch for the current key regardless of whether it changed
    pub fn refresh(&self) -> Option<(Ticket, K)> {
        let mut control = self.control();
        if control.disposed {
            return None;
        }
        let key = control.key.clone()?;
        Some((self.begin(&mut control), key))
    }

    /// Commit a finished fetch if it is still the active one
    pub fn commit(&self, ticket: Ticket, result: Result<T, ApiError>) -> Commit {
        let control = self.control();
        if control.disposed || ticket.generation != control.generation {
            tracing::debug!(
                resource = self.name,
                ticket = ticket.generation,
                active = control.generation,
                disposed = control.disposed,
                "Discarded stale response"
            );
            return Commit::Discarded;
        }

        // Publishing under the control lock keeps generation checks and
        // state updates in one order.
        match result {
            Ok(data) => {
                self.state.send_modify(|snapshot| {
                    snapshot.state = LoadState::Loaded;
                    snapshot.data = Some(Arc::new(data));
                    snapshot.error = None;
                });
                tracing::debug!(resource = self.name, generation = ticket.generation, "Committed");
                Commit::Applied
            }
            Err(e) => {
                tracing::warn!(resource = self.name, error = %e, "Fetch failed");
                self.state.send_modify(|snapshot| {
                    snapshot.state = LoadState::Error;
                    snapshot.error = Some(e.to_string());
                });
                Commit::Failed
            }
        }
    }

    /// Set the key and commit data already at hand, superseding any fetch
    pub fn put(&self, key: K, data: T) -> Commit {
        let ticket = {
            let mut control = self.control();
            if control.disposed {
                return Commit::Discarded;
            }
            control.key = Some(key);
            self.begin(&mut control)
        };
        self.commit(ticket, Ok(data))
    }

    /// Set the key and, if it changed, fetch and commit
    pub async fn load<F, Fut>(&self, key: K, fetch: F) -> Commit
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.set_key(key.clone()) {
            Some(ticket) => self.commit(ticket, fetch(key).await),
            None => Commit::Unchanged,
        }
    }

    /// Set the key and fetch even when it did not change
    ///
    /// For views that re-fetch every time they are shown.
    pub async fn mount<F, Fut>(&self, key: K, fetch: F) -> Commit
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let ticket = match self.set_key(key.clone()) {
            Some(ticket) => ticket,
            None => match self.refresh() {
                Some((ticket, _)) => ticket,
                None => return Commit::Discarded,
            },
        };
        self.commit(ticket, fetch(key).await)
    }

    /// Re-fetch the current key and commit
    pub async fn reload<F, Fut>(&self, fetch: F) -> Commit
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.refresh() {
            Some((ticket, key)) => self.commit(ticket, fetch(key).await),
            None => Commit::Unchanged,
        }
    }

    /// Tear down: every fetch still in flight will be discarded
    pub fn dispose(&self) {
        let mut control = self.control();
        control.disposed = true;
        control.generation += 1;
    }

    pub fn is_disposed(&self) -> bool {
        self.control().disposed
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.state.borrow().data.clone()
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().state
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Watch committed snapshots
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.state.subscribe()
    }

    fn begin(&self, control: &mut Control<K>) -> Ticket {
        control.generation += 1;
        let generation = control.generation;
        self.state.send_modify(|snapshot| {
            snapshot.state = LoadState::Loading;
            snapshot.generation = generation;
        });
        Ticket { generation }
    }

    fn control(&self) -> std::sync::MutexGuard<'_, Control<K>> {
        self.control.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K, T> fmt::Debug for Resource<K, T>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.control.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("key", &control.key)
            .field("generation", &control.generation)
            .field("state", &self.state.borrow().state)
            .finish()
    }
}
