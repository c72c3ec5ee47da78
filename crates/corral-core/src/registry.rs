//! Task registry: handle → work mapping and result resolution.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::callback::Callback;
use crate::error::{CorralError, TaskFailure};
use crate::handle::TaskHandle;
use crate::observability::RegistryCounts;

/// Submitted work, arity erased: arguments are captured by the future at
/// submission time.
type BoxedWork<R> = Pin<Box<dyn Future<Output = R> + Send>>;

/// One registry entry.
///
/// `InFlight` covers everything from spawn to consumption; a task that has
/// finished but has not been resolved yet still sits here, its value parked
/// in the join handle. Removal from the map is the terminal state.
enum Entry<R> {
    Pending(BoxedWork<R>),
    InFlight(JoinHandle<R>),
}

/// Registry state (single source of truth, guarded by one lock).
struct RegistryState<R> {
    /// Live entries keyed by handle.
    entries: HashMap<TaskHandle, Entry<R>>,

    /// Handles whose result has been consumed, kept so a second resolve can
    /// be reported as `AlreadyResolved` rather than `UnknownHandle`.
    ///
    /// Grows by one entry per resolved task and is released only by
    /// `drain_all` (and thus shutdown): a registry that resolves forever
    /// without draining accumulates 8 bytes per consumed handle. Callers
    /// running long-lived registries should drain between batches.
    resolved: HashSet<TaskHandle>,

    /// Set once shutdown begins; every operation fails `Closed` afterwards.
    closed: bool,
}

impl<R> RegistryState<R> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            resolved: HashSet::new(),
            closed: false,
        }
    }

    /// Allocate a handle that collides with nothing currently tracked.
    ///
    /// Runs under the registry lock, so the collision check and the caller's
    /// insert are one atomic step: two concurrent submitters can never be
    /// handed the same live handle.
    fn allocate(&mut self) -> TaskHandle {
        loop {
            let handle = TaskHandle::random();
            if !self.entries.contains_key(&handle) && !self.resolved.contains(&handle) {
                return handle;
            }
        }
    }

    fn ensure_open(&self) -> Result<(), CorralError> {
        if self.closed {
            return Err(CorralError::Closed);
        }
        Ok(())
    }

    /// Classify a lookup miss.
    fn missing(&self, handle: TaskHandle) -> CorralError {
        if self.resolved.contains(&handle) {
            CorralError::AlreadyResolved(handle)
        } else {
            CorralError::UnknownHandle(handle)
        }
    }

    fn counts(&self) -> RegistryCounts {
        let mut counts = RegistryCounts::default();
        for entry in self.entries.values() {
            match entry {
                Entry::Pending(_) => counts.pending += 1,
                Entry::InFlight(_) => counts.in_flight += 1,
            }
        }
        counts
    }
}

/// Handle-correlated task registry.
///
/// Two submission modes share one map:
/// - deferred: [`submit`](Self::submit) stores the work unscheduled until
///   [`launch`](Self::launch) / [`launch_all`](Self::launch_all);
/// - immediate: [`submit_and_launch`](Self::submit_and_launch) spawns at
///   submission time.
///
/// Results are consumed exactly once: [`resolve`](Self::resolve) and
/// [`resolve_with_callback`](Self::resolve_with_callback) remove the entry,
/// and a second attempt fails with `AlreadyResolved`.
pub struct TaskRegistry<R> {
    state: Arc<Mutex<RegistryState<R>>>,
}

impl<R: Send + 'static> TaskRegistry<R> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::new())),
        }
    }

    /// Store work without scheduling it. Returns the handle for later
    /// `launch` / `resolve` calls.
    pub async fn submit<F>(&self, work: F) -> Result<TaskHandle, CorralError>
    where
        F: Future<Output = R> + Send + 'static,
    {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let handle = state.allocate();
        state.entries.insert(handle, Entry::Pending(Box::pin(work)));
        debug!(%handle, "task submitted");
        Ok(handle)
    }

    /// Store work and begin executing it immediately.
    pub async fn submit_and_launch<F>(&self, work: F) -> Result<TaskHandle, CorralError>
    where
        F: Future<Output = R> + Send + 'static,
    {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let handle = state.allocate();
        state
            .entries
            .insert(handle, Entry::InFlight(tokio::spawn(work)));
        debug!(%handle, "task submitted and launched");
        Ok(handle)
    }

    /// Begin executing a previously submitted entry.
    ///
    /// Launching the same handle twice is an `AlreadyLaunched` error, not a
    /// silent restart.
    pub async fn launch(&self, handle: TaskHandle) -> Result<(), CorralError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        match state.entries.remove(&handle) {
            Some(Entry::Pending(work)) => {
                state
                    .entries
                    .insert(handle, Entry::InFlight(tokio::spawn(work)));
                debug!(%handle, "task launched");
                Ok(())
            }
            Some(entry @ Entry::InFlight(_)) => {
                // put it back untouched
                state.entries.insert(handle, entry);
                Err(CorralError::AlreadyLaunched(handle))
            }
            None => Err(state.missing(handle)),
        }
    }

    /// Launch every entry that is currently pending.
    ///
    /// Entries submitted concurrently with this call may or may not be
    /// included; callers must not rely on a snapshot.
    pub async fn launch_all(&self) -> Result<(), CorralError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let pending: Vec<TaskHandle> = state
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Pending(_)))
            .map(|(handle, _)| *handle)
            .collect();
        for handle in pending {
            if let Some(Entry::Pending(work)) = state.entries.remove(&handle) {
                state
                    .entries
                    .insert(handle, Entry::InFlight(tokio::spawn(work)));
                debug!(%handle, "task launched");
            }
        }
        Ok(())
    }

    /// Wait for the task's result and consume the entry.
    ///
    /// A still-pending entry is launched implicitly rather than rejected;
    /// waiting on work that was never started would otherwise never return.
    /// A panic inside the work surfaces as `TaskFailed`.
    pub async fn resolve(&self, handle: TaskHandle) -> Result<R, CorralError> {
        let join = self.take_for_resolution(handle).await?;
        join.await.map_err(|err| CorralError::TaskFailed {
            handle,
            failure: TaskFailure::from_join(err),
        })
    }

    /// As [`resolve`](Self::resolve), but the outcome goes to `callback`.
    ///
    /// The callback is invoked exactly once, with `Err(TaskFailure)` when
    /// the work failed. Only lookup problems are returned to the caller.
    pub async fn resolve_with_callback<C>(
        &self,
        handle: TaskHandle,
        callback: C,
    ) -> Result<(), CorralError>
    where
        C: Callback<R>,
    {
        let join = self.take_for_resolution(handle).await?;
        let result = join.await.map_err(TaskFailure::from_join);
        callback.deliver(result).await;
        Ok(())
    }

    /// Remove the entry for `handle` and hand back something awaitable.
    /// The registry lock is released before the caller awaits it.
    async fn take_for_resolution(
        &self,
        handle: TaskHandle,
    ) -> Result<JoinHandle<R>, CorralError> {
        let entry = {
            let mut state = self.state.lock().await;
            state.ensure_open()?;
            let Some(entry) = state.entries.remove(&handle) else {
                return Err(state.missing(handle));
            };
            state.resolved.insert(handle);
            entry
        };
        Ok(match entry {
            Entry::Pending(work) => tokio::spawn(work),
            Entry::InFlight(join) => join,
        })
    }

    /// Terminal cleanup: discard pending entries, wait out in-flight ones.
    ///
    /// Leaves the registry empty and clears the resolved-handle set, so
    /// previously used handles may be reissued afterwards. Each in-flight
    /// entry is awaited outside the lock, one at a time.
    pub async fn drain_all(&self) {
        let drained: Vec<(TaskHandle, Entry<R>)> = {
            let mut state = self.state.lock().await;
            state.resolved.clear();
            state.entries.drain().collect()
        };

        let mut discarded = 0usize;
        let mut awaited = 0usize;
        for (handle, entry) in drained {
            match entry {
                Entry::Pending(_) => {
                    // never launched, nothing to wait for
                    discarded += 1;
                }
                Entry::InFlight(join) => {
                    awaited += 1;
                    if let Err(err) = join.await {
                        warn!(
                            %handle,
                            failure = %TaskFailure::from_join(err),
                            "drained task did not complete cleanly"
                        );
                    }
                }
            }
        }
        debug!(discarded, awaited, "registry drained");
    }

    /// Mark the registry closed. Every subsequent operation fails `Closed`.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
    }

    /// Entry counts by state.
    pub async fn counts(&self) -> RegistryCounts {
        let state = self.state.lock().await;
        state.counts()
    }
}

impl<R: Send + 'static> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
