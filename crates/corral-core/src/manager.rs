//! Facade tying one registry to one dispatcher, with coordinated shutdown.

use std::future::Future;

use tracing::debug;

use crate::callback::Callback;
use crate::dispatcher::Dispatcher;
use crate::error::CorralError;
use crate::handle::TaskHandle;
use crate::observability::RegistryCounts;
use crate::registry::TaskRegistry;

/// One result type, both execution modes, one teardown path.
///
/// `TaskManager<R>` is the intended entry point: handle-correlated work goes
/// through the registry half, fire-and-forget work through the dispatcher
/// half, and [`shutdown`](Self::shutdown) tears both down in the safe order.
/// Separate result types need separate managers.
pub struct TaskManager<R> {
    registry: TaskRegistry<R>,
    dispatcher: Dispatcher,
}

impl<R: Send + 'static> TaskManager<R> {
    pub fn new() -> Self {
        Self {
            registry: TaskRegistry::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// See [`TaskRegistry::submit`].
    pub async fn submit<F>(&self, work: F) -> Result<TaskHandle, CorralError>
    where
        F: Future<Output = R> + Send + 'static,
    {
        self.registry.submit(work).await
    }

    /// See [`TaskRegistry::submit_and_launch`].
    pub async fn submit_and_launch<F>(&self, work: F) -> Result<TaskHandle, CorralError>
    where
        F: Future<Output = R> + Send + 'static,
    {
        self.registry.submit_and_launch(work).await
    }

    /// See [`TaskRegistry::launch`].
    pub async fn launch(&self, handle: TaskHandle) -> Result<(), CorralError> {
        self.registry.launch(handle).await
    }

    /// See [`TaskRegistry::launch_all`].
    pub async fn launch_all(&self) -> Result<(), CorralError> {
        self.registry.launch_all().await
    }

    /// See [`TaskRegistry::resolve`].
    pub async fn resolve(&self, handle: TaskHandle) -> Result<R, CorralError> {
        self.registry.resolve(handle).await
    }

    /// See [`TaskRegistry::resolve_with_callback`].
    pub async fn resolve_with_callback<C>(
        &self,
        handle: TaskHandle,
        callback: C,
    ) -> Result<(), CorralError>
    where
        C: Callback<R>,
    {
        self.registry.resolve_with_callback(handle, callback).await
    }

    /// See [`Dispatcher::dispatch`]. The work's result type is pinned to
    /// this manager's `R`, like every other operation here.
    pub fn dispatch<F, C>(&self, work: F, callback: C) -> Result<(), CorralError>
    where
        F: Future<Output = R> + Send + 'static,
        C: Callback<R> + 'static,
    {
        self.dispatcher.dispatch(work, callback)
    }

    /// See [`Dispatcher::wait_for_idle`].
    pub async fn wait_for_idle(&self) {
        self.dispatcher.wait_for_idle().await
    }

    /// Current registry entry counts.
    pub async fn counts(&self) -> RegistryCounts {
        self.registry.counts().await
    }

    /// Fire-and-forget tasks still in flight.
    pub fn outstanding(&self) -> usize {
        self.dispatcher.outstanding()
    }

    /// Tear everything down: stop accepting work, wait out the
    /// fire-and-forget set, then drain the registry.
    ///
    /// The dispatcher is waited on before the registry drains; detached
    /// callbacks may still be running while registry entries look idle, and
    /// draining first could discard work those callbacks depend on. Calling
    /// `shutdown` again is a no-op; every other operation afterwards fails
    /// with `Closed`.
    pub async fn shutdown(&self) {
        self.dispatcher.close();
        self.registry.close().await;

        debug!("shutdown: waiting for fire-and-forget tasks");
        self.dispatcher.wait_for_idle().await;

        debug!("shutdown: draining registry");
        self.registry.drain_all().await;
    }
}

impl<R: Send + 'static> Default for TaskManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskResult;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn both_halves_work_through_the_facade() {
        let manager = TaskManager::new();

        let handle = manager.submit(async { 21 * 2 }).await.unwrap();
        manager.launch(handle).await.unwrap();
        assert_eq!(manager.resolve(handle).await.unwrap(), 42);

        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        manager
            .dispatch(async { 9 }, move |result: TaskResult<i32>| {
                sink.store(result.unwrap() as usize, Ordering::SeqCst);
            })
            .unwrap();
        manager.wait_for_idle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn shutdown_waits_for_detached_work_then_drains() {
        let manager = TaskManager::new();
        let callbacks = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let sink = Arc::clone(&callbacks);
            manager
                .dispatch(
                    async {
                        sleep(Duration::from_millis(30)).await;
                        1
                    },
                    move |result: TaskResult<i32>| {
                        result.unwrap();
                        sink.fetch_add(1, Ordering::SeqCst);
                    },
                )
                .unwrap();
        }

        // one pending and one in-flight registry entry as well
        manager.submit(async { 0 }).await.unwrap();
        manager
            .submit_and_launch(async {
                sleep(Duration::from_millis(20)).await;
                0
            })
            .await
            .unwrap();

        manager.shutdown().await;

        assert_eq!(callbacks.load(Ordering::SeqCst), 5);
        assert_eq!(manager.outstanding(), 0);
        assert_eq!(manager.counts().await.live(), 0);
    }

    #[tokio::test]
    async fn operations_after_shutdown_are_rejected() {
        let manager: TaskManager<i32> = TaskManager::new();
        manager.shutdown().await;

        assert!(matches!(
            manager.submit(async { 1 }).await,
            Err(CorralError::Closed)
        ));
        assert!(matches!(
            manager.submit_and_launch(async { 1 }).await,
            Err(CorralError::Closed)
        ));
        assert!(matches!(
            manager.launch_all().await,
            Err(CorralError::Closed)
        ));
        assert!(matches!(
            manager.dispatch(async { 1 }, |_result: TaskResult<i32>| {}),
            Err(CorralError::Closed)
        ));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let manager: TaskManager<()> = TaskManager::new();
        manager.shutdown().await;
        manager.shutdown().await;
        assert_eq!(manager.counts().await.live(), 0);
    }
}
