//! Error types for registry operations and task outcomes.

use thiserror::Error;
use tokio::task::JoinError;

use crate::handle::TaskHandle;

/// What a task produced: its value, or a typed failure captured by the
/// launcher. This is the argument every [`Callback`](crate::Callback)
/// receives, including for failed tasks.
pub type TaskResult<R> = Result<R, TaskFailure>;

/// Failure of the work itself, as opposed to a misuse of the registry API.
///
/// A panic inside submitted work is caught at the join point and carried
/// here; it never takes down the resolving caller or a dispatch worker.
#[derive(Debug, Clone, Error)]
pub enum TaskFailure {
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The runtime tore the task down before it completed. Only reachable
    /// when the owning runtime shuts down underneath the registry.
    #[error("task was cancelled by the runtime")]
    Cancelled,
}

impl TaskFailure {
    /// Map a join-side error to a typed failure.
    pub(crate) fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            };
            TaskFailure::Panicked(message)
        } else {
            TaskFailure::Cancelled
        }
    }
}

/// Errors returned by registry, dispatcher, and manager operations.
#[derive(Debug, Error)]
pub enum CorralError {
    /// The handle was never issued by this registry, or its entry was
    /// discarded by a drain.
    #[error("unknown handle {0}")]
    UnknownHandle(TaskHandle),

    /// The handle was valid once, but its result has already been consumed.
    #[error("handle {0} was already resolved")]
    AlreadyResolved(TaskHandle),

    /// `launch` was called twice for the same handle.
    #[error("handle {0} is already launched")]
    AlreadyLaunched(TaskHandle),

    /// The task ran but did not produce a value.
    #[error("task {handle} failed to complete")]
    TaskFailed {
        handle: TaskHandle,
        #[source]
        failure: TaskFailure,
    },

    /// Operation attempted after shutdown began.
    #[error("registry is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_panic_is_captured_as_typed_failure() {
        let join = tokio::spawn(async { panic!("boom") }).await;
        let failure = TaskFailure::from_join(join.unwrap_err());
        assert!(matches!(failure, TaskFailure::Panicked(ref msg) if msg == "boom"));
    }

    #[tokio::test]
    async fn join_abort_maps_to_cancelled() {
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        task.abort();
        let failure = TaskFailure::from_join(task.await.unwrap_err());
        assert!(matches!(failure, TaskFailure::Cancelled));
    }

    #[test]
    fn errors_render_the_offending_handle() {
        let handle = crate::handle::TaskHandle::from_raw(7);
        let err = CorralError::UnknownHandle(handle);
        assert!(err.to_string().contains(&handle.to_string()));
    }
}
