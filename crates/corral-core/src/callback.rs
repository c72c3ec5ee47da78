//! Callback seam for result delivery.

use async_trait::async_trait;

use crate::error::TaskResult;

/// Receives a task's outcome.
///
/// Invoked exactly once per task, on the execution context that ran the task
/// (fire-and-forget) or on the resolving caller's context (registry mode).
/// Failed tasks are delivered too, as `Err(TaskFailure)`: a callback that
/// never fires would make failure invisible in fire-and-forget mode.
///
/// Plain closures work directly thanks to the blanket impl:
///
/// ```ignore
/// dispatcher.dispatch(work, |result| println!("{result:?}"))?;
/// ```
///
/// Implement the trait by hand when delivery needs to await something or
/// carry state.
#[async_trait]
pub trait Callback<R>: Send + Sync {
    async fn deliver(&self, result: TaskResult<R>);
}

#[async_trait]
impl<R, F> Callback<R> for F
where
    R: Send + 'static,
    F: Fn(TaskResult<R>) + Send + Sync,
{
    async fn deliver(&self, result: TaskResult<R>) {
        self(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingCallback {
        hits: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Callback<u32> for CountingCallback {
        async fn deliver(&self, result: TaskResult<u32>) {
            self.hits.fetch_add(result.unwrap(), Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn closures_satisfy_the_trait() {
        let seen = Arc::new(AtomicU32::new(0));
        let seen2 = Arc::clone(&seen);
        let cb = move |result: TaskResult<u32>| {
            seen2.store(result.unwrap(), Ordering::SeqCst);
        };
        cb.deliver(Ok(17)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 17);
    }

    #[tokio::test]
    async fn hand_written_impls_work() {
        let hits = Arc::new(AtomicU32::new(0));
        let cb = CountingCallback {
            hits: Arc::clone(&hits),
        };
        cb.deliver(Ok(5)).await;
        cb.deliver(Ok(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }
}
