//! Fire-and-forget dispatch and idle waiting.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::callback::Callback;
use crate::error::{CorralError, TaskFailure};

/// Launches work with no handle attached: completion is observed only
/// through the callback and [`wait_for_idle`](Self::wait_for_idle).
///
/// The outstanding-work counter lives in a `watch` channel, so waiters
/// suspend on the channel instead of polling, and every waiter wakes when
/// the count hits zero.
pub struct Dispatcher {
    outstanding: watch::Sender<usize>,
    closed: AtomicBool,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            outstanding,
            closed: AtomicBool::new(false),
        }
    }

    /// Run `work` to completion on its own execution context, deliver the
    /// outcome to `callback` there, then retire the task from the
    /// outstanding count.
    ///
    /// Ordering per task: work completion happens-before callback delivery
    /// happens-before the decrement becomes visible to an idle waiter. A
    /// panic inside the work reaches the callback as `Err(TaskFailure)`;
    /// the only synchronous failure is `Closed`.
    pub fn dispatch<F, C>(&self, work: F, callback: C) -> Result<(), CorralError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
        C: Callback<F::Output> + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CorralError::Closed);
        }

        self.outstanding.send_modify(|count| *count += 1);

        let counter = self.outstanding.clone();
        tokio::spawn(async move {
            // decrements on every exit path, including a panic inside the
            // callback; the guard drops after delivery, so a waiter seeing
            // zero can still assume every callback has run
            let _retire = RetireGuard { counter };

            // inner spawn so a panic is contained and typed, not fatal to
            // this context
            let result = tokio::spawn(work).await.map_err(TaskFailure::from_join);
            if let Err(ref failure) = result {
                warn!(%failure, "fire-and-forget task failed");
            }

            callback.deliver(result).await;
        });

        Ok(())
    }

    /// Number of dispatched tasks whose callback has not finished yet.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Suspend until the outstanding count reaches zero.
    ///
    /// Returns immediately when nothing is in flight; releases every
    /// concurrent waiter together.
    pub async fn wait_for_idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // wait_for inspects the current value first, so a decrement racing
        // with the subscribe cannot be missed
        let _ = rx.wait_for(|count| *count == 0).await;
        debug!("dispatcher idle");
    }

    /// Reject further dispatches. In-flight work is unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Retires one task from the outstanding count on drop.
///
/// Lives on the stack of the dispatch task so the decrement happens whether
/// the body returns or unwinds; a callback that panics must not leave the
/// counter above zero and wedge every idle waiter.
struct RetireGuard {
    counter: watch::Sender<usize>,
}

impl Drop for RetireGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|count| *count -= 1);
    }
}
