//! corral-core
//!
//! An in-process correlation layer for asynchronous work: submit a future,
//! get back an opaque [`TaskHandle`], and later resolve the result by handle
//! or have it delivered to a [`Callback`]. A separate fire-and-forget path
//! trades the handle away for simplicity, tracking only an outstanding-work
//! count that [`Dispatcher::wait_for_idle`] blocks on.
//!
//! # Modules
//! - **handle**: opaque random task handles
//! - **error**: `CorralError` / `TaskFailure` taxonomy
//! - **callback**: the result-delivery trait (closures work out of the box)
//! - **registry**: handle → entry map, launch and resolution lifecycle
//! - **dispatcher**: fire-and-forget dispatch plus idle waiting
//! - **manager**: `TaskManager` facade and two-phase shutdown
//! - **observability**: entry-count snapshots
//!
//! Most callers only need [`TaskManager`]:
//!
//! ```ignore
//! let manager: TaskManager<i64> = TaskManager::new();
//! let handle = manager.submit_and_launch(async move { a - b }).await?;
//! let value = manager.resolve(handle).await?;
//! manager.shutdown().await;
//! ```

pub mod callback;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod manager;
pub mod observability;
pub mod registry;

pub use callback::Callback;
pub use dispatcher::Dispatcher;
pub use error::{CorralError, TaskFailure, TaskResult};
pub use handle::TaskHandle;
pub use manager::TaskManager;
pub use observability::RegistryCounts;
pub use registry::TaskRegistry;
