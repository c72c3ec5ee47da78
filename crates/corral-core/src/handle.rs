//! Task handles (opaque correlation tokens).
//!
//! A [`TaskHandle`] is the only thing a caller keeps after submitting work:
//! an unpredictable 64-bit token used for every later lookup. Handles carry
//! no timestamp and no ordering meaning; two handles compare equal only when
//! they refer to the same registry entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a submitted task.
///
/// Uniqueness is scoped to the registry that issued the handle, and only for
/// as long as the entry is live: a handle freed by a drain may be handed out
/// again for an unrelated task later. Collision avoidance happens at
/// allocation time, inside the registry lock (see `RegistryState::allocate`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

impl TaskHandle {
    /// Draw a fresh candidate handle from a uniformly distributed source.
    ///
    /// This is only a candidate: the registry retries the draw while it
    /// collides with a live handle.
    pub(crate) fn random() -> Self {
        Self(rand::random::<u64>())
    }

    /// Build a handle from a raw value. Test-only; real handles come from
    /// the registry so the collision check cannot be bypassed.
    #[cfg(test)]
    pub(crate) fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_task_prefix() {
        let handle = TaskHandle::from_raw(0xdead_beef);
        assert_eq!(handle.to_string(), "task-00000000deadbeef");
    }

    #[test]
    fn random_handles_differ() {
        // Two draws colliding is a 1-in-2^64 event; a failure here means the
        // entropy source is broken, not that we got unlucky.
        let a = TaskHandle::random();
        let b = TaskHandle::random();
        assert_ne!(a, b);
    }

    #[test]
    fn handles_survive_serialization() {
        let handle = TaskHandle::from_raw(42);

        let serialized = serde_json::to_string(&handle).unwrap();
        let deserialized: TaskHandle = serde_json::from_str(&serialized).unwrap();

        assert_eq!(handle, deserialized);
    }

    #[test]
    fn handle_is_plain_u64_sized() {
        assert_eq!(std::mem::size_of::<TaskHandle>(), 8);
    }
}
