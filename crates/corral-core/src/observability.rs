//! Status views over registry state.

/// Entry counts by lifecycle state, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryCounts {
    pub pending: usize,
    pub in_flight: usize,
}

impl RegistryCounts {
    /// Total live entries (anything a drain would have to visit).
    pub fn live(&self) -> usize {
        self.pending + self.in_flight
    }
}
