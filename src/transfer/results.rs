//! Transfer result types
//!
//! Values handed back to callers while and after a payload moves.

/// Cumulative progress of one receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub received: u64,
    pub expected: u64,
}

impl Progress {
    /// Percentage of the declared size received so far.
    pub fn percent(&self) -> f64 {
        if self.expected == 0 {
            return 100.0;
        }
        self.received as f64 / self.expected as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.received >= self.expected
    }
}
