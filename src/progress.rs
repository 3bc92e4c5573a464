//! Batch progress counters.

use std::fmt;

/// Footprints geocoded so far out of the current batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub start_count: usize,
    pub total_count: usize,
}

impl Progress {
    pub fn new(total_count: usize) -> Self {
        Self {
            start_count: 0,
            total_count,
        }
    }

    /// Count one more processed footprint, returning the new count
    pub fn advance(&mut self) -> usize {
        self.start_count += 1;
        self.start_count
    }

    pub fn is_complete(&self) -> bool {
        self.start_count >= self.total_count
    }

    pub fn remaining(&self) -> usize {
        self.total_count.saturating_sub(self.start_count)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Progress of reverse geocoding: {} out of {}",
            self.start_count, self.total_count
        )
    }
}
