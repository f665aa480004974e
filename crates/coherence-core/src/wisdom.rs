//! The monotonic wisdom accumulator.

use parking_lot::RwLock;
use tracing::warn;

/// A non-negative scalar that only ever increases.
#[derive(Debug, Default)]
pub struct WisdomAccumulator {
    total: RwLock<f64>,
}

impl WisdomAccumulator {
    /// Create an accumulator at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` and return the new total.
    ///
    /// Negative and non-finite amounts are treated as zero and logged.
    pub fn add(&self, amount: f64) -> f64 {
        let amount = if amount.is_finite() && amount >= 0.0 {
            amount
        } else {
            warn!(amount, "Ignoring invalid wisdom contribution");
            0.0
        };
        let mut guard = self.total.write();
        *guard += amount;
        *guard
    }

    /// Current total.
    pub fn value(&self) -> f64 {
        *self.total.read()
    }
}
