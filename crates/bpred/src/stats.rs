//! Prediction statistics collection.
//!
//! Counts lookups and resolutions of the branch prediction unit. It provides:
//! 1. **Direction:** Correct and incorrect direction predictions.
//! 2. **Address:** Predictions whose next fetch address was right.
//! 3. **Indirect jumps:** Target accuracy with and without the return stack.
//! 4. **Return stack:** Push/pop traffic and return prediction hits.
//!
//! Formatting and reporting are left to the embedding simulator; the counters
//! serialize with `serde`.

use serde::Serialize;

/// Branch prediction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BpStats {
    /// Predictions requested.
    pub lookups: u64,
    /// Predictions resolved through `update`.
    pub updates: u64,
    /// Resolutions whose predicted direction was right.
    pub dir_hits: u64,
    /// Resolutions whose predicted direction was wrong.
    pub misses: u64,
    /// Resolutions whose predicted next fetch address was right.
    pub addr_hits: u64,
    /// Resolutions predicted by the return stack.
    pub used_ras: u64,
    /// Return stack predictions with the right target.
    pub ras_hits: u64,
    /// Indirect jumps resolved.
    pub jr_seen: u64,
    /// Indirect jumps with the right target.
    pub jr_hits: u64,
    /// Indirect jumps not predicted by the return stack.
    pub jr_non_ras_seen: u64,
    /// Indirect jumps not predicted by the return stack with the right target.
    pub jr_non_ras_hits: u64,
    /// Addresses pushed onto the return stack.
    pub ras_pushes: u64,
    /// Addresses popped off the return stack.
    pub ras_pops: u64,
}

/// Ratio that reads as zero when nothing was counted.
fn rate(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

impl BpStats {
    /// Fraction of resolutions with the right next fetch address.
    pub fn addr_rate(&self) -> f64 {
        rate(self.addr_hits, self.updates)
    }

    /// Fraction of resolutions with the right direction.
    pub fn dir_rate(&self) -> f64 {
        rate(self.dir_hits, self.updates)
    }

    /// Fraction of indirect jumps with the right target.
    pub fn jr_rate(&self) -> f64 {
        rate(self.jr_hits, self.jr_seen)
    }

    /// Fraction of indirect jumps outside the return stack with the right target.
    pub fn jr_non_ras_rate(&self) -> f64 {
        rate(self.jr_non_ras_hits, self.jr_non_ras_seen)
    }

    /// Fraction of return stack predictions with the right target.
    pub fn ras_rate(&self) -> f64 {
        rate(self.ras_hits, self.used_ras)
    }

    /// Clears every counter, e.g. after a warm-up phase.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
