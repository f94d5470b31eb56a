//! Global History Registers.
//!
//! A history register is a shift register of recent branch outcomes. Bit 0
//! holds the most recent outcome and bit `i` the outcome `i` branches in the
//! past. Only the low `width` bits are significant; every shift masks to that
//! width so the register value is always below `2^width`.

/// Fixed-width branch outcome shift register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRegister {
    bits: u64,
    mask: u64,
    width: u32,
}

impl HistoryRegister {
    /// Creates a cleared register holding `width` outcomes.
    ///
    /// `width` must be in `1..=64`; the configuration layer enforces this.
    pub fn new(width: u32) -> Self {
        debug_assert!((1..=64).contains(&width), "history width {width}");
        Self {
            bits: 0,
            mask: width_mask(width),
            width,
        }
    }

    /// Appends one outcome as the most recent bit.
    #[inline]
    pub fn shift_in(&mut self, taken: bool) {
        self.bits = ((self.bits << 1) | u64::from(taken)) & self.mask;
    }

    /// Returns the current value for embedding into a prediction record.
    #[inline]
    pub fn snapshot(&self) -> u64 {
        self.bits
    }

    /// Sets the register back to a captured value.
    #[inline]
    pub fn restore(&mut self, value: u64) {
        self.bits = value & self.mask;
    }

    /// Returns the outcome `i` branches in the past.
    #[inline]
    pub fn bit(&self, i: u32) -> bool {
        outcome_at(self.bits, i)
    }

    /// Number of significant bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask of the significant bits.
    pub fn mask(&self) -> u64 {
        self.mask
    }
}

/// Returns the outcome stored at position `i` of a history value.
#[inline]
pub fn outcome_at(history: u64, i: u32) -> bool {
    (history >> i) & 1 != 0
}

/// Mask with the low `width` bits set.
pub(crate) fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// The pair of history registers kept for one hardware thread.
///
/// The speculative register runs ahead with predicted outcomes; the resolved
/// register only ever sees outcomes of committed branches, so wrong
/// speculative bits can always be told apart from confirmed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadHistory {
    /// Advanced at prediction time with the predicted outcome.
    pub speculative: HistoryRegister,
    /// Advanced when a branch commits with its actual outcome.
    pub resolved: HistoryRegister,
}

impl ThreadHistory {
    /// Creates a cleared register pair of the given width.
    pub fn new(width: u32) -> Self {
        Self {
            speculative: HistoryRegister::new(width),
            resolved: HistoryRegister::new(width),
        }
    }

    /// Returns the register predictions are made from.
    #[inline]
    pub fn working(&self, speculative: bool) -> &HistoryRegister {
        if speculative {
            &self.speculative
        } else {
            &self.resolved
        }
    }

    /// Mutable counterpart of [`ThreadHistory::working`].
    #[inline]
    pub fn working_mut(&mut self, speculative: bool) -> &mut HistoryRegister {
        if speculative {
            &mut self.speculative
        } else {
            &mut self.resolved
        }
    }
}
