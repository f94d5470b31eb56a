//! Return Address Stack (RAS).
//!
//! The RAS predicts function return addresses. It is a circular buffer whose
//! size is a power of two, so pushes and pops wrap with a mask and overflow
//! silently overwrites the oldest entry.
//!
//! Speculative fetch can pop past where correct execution would have. Every
//! lookup therefore hands back a [`RasCheckpoint`], and a mispredicted branch
//! rewinds the stack by restoring that checkpoint verbatim. Recovery does not
//! replay anything: it relies on wrong-path pushes not having overwritten the
//! slots still referenced below the restored top.

/// Top-of-stack state captured at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasCheckpoint {
    /// Top-of-stack index.
    tos: usize,
    /// Number of live entries.
    depth: usize,
}

impl RasCheckpoint {
    /// Top-of-stack index at capture time.
    pub fn tos(&self) -> usize {
        self.tos
    }

    /// Number of live entries at capture time.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Return Address Stack structure.
#[derive(Debug, Clone)]
pub struct Ras {
    /// The stack storage.
    stack: Vec<u64>,
    /// Index of the current top entry.
    tos: usize,
    /// Live entries, saturating at the capacity.
    depth: usize,
}

impl Ras {
    /// Creates a Return Address Stack with `size` entries.
    ///
    /// `size` must be zero (stack disabled) or a power of two; the
    /// configuration layer enforces this. The top starts at `size - 1` so the
    /// first push lands in slot 0.
    pub fn new(size: usize) -> Self {
        debug_assert!(size == 0 || size.is_power_of_two());
        Self {
            stack: vec![0; size],
            tos: size.saturating_sub(1),
            depth: 0,
        }
    }

    #[inline]
    fn mask(&self) -> usize {
        self.stack.len() - 1
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.stack.len()
    }

    /// Current top-of-stack index.
    pub fn tos(&self) -> usize {
        self.tos
    }

    /// Number of live entries.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a return could be predicted right now.
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Captures the current top of stack.
    pub fn checkpoint(&self) -> RasCheckpoint {
        RasCheckpoint {
            tos: self.tos,
            depth: self.depth,
        }
    }

    /// Pushes a return address.
    ///
    /// Advances the top index and writes the new top. A full stack wraps and
    /// overwrites its oldest entry.
    pub fn push(&mut self, addr: u64) {
        if self.stack.is_empty() {
            return;
        }
        self.tos = (self.tos + 1) & self.mask();
        self.stack[self.tos] = addr;
        self.depth = (self.depth + 1).min(self.stack.len());
    }

    /// Pops the top return address, or `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<u64> {
        if self.is_empty() {
            return None;
        }
        let addr = self.stack[self.tos];
        self.tos = (self.tos + self.stack.len() - 1) & self.mask();
        self.depth -= 1;
        Some(addr)
    }

    /// Reads the top return address without popping it.
    pub fn top(&self) -> Option<u64> {
        (!self.is_empty()).then(|| self.stack[self.tos])
    }

    /// Captures a checkpoint and, for returns, pops the predicted address.
    ///
    /// # Returns
    ///
    /// The popped address (`None` if `is_return` is false or the stack is
    /// empty) and the checkpoint taken before any pop.
    pub fn lookup(&mut self, is_return: bool) -> (Option<u64>, RasCheckpoint) {
        let checkpoint = self.checkpoint();
        let target = if is_return { self.pop() } else { None };
        (target, checkpoint)
    }

    /// Rewinds the stack to a checkpoint. Restoring the same checkpoint twice
    /// is a no-op the second time.
    pub fn recover(&mut self, checkpoint: RasCheckpoint) {
        debug_assert!(self.stack.is_empty() || checkpoint.tos < self.stack.len());
        self.tos = checkpoint.tos;
        self.depth = checkpoint.depth;
    }
}
