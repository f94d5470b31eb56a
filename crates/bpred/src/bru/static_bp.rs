//! Static Branch Predictor.
//!
//! Implements an "Always Taken" policy for conditional branches. It holds no
//! learning state; training and squashing are no-ops. The target still comes
//! from the BTB, so a cold branch is reported not-taken until its target is
//! known.

use super::branch_predictor::{DirectionPredictor, DirectionRecord};
use crate::common::ThreadId;

/// Static Branch Predictor structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPredictor;

impl StaticPredictor {
    /// Creates a new Static Predictor.
    pub const fn new() -> Self {
        Self
    }
}

impl DirectionPredictor for StaticPredictor {
    /// Always predicts taken.
    fn lookup(&mut self, _tid: ThreadId, _pc: u64) -> (bool, DirectionRecord) {
        (true, DirectionRecord::stateless(true))
    }

    fn btb_miss(&mut self, _tid: ThreadId, record: &mut DirectionRecord) {
        record.predicted = false;
    }

    fn update(
        &mut self,
        _tid: ThreadId,
        _pc: u64,
        _record: DirectionRecord,
        _taken: bool,
        _squashed: bool,
    ) {
    }

    fn squash(&mut self, _tid: ThreadId, _record: DirectionRecord) {}
}
