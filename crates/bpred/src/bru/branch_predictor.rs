//! Direction Predictor Interface.
//!
//! This module defines the `DirectionPredictor` trait that all taken/not-taken
//! prediction algorithms implement, and the `DirectionRecord` each lookup
//! hands back so the prediction can later be trained or undone.

use crate::common::ThreadId;

/// Snapshot of the predictor state a single direction prediction was made from.
///
/// Produced by [`DirectionPredictor::lookup`] and consumed by exactly one of
/// [`DirectionPredictor::update`] or [`DirectionPredictor::squash`]. The
/// predictor keeps no reference to it.
#[derive(Debug, PartialEq, Eq)]
pub struct DirectionRecord {
    /// Perceptron row that produced the output.
    pub(crate) row: usize,
    /// Perceptron output `y` at lookup time.
    pub(crate) output: i32,
    /// History register value before this prediction was shifted in.
    pub(crate) history: u64,
    /// Direction reported to the caller.
    pub(crate) predicted: bool,
    /// Path ring position before this branch was recorded (path variant only).
    pub(crate) path_head: u64,
}

impl DirectionRecord {
    /// Record for predictors that keep no per-branch state.
    pub(crate) const fn stateless(predicted: bool) -> Self {
        Self {
            row: 0,
            output: 0,
            history: 0,
            predicted,
            path_head: 0,
        }
    }

    /// Perceptron row that produced the prediction.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Perceptron output at lookup time.
    pub fn output(&self) -> i32 {
        self.output
    }

    /// History the prediction was computed from.
    pub fn history(&self) -> u64 {
        self.history
    }

    /// Predicted direction.
    pub fn predicted(&self) -> bool {
        self.predicted
    }
}

/// Trait for branch direction prediction algorithms.
///
/// Weight state is shared by every thread; history state is private to each
/// thread and selected by `tid`.
pub trait DirectionPredictor {
    /// Predicts whether the conditional branch at `pc` is taken.
    ///
    /// Speculative history, when enabled, is advanced with the prediction
    /// before returning.
    ///
    /// # Arguments
    ///
    /// * `tid` - Hardware thread issuing the fetch
    /// * `pc` - Program counter of the branch instruction
    ///
    /// # Returns
    ///
    /// The predicted direction and the record needed to train or undo it.
    fn lookup(&mut self, tid: ThreadId, pc: u64) -> (bool, DirectionRecord);

    /// Rewrites a fresh prediction to not-taken after the target buffer missed.
    ///
    /// Must be called before any other lookup on the same thread.
    fn btb_miss(&mut self, tid: ThreadId, record: &mut DirectionRecord);

    /// Trains the predictor with the resolved outcome of a branch.
    ///
    /// # Arguments
    ///
    /// * `tid` - Hardware thread that predicted the branch
    /// * `pc` - Program counter of the branch instruction
    /// * `record` - Record returned by the matching lookup
    /// * `taken` - Actual direction
    /// * `squashed` - The branch was mispredicted and younger speculative
    ///   state has been discarded
    fn update(
        &mut self,
        tid: ThreadId,
        pc: u64,
        record: DirectionRecord,
        taken: bool,
        squashed: bool,
    );

    /// Rolls back speculative state for a prediction discarded before it
    /// resolved.
    fn squash(&mut self, tid: ThreadId, record: DirectionRecord);
}
