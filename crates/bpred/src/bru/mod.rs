//! Branch prediction unit (BRU) implementations.
//!
//! This module contains the direction predictors (static, perceptron and
//! path-based perceptron), the branch target buffer (BTB), the return address
//! stack (RAS), and the [`BranchUnit`] façade that composes them.

pub use self::branch_predictor::{DirectionPredictor, DirectionRecord};
pub use self::unit::{BranchUnit, Prediction, PredictionHandle, PredictionSource};

/// Direction predictor trait and prediction record.
pub mod branch_predictor;

/// Branch Target Buffer for storing predicted branch targets.
pub mod btb;

/// Global history shift registers.
pub mod history;

/// Path-based perceptron predictor.
pub mod path;

/// Perceptron-based neural branch predictor.
pub mod perceptron;

/// Return Address Stack for predicting return addresses.
pub mod ras;

/// Static branch predictor (always taken).
pub mod static_bp;

/// Predictor façade: lookup, update, squash and recovery.
pub mod unit;

/// Saturating perceptron weight table.
pub mod weights;

use self::{
    path::PathPerceptronPredictor, perceptron::PerceptronPredictor, static_bp::StaticPredictor,
};
use crate::common::{ConfigError, ThreadId};
use crate::config::{DirectionKind, PredictorConfig};

/// Control-flow class of a fetched instruction, as pre-decoded by fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchClass {
    /// Conditional direct branch; direction comes from the direction predictor.
    Conditional,
    /// Unconditional direct jump (including direct calls); always taken.
    Unconditional,
    /// Register-indirect jump (including returns); always taken.
    Indirect,
}

/// Enum wrapper for static dispatch of direction predictors.
/// This avoids vtable lookups in the critical fetch loop.
#[derive(Debug, Clone)]
pub enum DirectionUnit {
    /// Always-taken predictor.
    Static(StaticPredictor),
    /// Global-history perceptron.
    Perceptron(PerceptronPredictor),
    /// Path-based perceptron.
    PerceptronPath(PathPerceptronPredictor),
}

impl DirectionUnit {
    /// Creates the direction predictor selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the perceptron geometry is invalid.
    pub fn new(config: &PredictorConfig) -> Result<Self, ConfigError> {
        let threads = config.num_threads;
        let shift = config.inst_shift;
        Ok(match config.direction {
            DirectionKind::Static => Self::Static(StaticPredictor::new()),
            DirectionKind::Perceptron => Self::Perceptron(PerceptronPredictor::new(
                &config.perceptron,
                threads,
                shift,
            )?),
            DirectionKind::PerceptronPath => Self::PerceptronPath(PathPerceptronPredictor::new(
                &config.perceptron,
                threads,
                shift,
            )?),
        })
    }

    /// Variant of this predictor.
    pub fn kind(&self) -> DirectionKind {
        match self {
            Self::Static(_) => DirectionKind::Static,
            Self::Perceptron(_) => DirectionKind::Perceptron,
            Self::PerceptronPath(_) => DirectionKind::PerceptronPath,
        }
    }
}

impl DirectionPredictor for DirectionUnit {
    #[inline(always)]
    fn lookup(&mut self, tid: ThreadId, pc: u64) -> (bool, DirectionRecord) {
        match self {
            Self::Static(bp) => bp.lookup(tid, pc),
            Self::Perceptron(bp) => bp.lookup(tid, pc),
            Self::PerceptronPath(bp) => bp.lookup(tid, pc),
        }
    }

    #[inline(always)]
    fn btb_miss(&mut self, tid: ThreadId, record: &mut DirectionRecord) {
        match self {
            Self::Static(bp) => bp.btb_miss(tid, record),
            Self::Perceptron(bp) => bp.btb_miss(tid, record),
            Self::PerceptronPath(bp) => bp.btb_miss(tid, record),
        }
    }

    #[inline(always)]
    fn update(
        &mut self,
        tid: ThreadId,
        pc: u64,
        record: DirectionRecord,
        taken: bool,
        squashed: bool,
    ) {
        match self {
            Self::Static(bp) => bp.update(tid, pc, record, taken, squashed),
            Self::Perceptron(bp) => bp.update(tid, pc, record, taken, squashed),
            Self::PerceptronPath(bp) => bp.update(tid, pc, record, taken, squashed),
        }
    }

    #[inline(always)]
    fn squash(&mut self, tid: ThreadId, record: DirectionRecord) {
        match self {
            Self::Static(bp) => bp.squash(tid, record),
            Self::Perceptron(bp) => bp.squash(tid, record),
            Self::PerceptronPath(bp) => bp.squash(tid, record),
        }
    }
}
