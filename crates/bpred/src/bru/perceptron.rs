//! Perceptron Branch Predictor.
//!
//! Uses a single-layer perceptron to predict branch direction. Instead of
//! saturating counters, it keeps a table of weight vectors; the prediction is
//! the sign of the dot product of a weight row and the global history, where a
//! taken history bit contributes `+w` and a not-taken bit `-w`.
//!
//! Training is gated: weights only move when the branch was mispredicted
//! (resolved as squashed) or when the output magnitude did not exceed the
//! threshold `theta`.

use tracing::{debug, trace};

use super::{
    branch_predictor::{DirectionPredictor, DirectionRecord},
    history::ThreadHistory,
    weights::WeightTable,
};
use crate::common::{ConfigError, ThreadId};
use crate::config::{PerceptronConfig, PerceptronIndexing};

/// Perceptron Predictor structure.
#[derive(Debug, Clone)]
pub struct PerceptronPredictor {
    /// Shared weight rows.
    weights: WeightTable,
    /// Per-thread history registers.
    threads: Vec<ThreadHistory>,
    /// Row selection scheme.
    indexing: PerceptronIndexing,
    /// Address bits dropped before row selection.
    inst_shift: u32,
    /// Predict from the speculative register.
    speculative: bool,
    /// Training threshold.
    theta: i32,
}

impl PerceptronPredictor {
    /// Creates a perceptron predictor with zeroed weights and cleared history.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the table geometry is invalid or
    /// `num_threads` is zero.
    pub fn new(
        config: &PerceptronConfig,
        num_threads: usize,
        inst_shift: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if num_threads == 0 {
            return Err(ConfigError::ZeroSized {
                what: "number of threads",
            });
        }

        let theta = config.theta();
        debug!(
            rows = config.table_size,
            history = config.history_length,
            weight_bits = config.weight_bits,
            theta,
            indexing = ?config.indexing,
            "perceptron predictor initialised"
        );

        Ok(Self {
            weights: WeightTable::new(
                config.table_size,
                config.history_length,
                config.weight_bits,
            ),
            threads: vec![ThreadHistory::new(config.history_length); num_threads],
            indexing: config.indexing,
            inst_shift,
            speculative: config.speculative_history,
            theta,
        })
    }

    /// Selects the weight row for a branch.
    fn index(&self, pc: u64, history: u64) -> usize {
        let addr = pc >> self.inst_shift;
        match self.indexing {
            PerceptronIndexing::Modulo => (addr % self.weights.rows() as u64) as usize,
            PerceptronIndexing::Global => ((addr ^ history) as usize) & (self.weights.rows() - 1),
        }
    }

    /// Computes the output the next lookup on `tid` would see for `pc`,
    /// without touching any state.
    pub fn output(&self, tid: ThreadId, pc: u64) -> i32 {
        let history = self.threads[tid].working(self.speculative).snapshot();
        self.weights.output(self.index(pc, history), history)
    }

    /// Training threshold in use.
    pub fn theta(&self) -> i32 {
        self.theta
    }

    /// Shared weight table.
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// History registers of one thread.
    pub fn history(&self, tid: ThreadId) -> &ThreadHistory {
        &self.threads[tid]
    }
}

impl DirectionPredictor for PerceptronPredictor {
    /// Predicts taken if the perceptron output is non-negative.
    fn lookup(&mut self, tid: ThreadId, pc: u64) -> (bool, DirectionRecord) {
        debug_assert!(tid < self.threads.len(), "thread {tid} out of range");
        let history = self.threads[tid].working(self.speculative).snapshot();
        let row = self.index(pc, history);
        let output = self.weights.output(row, history);
        let predicted = output >= 0;

        if self.speculative {
            self.threads[tid].speculative.shift_in(predicted);
        }

        let record = DirectionRecord {
            row,
            output,
            history,
            predicted,
            path_head: 0,
        };
        (predicted, record)
    }

    fn btb_miss(&mut self, tid: ThreadId, record: &mut DirectionRecord) {
        if record.predicted && self.speculative {
            self.threads[tid].speculative.restore(record.history << 1);
        }
        record.predicted = false;
    }

    /// Trains the row the prediction came from.
    ///
    /// The resolved register always advances by the actual outcome. With
    /// speculative history on, a squashed resolution also rewrites the
    /// speculative register to the snapshot followed by the outcome. The
    /// resolved register only ever holds committed outcomes, so it is never
    /// restored from a snapshot. The weights are trained on the snapshot,
    /// which is the history the prediction was made with.
    fn update(
        &mut self,
        tid: ThreadId,
        _pc: u64,
        record: DirectionRecord,
        taken: bool,
        squashed: bool,
    ) {
        let thread = &mut self.threads[tid];
        thread.resolved.shift_in(taken);
        if squashed && self.speculative {
            thread
                .speculative
                .restore((record.history << 1) | u64::from(taken));
            trace!(
                tid,
                row = record.row,
                y = record.output,
                taken,
                "perceptron history repaired after misprediction"
            );
        }

        if squashed || record.output.abs() <= self.theta {
            self.weights.train_row(record.row, record.history, taken);
        }
    }

    fn squash(&mut self, tid: ThreadId, record: DirectionRecord) {
        if self.speculative {
            self.threads[tid].speculative.restore(record.history);
        }
    }
}
