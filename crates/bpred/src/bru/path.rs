//! Path-Based Perceptron Predictor.
//!
//! Variant of the perceptron predictor where the weight paired with history
//! position `j` is taken from the row of the branch `j` steps back along the
//! path, not from the row of the branch being predicted. The dot product is
//! computed ahead of time: every prediction adds its contribution to a vector
//! of partial sums, one slot per future branch, so a lookup only has to add
//! its own bias to the ready sum.
//!
//! Two sum vectors are kept per thread. `SR` runs ahead with predicted
//! outcomes; `R` is advanced with actual outcomes at resolution time and is
//! copied over `SR` whenever speculative state is discarded.

use tracing::{debug, trace};

use super::{
    branch_predictor::{DirectionPredictor, DirectionRecord},
    history::{ThreadHistory, outcome_at},
    weights::WeightTable,
};
use crate::common::{ConfigError, ThreadId};
use crate::config::PerceptronConfig;

/// Per-thread speculative and resolved path state.
#[derive(Debug, Clone)]
struct PathThread {
    history: ThreadHistory,
    /// Speculative partial sums, `h + 1` slots; slot `h` is due next.
    sr: Vec<i32>,
    /// Resolved partial sums.
    r: Vec<i32>,
    /// Ring of recent branch addresses.
    path: Vec<u64>,
    /// Number of addresses ever recorded; the ring slot is `head & mask`.
    head: u64,
}

impl PathThread {
    fn new(history_length: u32, ring_len: usize) -> Self {
        let slots = history_length as usize + 1;
        Self {
            history: ThreadHistory::new(history_length),
            sr: vec![0; slots],
            r: vec![0; slots],
            path: vec![0; ring_len],
            head: 0,
        }
    }

    fn push_path(&mut self, pc: u64) {
        let mask = self.path.len() as u64 - 1;
        self.path[(self.head & mask) as usize] = pc;
        self.head += 1;
    }

    /// Address recorded `j` entries before position `head`, if one exists.
    fn older(&self, head: u64, j: u64) -> Option<u64> {
        let mask = self.path.len() as u64 - 1;
        (j <= head).then(|| self.path[((head - j) & mask) as usize])
    }
}

/// Shifts a partial-sum vector by one branch.
///
/// `sums'[k + 1] = sums[k] +/- W[row, h - k]` (plus when `taken`) and
/// `sums'[0] = 0`.
fn advance(sums: &mut [i32], weights: &WeightTable, row: usize, taken: bool) {
    let h = sums.len() - 1;
    for k in (0..h).rev() {
        let w = weights.weight(row, h - k);
        sums[k + 1] = sums[k] + if taken { w } else { -w };
    }
    sums[0] = 0;
}

/// Path-based perceptron predictor structure.
#[derive(Debug, Clone)]
pub struct PathPerceptronPredictor {
    /// Shared weight rows.
    weights: WeightTable,
    /// Per-thread path state.
    threads: Vec<PathThread>,
    /// Address bits dropped before row selection.
    inst_shift: u32,
    /// Training threshold.
    theta: i32,
}

impl PathPerceptronPredictor {
    /// Creates a path-based predictor with zeroed weights and sums.
    ///
    /// Rows are always selected by `(pc >> inst_shift) mod table_size`; the
    /// history is always speculative.
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

        let ring_len = (2 * (config.history_length as usize + 1)).next_power_of_two();
        let theta = config.theta();
        debug!(
            rows = config.table_size,
            history = config.history_length,
            weight_bits = config.weight_bits,
            theta,
            ring_len,
            "path perceptron predictor initialised"
        );

        Ok(Self {
            weights: WeightTable::new(
                config.table_size,
                config.history_length,
                config.weight_bits,
            ),
            threads: vec![PathThread::new(config.history_length, ring_len); num_threads],
            inst_shift,
            theta,
        })
    }

    fn row(&self, pc: u64) -> usize {
        ((pc >> self.inst_shift) % self.weights.rows() as u64) as usize
    }

    fn history_length(&self) -> usize {
        self.weights.history_length()
    }

    /// Output the next lookup on `tid` would see for `pc`.
    pub fn output(&self, tid: ThreadId, pc: u64) -> i32 {
        self.weights.bias(self.row(pc)) + self.threads[tid].sr[self.history_length()]
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
        &self.threads[tid].history
    }

    /// Speculative partial sums of one thread.
    pub fn speculative_sums(&self, tid: ThreadId) -> &[i32] {
        &self.threads[tid].sr
    }

    /// Resolved partial sums of one thread.
    pub fn resolved_sums(&self, tid: ThreadId) -> &[i32] {
        &self.threads[tid].r
    }

    /// Trains the weights that produced a prediction.
    fn train(&mut self, tid: ThreadId, record: &DirectionRecord, taken: bool) {
        self.weights.train(record.row, 0, taken);
        for j in 1..=self.history_length() {
            let Some(older) = self.threads[tid].older(record.path_head, j as u64) else {
                break;
            };
            let row = self.row(older);
            let agree = outcome_at(record.history, (j - 1) as u32) == taken;
            self.weights.train(row, j, agree);
        }
    }
}

impl DirectionPredictor for PathPerceptronPredictor {
    fn lookup(&mut self, tid: ThreadId, pc: u64) -> (bool, DirectionRecord) {
        debug_assert!(tid < self.threads.len(), "thread {tid} out of range");
        let row = self.row(pc);
        let h = self.history_length();
        let thread = &mut self.threads[tid];

        let output = self.weights.bias(row) + thread.sr[h];
        let predicted = output >= 0;
        let record = DirectionRecord {
            row,
            output,
            history: thread.history.speculative.snapshot(),
            predicted,
            path_head: thread.head,
        };

        advance(&mut thread.sr, &self.weights, row, predicted);
        thread.history.speculative.shift_in(predicted);
        thread.push_path(pc);
        (predicted, record)
    }

    fn btb_miss(&mut self, tid: ThreadId, record: &mut DirectionRecord) {
        if record.predicted {
            let thread = &mut self.threads[tid];
            let h = thread.sr.len() - 1;
            for k in 0..h {
                thread.sr[k + 1] -= 2 * self.weights.weight(record.row, h - k);
            }
            thread.history.speculative.restore(record.history << 1);
        }
        record.predicted = false;
    }

    /// Advances the resolved sums and history with the actual outcome, then
    /// trains under the same gate as the global perceptron.
    ///
    /// A squashed resolution also rewinds the speculative path to this
    /// branch and restarts the speculative sums from the resolved ones.
    fn update(
        &mut self,
        tid: ThreadId,
        pc: u64,
        record: DirectionRecord,
        taken: bool,
        squashed: bool,
    ) {
        let thread = &mut self.threads[tid];
        advance(&mut thread.r, &self.weights, record.row, taken);
        thread.history.resolved.shift_in(taken);

        if squashed {
            thread
                .history
                .speculative
                .restore((record.history << 1) | u64::from(taken));
            thread.head = record.path_head;
            thread.push_path(pc);
            thread.sr.copy_from_slice(&thread.r);
            trace!(tid, pc, y = record.output, taken, "path perceptron state repaired");
        }

        if squashed || record.output.abs() <= self.theta {
            self.train(tid, &record, taken);
        }
    }

    fn squash(&mut self, tid: ThreadId, record: DirectionRecord) {
        let thread = &mut self.threads[tid];
        thread.history.speculative.restore(record.history);
        thread.head = record.path_head;
        thread.sr.copy_from_slice(&thread.r);
    }
}
