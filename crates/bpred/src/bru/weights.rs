//! Perceptron Weight Table.
//!
//! Rows of signed saturating weights, one row per perceptron. Column 0 of each
//! row is the bias weight; column `i + 1` pairs with history bit `i`. The table
//! is stored flat so a row is a contiguous slice.

use super::history::outcome_at;

/// Table of saturating perceptron weights.
#[derive(Debug, Clone)]
pub struct WeightTable {
    /// Flattened `rows * row_size` weights.
    weights: Vec<i16>,
    /// Number of perceptrons.
    rows: usize,
    /// History length plus the bias column.
    row_size: usize,
    /// Smallest representable weight.
    min: i32,
    /// Largest representable weight.
    max: i32,
}

impl WeightTable {
    /// Creates a zeroed table of `rows` perceptrons over `history_length`
    /// history bits, each weight `weight_bits` wide.
    pub fn new(rows: usize, history_length: u32, weight_bits: u32) -> Self {
        debug_assert!((2..=16).contains(&weight_bits));
        let row_size = history_length as usize + 1;
        let max = (1i32 << (weight_bits - 1)) - 1;
        Self {
            weights: vec![0; rows * row_size],
            rows,
            row_size,
            min: -max - 1,
            max,
        }
    }

    /// Number of perceptrons.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of history weights per row (excluding the bias).
    pub fn history_length(&self) -> usize {
        self.row_size - 1
    }

    /// Inclusive weight range `(min, max)`.
    pub fn range(&self) -> (i32, i32) {
        (self.min, self.max)
    }

    /// Returns the weights of one perceptron, bias first.
    pub fn row(&self, row: usize) -> &[i16] {
        let base = row * self.row_size;
        &self.weights[base..base + self.row_size]
    }

    /// Returns one weight; column 0 is the bias.
    #[inline]
    pub fn weight(&self, row: usize, col: usize) -> i32 {
        i32::from(self.weights[row * self.row_size + col])
    }

    /// Returns the bias weight of a perceptron.
    #[inline]
    pub fn bias(&self, row: usize) -> i32 {
        self.weight(row, 0)
    }

    /// Perceptron output `y = bias + sum(x_i * w_i)` with `x_i = +1` for a
    /// taken history bit and `-1` for a not-taken one.
    pub fn output(&self, row: usize, history: u64) -> i32 {
        let weights = self.row(row);
        let mut y = i32::from(weights[0]);
        for (i, &w) in weights[1..].iter().enumerate() {
            if outcome_at(history, i as u32) {
                y += i32::from(w);
            } else {
                y -= i32::from(w);
            }
        }
        y
    }

    /// Moves one weight a single step toward agreement: incremented when
    /// `agree`, decremented otherwise, saturating at the table range.
    #[inline]
    pub fn train(&mut self, row: usize, col: usize, agree: bool) {
        let idx = row * self.row_size + col;
        let step = if agree { 1 } else { -1 };
        self.weights[idx] = (i32::from(self.weights[idx]) + step).clamp(self.min, self.max) as i16;
    }

    /// Trains a whole row against one resolved outcome.
    ///
    /// The bias always moves toward `taken`; history weight `i` moves up when
    /// history bit `i` matches `taken` and down otherwise.
    pub fn train_row(&mut self, row: usize, history: u64, taken: bool) {
        self.train(row, 0, taken);
        for i in 0..self.history_length() {
            self.train(row, i + 1, outcome_at(history, i as u32) == taken);
        }
    }

    /// Zeroes every weight.
    pub fn reset(&mut self) {
        self.weights.fill(0);
    }
}
