//! Path-Based Perceptron Tests.
//!
//! Verifies that the speculative partial sums always equal the dot product
//! over the recent path, that training walks the path rows, and that
//! squashes and squashed resolutions restart the speculative sums from the
//! resolved ones.

use neurobp_core::bru::DirectionPredictor;
use neurobp_core::bru::path::PathPerceptronPredictor;
use neurobp_core::config::{PerceptronConfig, PerceptronIndexing};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::perceptron_config;

fn predictor(rows: usize, history: u32) -> PathPerceptronPredictor {
    PathPerceptronPredictor::new(&perceptron_config(rows, history), 1, 2).unwrap()
}

fn row_of(pc: u64, rows: usize) -> usize {
    ((pc >> 2) % rows as u64) as usize
}

/// Output predicted from scratch: the bias of `pc`'s row plus, for the
/// `j`-th most recent branch, `+/- W[row(path_j), j]` by its predicted
/// direction. `recent` is ordered oldest first.
fn expected_output(
    bp: &PathPerceptronPredictor,
    rows: usize,
    pc: u64,
    recent: &[(u64, bool)],
) -> i32 {
    let w = bp.weights();
    let h = w.history_length();
    let mut y = w.bias(row_of(pc, rows));
    for (j, &(older, taken)) in recent.iter().rev().take(h).enumerate() {
        let weight = w.weight(row_of(older, rows), j + 1);
        y += if taken { weight } else { -weight };
    }
    y
}

/// Two-branch path A (row 0) then B (row 1), both resolved taken in order.
/// Leaves `W[0] = [1, 1, 0]`, `W[1] = [1, 0, 0]` and all sums zero.
fn trained() -> PathPerceptronPredictor {
    let mut bp = predictor(4, 2);
    let (_, a) = bp.lookup(0, 0x0);
    let (_, b) = bp.lookup(0, 0x4);
    bp.update(0, 0x0, a, true, false);
    bp.update(0, 0x4, b, true, false);
    bp
}

#[test]
fn cold_lookup_predicts_taken() {
    let mut bp = predictor(4, 2);
    assert_eq!(bp.theta(), 18);
    let (taken, record) = bp.lookup(0, 0x0);
    assert!(taken);
    assert_eq!(record.output(), 0);
    assert_eq!(bp.speculative_sums(0), &[0, 0, 0]);
    assert_eq!(bp.history(0).speculative.snapshot(), 0b1);
}

#[test]
fn training_walks_the_path_rows() {
    let mut bp = predictor(4, 2);
    let (_, a) = bp.lookup(0, 0x0);
    let (_, b) = bp.lookup(0, 0x4);
    assert_eq!(b.history(), 0b1);

    // A has no older path: only its bias moves.
    bp.update(0, 0x0, a, true, false);
    assert_eq!(bp.weights().row(0), &[1, 0, 0]);

    // B trains its bias and W[row(A), 1]; A was taken, agreeing with B.
    bp.update(0, 0x4, b, true, false);
    assert_eq!(bp.weights().row(1), &[1, 0, 0]);
    assert_eq!(bp.weights().row(0), &[1, 1, 0]);
}

#[test]
fn resolved_sums_advance_on_every_update() {
    let mut bp = predictor(4, 2);
    let (_, a) = bp.lookup(0, 0x0);
    bp.update(0, 0x0, a, true, false);
    // W[0] = [1, 0, 0] after training, but R advanced with the old weights.
    assert_eq!(bp.resolved_sums(0), &[0, 0, 0]);
    assert_eq!(bp.history(0).resolved.snapshot(), 0b1);

    let (_, b) = bp.lookup(0, 0x0);
    bp.update(0, 0x0, b, false, true);
    assert_eq!(bp.history(0).resolved.snapshot(), 0b10);
}

#[test]
fn squashed_resolution_restarts_from_resolved_state() {
    let mut bp = predictor(4, 2);
    let (_, a) = bp.lookup(0, 0x0);
    let (_, _b) = bp.lookup(0, 0x4);
    let history = a.history();
    bp.update(0, 0x0, a, false, true);

    assert_eq!(bp.speculative_sums(0), bp.resolved_sums(0));
    assert_eq!(bp.history(0).speculative.snapshot(), history << 1);
}

#[test]
fn squash_rolls_back_sums_and_history() {
    let mut bp = trained();
    let resolved = bp.resolved_sums(0).to_vec();
    let (taken, b) = bp.lookup(0, 0x0);
    assert!(taken);
    assert_eq!(b.output(), 1);
    let history = b.history();
    assert_eq!(bp.speculative_sums(0), &[0, 0, 1]);

    bp.squash(0, b);
    assert_eq!(bp.speculative_sums(0), resolved.as_slice());
    assert_eq!(bp.history(0).speculative.snapshot(), history);
}

#[test]
fn btb_miss_flips_taken_contribution() {
    let mut bp = trained();
    let before = bp.speculative_sums(0).to_vec();
    let (taken, mut record) = bp.lookup(0, 0x0);
    assert!(taken);
    bp.btb_miss(0, &mut record);
    assert!(!record.predicted());

    let w = bp.weights();
    let h = before.len() - 1;
    let mut expected = vec![0; h + 1];
    for k in 0..h {
        expected[k + 1] = before[k] - w.weight(0, h - k);
    }
    assert_eq!(bp.speculative_sums(0), expected.as_slice());
    assert_eq!(expected, vec![0, 0, -1]);
    assert_eq!(
        bp.history(0).speculative.snapshot(),
        (record.history() << 1) & 0b11
    );
}

#[test]
fn config_indexing_and_speculation_are_ignored() {
    let config = PerceptronConfig {
        speculative_history: false,
        indexing: PerceptronIndexing::Global,
        ..perceptron_config(8, 3)
    };
    let mut bp = PathPerceptronPredictor::new(&config, 1, 2).unwrap();
    let (_, first) = bp.lookup(0, 13 << 2);
    let (_, second) = bp.lookup(0, 13 << 2);
    assert_eq!(first.row(), 5);
    assert_eq!(second.row(), 5, "history is not folded into the row");
    assert_eq!(bp.history(0).speculative.snapshot(), 0b11);
}

proptest! {
    #[test]
    fn sums_match_dot_product_over_path(
        training in prop::collection::vec((0u64..32, any::<bool>()), 0..60),
        path in prop::collection::vec(0u64..32, 4..12),
        next in 0u64..32,
    ) {
        let rows = 8;
        let mut bp = predictor(rows, 4);
        for (slot, taken) in training {
            let pc = slot << 2;
            let (_, record) = bp.lookup(0, pc);
            bp.update(0, pc, record, taken, true);
        }

        let mut recent = Vec::new();
        for slot in path {
            let pc = slot << 2;
            let expected = expected_output(&bp, rows, pc, &recent);
            let (taken, record) = bp.lookup(0, pc);
            if recent.len() >= 4 {
                prop_assert_eq!(record.output(), expected);
            }
            recent.push((pc, taken));
        }
        let expected = expected_output(&bp, rows, next << 2, &recent);
        prop_assert_eq!(bp.output(0, next << 2), expected);
    }
}
