//! Weight Table Tests.
//!
//! Verifies the perceptron output sum, per-row training and saturation at
//! the range implied by the weight width.

use neurobp_core::bru::weights::WeightTable;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case(8, (-128, 127))]
#[case(4, (-8, 7))]
#[case(2, (-2, 1))]
#[case(16, (-32768, 32767))]
fn range_follows_weight_bits(#[case] bits: u32, #[case] range: (i32, i32)) {
    assert_eq!(WeightTable::new(1, 4, bits).range(), range);
}

#[test]
fn zeroed_table_outputs_zero() {
    let table = WeightTable::new(4, 8, 8);
    assert_eq!(table.rows(), 4);
    assert_eq!(table.history_length(), 8);
    for row in 0..4 {
        assert_eq!(table.output(row, 0b1010_1010), 0);
        assert_eq!(table.row(row), &[0; 9]);
    }
}

#[test]
fn train_row_moves_bias_and_history_weights() {
    let mut table = WeightTable::new(2, 4, 8);
    // History 0b0011: bits 0 and 1 taken, bits 2 and 3 not taken.
    table.train_row(1, 0b0011, true);
    assert_eq!(table.row(1), &[1, 1, 1, -1, -1]);
    assert_eq!(table.row(0), &[0; 5], "other rows untouched");
    // y = 1 + (1 + 1) - (-1) - (-1) = 5
    assert_eq!(table.output(1, 0b0011), 5);
    assert_eq!(table.bias(1), 1);
    assert_eq!(table.weight(1, 3), -1);
}

#[test]
fn output_with_opposite_history_cancels() {
    let mut table = WeightTable::new(1, 4, 8);
    table.train_row(0, 0b1111, true);
    assert_eq!(table.output(0, 0b1111), 5);
    assert_eq!(table.output(0, 0b0000), -3);
}

#[test]
fn weights_saturate_at_max_and_min() {
    let mut table = WeightTable::new(1, 2, 4);
    for _ in 0..20 {
        table.train(0, 0, true);
        table.train(0, 1, false);
    }
    assert_eq!(table.bias(0), 7);
    assert_eq!(table.weight(0, 1), -8);
}

#[test]
fn reset_zeroes_everything() {
    let mut table = WeightTable::new(2, 3, 8);
    table.train_row(0, 0b101, false);
    table.reset();
    assert_eq!(table.row(0), &[0; 4]);
}

proptest! {
    #[test]
    fn training_never_leaves_range(bits in 2u32..=10, steps in prop::collection::vec((any::<u64>(), any::<bool>()), 0..600)) {
        let mut table = WeightTable::new(1, 6, bits);
        let (min, max) = table.range();
        for (history, taken) in steps {
            table.train_row(0, history, taken);
        }
        for &w in table.row(0) {
            prop_assert!((min..=max).contains(&i32::from(w)));
        }
    }
}
