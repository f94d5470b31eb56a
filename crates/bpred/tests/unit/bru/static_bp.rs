//! Static Predictor Tests.

use neurobp_core::bru::DirectionPredictor;
use neurobp_core::bru::static_bp::StaticPredictor;

/// Static predictor always predicts taken.
#[test]
fn static_always_taken() {
    let mut bp = StaticPredictor::new();
    for pc in [0x0, 0x1000, u64::MAX] {
        let (taken, record) = bp.lookup(0, pc);
        assert!(taken);
        assert!(record.predicted());
    }
}

/// Training does not change the prediction.
#[test]
fn static_ignores_training() {
    let mut bp = StaticPredictor::new();
    for _ in 0..10 {
        let (_, record) = bp.lookup(0, 0x1000);
        bp.update(0, 0x1000, record, false, true);
    }
    assert!(bp.lookup(0, 0x1000).0);
}

#[test]
fn static_btb_miss_reports_not_taken() {
    let mut bp = StaticPredictor::new();
    let (_, mut record) = bp.lookup(3, 0x1000);
    bp.btb_miss(3, &mut record);
    assert!(!record.predicted());
    bp.squash(3, record);
}
