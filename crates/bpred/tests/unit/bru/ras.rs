//! Return Address Stack (RAS) Tests.
//!
//! Verifies LIFO order, wrap-around on overflow, the disabled zero-sized
//! stack and checkpoint recovery.

use neurobp_core::bru::ras::Ras;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Push / pop
// ══════════════════════════════════════════════════════════

#[test]
fn new_stack_is_empty() {
    let mut ras = Ras::new(8);
    assert!(ras.is_empty());
    assert_eq!(ras.capacity(), 8);
    assert_eq!(ras.tos(), 7, "first push lands in slot 0");
    assert_eq!(ras.pop(), None);
    assert_eq!(ras.top(), None);
}

#[test]
fn lifo_order() {
    let mut ras = Ras::new(8);
    ras.push(0x1004);
    ras.push(0x2004);
    assert_eq!(ras.tos(), 1);
    assert_eq!(ras.top(), Some(0x2004));
    assert_eq!(ras.pop(), Some(0x2004));
    assert_eq!(ras.pop(), Some(0x1004));
    assert_eq!(ras.pop(), None);
}

#[test]
fn overflow_overwrites_oldest() {
    let mut ras = Ras::new(2);
    ras.push(1);
    ras.push(2);
    ras.push(3);
    assert_eq!(ras.depth(), 2);
    assert_eq!(ras.pop(), Some(3));
    assert_eq!(ras.pop(), Some(2));
    assert_eq!(ras.pop(), None, "entry 1 was overwritten");
}

#[test]
fn zero_sized_stack_is_disabled() {
    let mut ras = Ras::new(0);
    ras.push(0x1000);
    assert!(ras.is_empty());
    assert_eq!(ras.pop(), None);
    let (target, checkpoint) = ras.lookup(true);
    assert_eq!(target, None);
    ras.recover(checkpoint);
    assert!(ras.is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. Lookup and recovery
// ══════════════════════════════════════════════════════════

#[test]
fn lookup_pops_only_returns() {
    let mut ras = Ras::new(4);
    ras.push(0x1004);
    let (target, _) = ras.lookup(false);
    assert_eq!(target, None);
    assert_eq!(ras.depth(), 1);
    let (target, checkpoint) = ras.lookup(true);
    assert_eq!(target, Some(0x1004));
    assert_eq!(checkpoint.depth(), 1, "checkpoint taken before the pop");
    assert!(ras.is_empty());
}

#[test]
fn lookup_predicts_nested_returns_in_reverse_call_order() {
    let mut ras = Ras::new(8);
    ras.push(0x1000);
    ras.push(0x2000);
    assert_eq!(ras.tos(), 1);

    let (target, checkpoint) = ras.lookup(true);
    assert_eq!(target, Some(0x2000));
    assert_eq!(checkpoint.tos(), 1);
    assert_eq!(ras.tos(), 0);

    let (target, checkpoint) = ras.lookup(true);
    assert_eq!(target, Some(0x1000));
    assert_eq!(checkpoint.tos(), 0);
    assert_eq!(ras.tos(), 7, "tos wraps below slot 0");
    assert!(ras.is_empty());
}

#[test]
fn recover_undoes_wrong_path_pop() {
    let mut ras = Ras::new(4);
    ras.push(0x1004);
    ras.push(0x2004);
    let (_, checkpoint) = ras.lookup(true);
    let _ = ras.pop();
    assert!(ras.is_empty());

    ras.recover(checkpoint);
    assert_eq!(ras.checkpoint(), checkpoint);
    assert_eq!(ras.pop(), Some(0x2004));
    assert_eq!(ras.pop(), Some(0x1004));
}

#[test]
fn recover_is_idempotent() {
    let mut ras = Ras::new(4);
    ras.push(0x10);
    let checkpoint = ras.checkpoint();
    ras.push(0x20);
    ras.recover(checkpoint);
    let once = ras.checkpoint();
    ras.recover(checkpoint);
    assert_eq!(ras.checkpoint(), once);
    assert_eq!(ras.top(), Some(0x10));
}

#[test]
fn recover_after_wrong_path_push_keeps_overwrite() {
    let mut ras = Ras::new(4);
    ras.push(0xA);
    ras.push(0xB);
    let (_, checkpoint) = ras.lookup(true);
    // Wrong-path call reuses B's slot.
    ras.push(0xC);
    ras.recover(checkpoint);
    assert_eq!(ras.depth(), 2);
    assert_eq!(ras.top(), Some(0xC), "recovery restores the index only");
}
