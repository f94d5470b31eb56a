//! Branch Target Buffer (BTB).
//!
//! The BTB is a set-associative cache that stores the last taken target of
//! control flow instructions, letting fetch redirect before the instruction is
//! decoded. Each set keeps its ways on a doubly-linked recency chain running
//! from the most recently used way (head) to the least recently used one
//! (tail). Links are way indices into a flat entry array, so relinking is O(1)
//! and no entry ever refers outside its set.
//!
//! Only taken branches are written: a not-taken branch has no target worth
//! remembering.

use tracing::trace;

use super::BranchClass;
use crate::common::ConfigError;
use crate::config::BtbConfig;

/// End-of-chain marker for the recency links.
const NIL: u16 = u16::MAX;

/// An entry in the Branch Target Buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BtbEntry {
    /// Address of the branch being tracked.
    addr: u64,
    /// Instruction class recorded with the branch.
    class: BranchClass,
    /// Last destination of the branch when taken.
    target: u64,
    /// Set once the entry has been written.
    valid: bool,
    /// Next more recently used way, or `NIL` at the head.
    prev: u16,
    /// Next less recently used way, or `NIL` at the tail.
    next: u16,
}

impl BtbEntry {
    const fn empty(prev: u16, next: u16) -> Self {
        Self {
            addr: 0,
            class: BranchClass::Conditional,
            target: 0,
            valid: false,
            prev,
            next,
        }
    }

    /// Address of the tracked branch.
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// Class of the tracked branch.
    pub fn class(&self) -> BranchClass {
        self.class
    }

    /// Predicted target address.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Whether the entry holds a branch.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Branch Target Buffer structure.
#[derive(Debug, Clone)]
pub struct Btb {
    /// `sets * assoc` entries; set `s` occupies `s * assoc..(s + 1) * assoc`.
    entries: Vec<BtbEntry>,
    /// MRU way of each set.
    heads: Vec<u16>,
    /// LRU way of each set.
    tails: Vec<u16>,
    sets: usize,
    assoc: usize,
    inst_shift: u32,
}

impl Btb {
    /// Creates an empty BTB.
    ///
    /// Within every set, way 0 starts as the MRU entry and the last way as the
    /// LRU entry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] unless the set count and associativity are
    /// non-zero powers of two.
    pub fn new(config: &BtbConfig, inst_shift: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sets, assoc) = (config.sets, config.assoc);
        let mut btb = Self {
            entries: vec![BtbEntry::empty(NIL, NIL); sets * assoc],
            heads: vec![0; sets],
            tails: vec![0; sets],
            sets,
            assoc,
            inst_shift,
        };
        btb.flush();
        Ok(btb)
    }

    /// Number of sets.
    pub fn sets(&self) -> usize {
        self.sets
    }

    /// Ways per set.
    pub fn assoc(&self) -> usize {
        self.assoc
    }

    /// Set a branch address maps to.
    #[inline]
    pub fn set_index(&self, pc: u64) -> usize {
        ((pc >> self.inst_shift) as usize) & (self.sets - 1)
    }

    #[inline]
    fn ways(&self, set: usize) -> &[BtbEntry] {
        &self.entries[set * self.assoc..(set + 1) * self.assoc]
    }

    /// Looks up the entry tracking `pc`.
    ///
    /// # Returns
    ///
    /// A copy of the matching entry, or `None` on a miss. Lookups never change
    /// recency.
    pub fn lookup(&self, pc: u64) -> Option<BtbEntry> {
        self.ways(self.set_index(pc))
            .iter()
            .find(|e| e.valid && e.addr == pc)
            .copied()
    }

    /// Records the resolved target of a taken branch.
    ///
    /// On a hit the entry becomes MRU and its target is overwritten if it
    /// changed. On a miss the set's LRU entry is evicted, rewritten with the
    /// new branch and installed as MRU.
    pub fn update(&mut self, pc: u64, target: u64, class: BranchClass) {
        let set = self.set_index(pc);
        let base = set * self.assoc;
        let hit = self.ways(set).iter().position(|e| e.valid && e.addr == pc);

        let way = if self.assoc == 1 {
            0
        } else {
            let way = hit.unwrap_or(self.tails[set] as usize);
            self.touch(set, way);
            way
        };

        let entry = &mut self.entries[base + way];
        if hit.is_some() {
            if entry.target != target {
                entry.target = target;
            }
            entry.class = class;
        } else {
            if entry.valid {
                trace!(set, way, victim = entry.addr, pc, "btb eviction");
            }
            entry.addr = pc;
            entry.class = class;
            entry.target = target;
            entry.valid = true;
        }
    }

    /// Moves `way` to the MRU position of `set`.
    fn touch(&mut self, set: usize, way: usize) {
        let base = set * self.assoc;
        let head = self.heads[set];
        if head as usize == way {
            return;
        }

        let BtbEntry { prev, next, .. } = self.entries[base + way];
        debug_assert!(prev != next, "corrupt recency chain in set {set}");
        debug_assert!(prev != NIL, "non-head way {way} has no predecessor");

        // Splice out.
        self.entries[base + prev as usize].next = next;
        if next == NIL {
            self.tails[set] = prev;
        } else {
            self.entries[base + next as usize].prev = prev;
        }

        // Relink at the head.
        self.entries[base + way].prev = NIL;
        self.entries[base + way].next = head;
        self.entries[base + head as usize].prev = way as u16;
        self.heads[set] = way as u16;
    }

    /// Ways of `set` ordered from most to least recently used.
    ///
    /// A direct-mapped BTB keeps no recency state and reports its single way.
    pub fn recency(&self, set: usize) -> Vec<usize> {
        let base = set * self.assoc;
        let mut order = Vec::with_capacity(self.assoc);
        let mut way = self.heads[set];
        while way != NIL && order.len() < self.assoc {
            order.push(way as usize);
            way = self.entries[base + way as usize].next;
        }
        debug_assert!(way == NIL, "recency chain of set {set} is cyclic");
        order
    }

    /// Addresses held by `set`, most recently used first. Empty ways are skipped.
    pub fn lru_order(&self, set: usize) -> Vec<u64> {
        let ways = self.ways(set);
        self.recency(set)
            .into_iter()
            .filter(|&w| ways[w].valid)
            .map(|w| ways[w].addr)
            .collect()
    }

    /// Returns the raw entry at `way` of `set`.
    pub fn entry(&self, set: usize, way: usize) -> BtbEntry {
        self.ways(set)[way]
    }

    /// Invalidates every entry and resets the recency chains.
    pub fn flush(&mut self) {
        for set in 0..self.sets {
            for way in 0..self.assoc {
                let prev = if way == 0 { NIL } else { (way - 1) as u16 };
                let next = if way + 1 == self.assoc { NIL } else { (way + 1) as u16 };
                self.entries[set * self.assoc + way] = BtbEntry::empty(prev, next);
            }
            self.heads[set] = 0;
            self.tails[set] = (self.assoc - 1) as u16;
        }
    }
}
