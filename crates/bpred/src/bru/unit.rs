//! Branch Prediction Unit façade.
//!
//! Composes the direction predictor, the BTB and the per-thread return
//! stacks behind the three calls fetch makes:
//! 1. **Lookup:** Predict direction and target, returning a handle.
//! 2. **Resolution:** `update` (commit or squashed resolution) or `squash`
//!    (discard without resolution) consumes the handle.
//! 3. **Recovery:** `recover` rewinds a thread's return stack.
//!
//! A handle is moved into the call that resolves it, so every prediction
//! reaches exactly one terminal state: resolving one twice does not compile.

use tracing::{debug, trace};

use super::{
    BranchClass, DirectionUnit,
    branch_predictor::{DirectionPredictor, DirectionRecord},
    btb::Btb,
    ras::{Ras, RasCheckpoint},
};
use crate::common::{ConfigError, ThreadId};
use crate::config::PredictorConfig;
use crate::stats::BpStats;

/// Structure that produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// Return address popped from the return stack.
    Ras,
    /// Target from the BTB; direction known to be taken.
    Btb,
    /// Direction from the direction predictor, target from the BTB.
    Direction,
}

/// Caller-owned state of one in-flight prediction.
///
/// Returned by [`BranchUnit::lookup`] and consumed by [`BranchUnit::update`]
/// or [`BranchUnit::squash`].
#[derive(Debug)]
pub struct PredictionHandle {
    tid: ThreadId,
    pc: u64,
    class: BranchClass,
    source: PredictionSource,
    predicted_taken: bool,
    predicted_target: Option<u64>,
    direction: Option<DirectionRecord>,
    ras: RasCheckpoint,
}

impl PredictionHandle {
    /// Thread the prediction was made for.
    pub fn tid(&self) -> ThreadId {
        self.tid
    }

    /// Address of the predicted instruction.
    pub fn pc(&self) -> u64 {
        self.pc
    }

    /// Class of the predicted instruction.
    pub fn class(&self) -> BranchClass {
        self.class
    }

    /// Structure that produced the prediction.
    pub fn source(&self) -> PredictionSource {
        self.source
    }

    /// Predicted direction.
    pub fn predicted_taken(&self) -> bool {
        self.predicted_taken
    }

    /// Predicted target, if one was known.
    pub fn predicted_target(&self) -> Option<u64> {
        self.predicted_target
    }

    /// Return stack state before this lookup; pass it to
    /// [`BranchUnit::recover`] when this branch is found mispredicted.
    pub fn ras_checkpoint(&self) -> RasCheckpoint {
        self.ras
    }

    /// Direction predictor record, present for conditional branches.
    pub fn direction(&self) -> Option<&DirectionRecord> {
        self.direction.as_ref()
    }
}

/// Result of a lookup.
#[derive(Debug)]
pub struct Prediction {
    /// Predicted direction.
    pub taken: bool,
    /// Predicted target; `None` when not taken or when no target is known.
    pub target: Option<u64>,
    /// Handle to resolve this prediction with.
    pub handle: PredictionHandle,
}

/// Branch prediction unit.
#[derive(Debug, Clone)]
pub struct BranchUnit {
    /// Shared direction predictor.
    direction: DirectionUnit,
    /// Shared target buffer.
    btb: Btb,
    /// One return stack per thread.
    ras: Vec<Ras>,
    /// Prediction counters.
    stats: BpStats,
    /// Length of a call; the return address is `pc + inst_bytes`.
    inst_bytes: u64,
}

impl BranchUnit {
    /// Creates a prediction unit from a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by
    /// [`PredictorConfig::validate`]; nothing is built from an invalid
    /// configuration.
    pub fn new(config: &PredictorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let direction = DirectionUnit::new(config)?;
        let btb = Btb::new(&config.btb, config.inst_shift)?;

        debug!(
            direction = ?config.direction,
            threads = config.num_threads,
            btb_sets = config.btb.sets,
            btb_assoc = config.btb.assoc,
            ras = config.ras.size,
            "branch unit initialised"
        );

        Ok(Self {
            direction,
            btb,
            ras: vec![Ras::new(config.ras.size); config.num_threads],
            stats: BpStats::default(),
            inst_bytes: config.inst_bytes,
        })
    }

    /// Predicts the outcome and target of a control-flow instruction.
    ///
    /// Returns with a non-empty return stack are predicted from the stack
    /// alone. Calls push their fall-through address; an instruction that
    /// both returns and calls pops first, then pushes. Unconditional and
    /// indirect jumps are predicted taken with the BTB target. Conditional
    /// branches take their direction from the direction predictor, but are
    /// predicted not-taken when the BTB has no target for them.
    ///
    /// # Arguments
    ///
    /// * `tid` - Hardware thread issuing the fetch
    /// * `pc` - Program counter of the instruction
    /// * `class` - Pre-decoded control-flow class
    /// * `is_call` - The instruction links a return address
    /// * `is_return` - The instruction returns through the link register
    pub fn lookup(
        &mut self,
        tid: ThreadId,
        pc: u64,
        class: BranchClass,
        is_call: bool,
        is_return: bool,
    ) -> Prediction {
        debug_assert!(tid < self.ras.len(), "thread {tid} out of range");
        self.stats.lookups += 1;

        let ras = &mut self.ras[tid];
        let (ras_target, checkpoint) = ras.lookup(is_return);
        if ras_target.is_some() {
            self.stats.ras_pops += 1;
        }
        if is_call && ras.capacity() > 0 {
            ras.push(pc.wrapping_add(self.inst_bytes));
            self.stats.ras_pushes += 1;
        }
        if let Some(target) = ras_target {
            return Prediction {
                taken: true,
                target: Some(target),
                handle: PredictionHandle {
                    tid,
                    pc,
                    class,
                    source: PredictionSource::Ras,
                    predicted_taken: true,
                    predicted_target: Some(target),
                    direction: None,
                    ras: checkpoint,
                },
            };
        }

        let btb_target = self.btb.lookup(pc).map(|e| e.target());
        let (taken, target, source, direction) = match class {
            BranchClass::Unconditional | BranchClass::Indirect => {
                (true, btb_target, PredictionSource::Btb, None)
            }
            BranchClass::Conditional => {
                let (mut taken, mut record) = self.direction.lookup(tid, pc);
                if taken && btb_target.is_none() {
                    self.direction.btb_miss(tid, &mut record);
                    taken = false;
                }
                let target = if taken { btb_target } else { None };
                (taken, target, PredictionSource::Direction, Some(record))
            }
        };

        Prediction {
            taken,
            target,
            handle: PredictionHandle {
                tid,
                pc,
                class,
                source,
                predicted_taken: taken,
                predicted_target: target,
                direction,
                ras: checkpoint,
            },
        }
    }

    /// Resolves a prediction with the branch's actual outcome.
    ///
    /// Trains the direction predictor (for conditional branches) and records
    /// the target of taken branches in the BTB. Returns predicted by the
    /// return stack change no predictor state. The return stack itself is
    /// rewound separately through [`BranchUnit::recover`].
    ///
    /// # Arguments
    ///
    /// * `handle` - Handle from the matching lookup
    /// * `taken` - Actual direction
    /// * `target` - Actual target (ignored when not taken)
    /// * `squashed` - The branch was mispredicted and younger speculative
    ///   work has been discarded
    pub fn update(&mut self, handle: PredictionHandle, taken: bool, target: u64, squashed: bool) {
        let PredictionHandle {
            tid,
            pc,
            class,
            source,
            predicted_taken,
            predicted_target,
            direction,
            ..
        } = handle;

        let addr_correct = if taken {
            predicted_taken && predicted_target == Some(target)
        } else {
            !predicted_taken
        };
        self.record(class, source, predicted_taken == taken, addr_correct);

        if !addr_correct {
            trace!(
                tid,
                pc,
                ?source,
                predicted_taken,
                taken,
                squashed,
                "branch mispredicted"
            );
        }

        if source == PredictionSource::Ras {
            return;
        }

        if let Some(record) = direction {
            self.direction.update(tid, pc, record, taken, squashed);
        }

        if taken {
            self.btb.update(pc, target, class);
        }
    }

    /// Updates the counters for one resolution.
    fn record(
        &mut self,
        class: BranchClass,
        source: PredictionSource,
        dir_correct: bool,
        addr_correct: bool,
    ) {
        let stats = &mut self.stats;
        stats.updates += 1;
        if dir_correct {
            stats.dir_hits += 1;
        } else {
            stats.misses += 1;
        }
        if addr_correct {
            stats.addr_hits += 1;
        }

        if source == PredictionSource::Ras {
            stats.used_ras += 1;
            if addr_correct {
                stats.ras_hits += 1;
            }
        }

        if class == BranchClass::Indirect {
            stats.jr_seen += 1;
            if addr_correct {
                stats.jr_hits += 1;
            }
            if source != PredictionSource::Ras {
                stats.jr_non_ras_seen += 1;
                if addr_correct {
                    stats.jr_non_ras_hits += 1;
                }
            }
        }
    }

    /// Discards a prediction that will never resolve, rolling back the
    /// speculative direction state it created.
    pub fn squash(&mut self, handle: PredictionHandle) {
        trace!(tid = handle.tid, pc = handle.pc, "prediction squashed");
        if let Some(record) = handle.direction {
            self.direction.squash(handle.tid, record);
        }
    }

    /// Rewinds a thread's return stack to a checkpoint taken at lookup.
    pub fn recover(&mut self, tid: ThreadId, checkpoint: RasCheckpoint) {
        trace!(tid, tos = checkpoint.tos(), "return stack recovered");
        self.ras[tid].recover(checkpoint);
    }

    /// Pushes a return address for a call detected outside [`BranchUnit::lookup`].
    pub fn push_return(&mut self, tid: ThreadId, addr: u64) {
        let ras = &mut self.ras[tid];
        if ras.capacity() > 0 {
            ras.push(addr);
            self.stats.ras_pushes += 1;
        }
    }

    /// Prediction counters.
    pub fn stats(&self) -> &BpStats {
        &self.stats
    }

    /// Clears the prediction counters, keeping all learned state.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Direction predictor.
    pub fn direction(&self) -> &DirectionUnit {
        &self.direction
    }

    /// Branch target buffer.
    pub fn btb(&self) -> &Btb {
        &self.btb
    }

    /// Return stack of one thread.
    pub fn ras(&self, tid: ThreadId) -> &Ras {
        &self.ras[tid]
    }
}
