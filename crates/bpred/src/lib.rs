//! Neural branch prediction library.
//!
//! This crate implements the front-end branch prediction unit of a pipeline simulator:
//! 1. **Direction:** Global-history perceptron, path-based perceptron, and static predictors.
//! 2. **Targets:** Set-associative branch target buffer with true LRU replacement.
//! 3. **Returns:** Per-thread circular return-address stacks with checkpoint recovery.
//! 4. **Façade:** Lookup, resolution, squash and recovery through caller-owned handles.
//! 5. **Configuration:** JSON-deserializable geometry with eager validation, plus statistics.
//!
//! # Examples
//!
//! ```
//! use neurobp_core::bru::BranchClass;
//! use neurobp_core::{BranchUnit, PredictorConfig};
//!
//! let mut bp = BranchUnit::new(&PredictorConfig::default()).unwrap();
//!
//! // A cold conditional branch has no target yet, so it is predicted not-taken.
//! let p = bp.lookup(0, 0x1000, BranchClass::Conditional, false, false);
//! assert!(!p.taken);
//!
//! // Resolving it taken installs the target in the BTB.
//! bp.update(p.handle, true, 0x2000, true);
//! assert_eq!(bp.btb().lookup(0x1000).map(|e| e.target()), Some(0x2000));
//! ```

/// Shared types (thread identifiers, configuration errors).
pub mod common;
/// Predictor configuration (defaults, enums, validation).
pub mod config;
/// Branch prediction unit (direction predictors, BTB, RAS, façade).
pub mod bru;
/// Prediction statistics collection.
pub mod stats;

/// Root configuration type; use `PredictorConfig::default()` or `PredictorConfig::from_json`.
pub use crate::config::PredictorConfig;
/// Branch prediction unit; construct with `BranchUnit::new`.
pub use crate::bru::BranchUnit;
/// Error returned for rejected configurations.
pub use crate::common::ConfigError;
