//! Configuration error definitions.
//!
//! The predictor has exactly one recoverable failure mode: being asked to build
//! itself from an inconsistent configuration. Everything else it encounters at
//! run time (BTB misses, an empty return stack, low-confidence outputs) is a
//! normal outcome and never surfaces as an error.

use thiserror::Error;

/// Reasons a predictor configuration is rejected at construction.
///
/// All checks run eagerly in [`PredictorConfig::validate`](crate::config::PredictorConfig::validate);
/// no structure is ever built from a configuration that fails them.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A table that must hold at least one entry was configured empty.
    #[error("{what} must be non-zero")]
    ZeroSized {
        /// Name of the offending parameter.
        what: &'static str,
    },

    /// A size that is used as a bit mask is not a power of two.
    #[error("{what} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending parameter.
        what: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The global history is too short to index the global perceptron table.
    #[error("global perceptron table of {rows} rows needs at least {needed} history bits, got {history}")]
    HistoryTooShort {
        /// Configured number of perceptron rows.
        rows: usize,
        /// Bits needed to index every row.
        needed: u32,
        /// Configured history length.
        history: u32,
    },

    /// The history length does not fit a history register.
    #[error("history length must be in 1..=64, got {0}")]
    HistoryWidth(u32),

    /// The weight width is outside the supported range.
    #[error("weight width must be in 2..=16 bits, got {0}")]
    WeightBits(u32),

    /// The instruction shift would discard the whole address.
    #[error("instruction shift must be below 64, got {0}")]
    InstShift(u32),

    /// The BTB associativity does not fit the way-index encoding.
    #[error("BTB associativity {0} exceeds the supported maximum of 32768 ways")]
    TooManyWays(usize),

    /// The configuration text could not be parsed.
    #[error("malformed predictor configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
