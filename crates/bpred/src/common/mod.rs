//! Types shared by every predictor structure.
//!
//! 1. **Error Handling:** Configuration errors raised at construction.
//! 2. **Identifiers:** Hardware thread identifiers used to select per-thread state.

/// Error types for predictor construction.
pub mod error;

pub use error::ConfigError;

/// Hardware thread context identifier.
///
/// Selects the per-thread history registers and return-address stack. Valid ids
/// are `0..num_threads` of the configuration the predictor was built from.
pub type ThreadId = usize;
