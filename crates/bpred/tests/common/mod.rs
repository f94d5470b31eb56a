//! Shared test helpers.

use neurobp_core::config::{
    BtbConfig, DirectionKind, PerceptronConfig, PerceptronIndexing, PredictorConfig, RasConfig,
};
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Perceptron table of `rows` rows over `history` bits, modulo indexed, default theta.
pub fn perceptron_config(rows: usize, history: u32) -> PerceptronConfig {
    PerceptronConfig {
        table_size: rows,
        indexing: PerceptronIndexing::Modulo,
        history_length: history,
        weight_bits: 8,
        speculative_history: true,
        theta: None,
    }
}

/// Small single-threaded predictor: 16x8 perceptron, 4x2 BTB, 8-entry RAS.
pub fn small_config(direction: DirectionKind) -> PredictorConfig {
    PredictorConfig {
        num_threads: 1,
        direction,
        inst_shift: 2,
        inst_bytes: 4,
        perceptron: perceptron_config(16, 8),
        btb: BtbConfig { sets: 4, assoc: 2 },
        ras: RasConfig { size: 8 },
    }
}
