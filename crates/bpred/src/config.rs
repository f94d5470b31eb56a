//! Configuration system for the branch prediction unit.
//!
//! This module defines all configuration structures and enums used to
//! parameterize the predictor. It provides:
//! 1. **Defaults:** Baseline table geometries (perceptron, BTB, RAS).
//! 2. **Structures:** Hierarchical config for the direction predictor, BTB and RAS.
//! 3. **Enums:** Direction predictor variant and perceptron row selection.
//! 4. **Validation:** Eager checks run by every constructor.
//!
//! Configuration is supplied as JSON (`PredictorConfig::from_json`) or built
//! from `PredictorConfig::default()`.

use serde::Deserialize;

use crate::common::ConfigError;

/// Default configuration constants for the predictor.
mod defaults {
    /// Number of hardware thread contexts sharing the predictor.
    pub const NUM_THREADS: usize = 1;

    /// Low address bits dropped before indexing (4-byte instructions).
    pub const INST_SHIFT: u32 = 2;

    /// Size of a call instruction; the pushed return address is `pc + INST_BYTES`.
    pub const INST_BYTES: u64 = 4;

    /// Number of perceptron rows.
    pub const PERCEPTRON_TABLE_SIZE: usize = 1024;

    /// Global history length fed to each perceptron.
    pub const PERCEPTRON_HISTORY: u32 = 32;

    /// Width of a single perceptron weight in bits.
    pub const PERCEPTRON_WEIGHT_BITS: u32 = 8;

    /// Number of BTB sets.
    pub const BTB_SETS: usize = 512;

    /// BTB associativity.
    pub const BTB_ASSOC: usize = 4;

    /// Return Address Stack depth.
    pub const RAS_SIZE: usize = 8;
}

/// Largest supported BTB associativity; way indices are stored as `u16`
/// with one value reserved as the end-of-chain sentinel.
pub const MAX_BTB_ASSOC: usize = 1 << 15;

/// Direction prediction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DirectionKind {
    /// Always predicts taken; no learning state.
    Static,
    /// Global-history perceptron predictor.
    #[default]
    Perceptron,
    /// Path-based perceptron predictor with speculative partial sums.
    PerceptronPath,
}

/// How a branch address selects a perceptron row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PerceptronIndexing {
    /// `(pc >> shift) mod table_size`; any non-zero table size.
    #[default]
    Modulo,
    /// Single global table indexed by `(pc >> shift) ^ history`, masked to the
    /// table size. Requires a power-of-two table and enough history bits to
    /// reach every row.
    Global,
}

/// Root configuration of the branch prediction unit.
///
/// # Examples
///
/// ```
/// use neurobp_core::config::{DirectionKind, PredictorConfig};
///
/// let json = r#"{
///     "direction": "PerceptronPath",
///     "perceptron": { "history_length": 12, "table_size": 64 },
///     "btb": { "sets": 64, "assoc": 2 }
/// }"#;
///
/// let config = PredictorConfig::from_json(json).unwrap();
/// assert_eq!(config.direction, DirectionKind::PerceptronPath);
/// assert_eq!(config.btb.sets, 64);
/// assert_eq!(config.ras.size, 8);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Number of hardware threads with private history and return stacks.
    #[serde(default = "PredictorConfig::default_num_threads")]
    pub num_threads: usize,

    /// Direction predictor variant.
    #[serde(default)]
    pub direction: DirectionKind,

    /// Address bits dropped before indexing the perceptron table and BTB.
    #[serde(default = "PredictorConfig::default_inst_shift")]
    pub inst_shift: u32,

    /// Call instruction length, used to form the pushed return address.
    #[serde(default = "PredictorConfig::default_inst_bytes")]
    pub inst_bytes: u64,

    /// Perceptron table configuration.
    #[serde(default)]
    pub perceptron: PerceptronConfig,

    /// Branch Target Buffer geometry.
    #[serde(default)]
    pub btb: BtbConfig,

    /// Return Address Stack geometry.
    #[serde(default)]
    pub ras: RasConfig,
}

impl PredictorConfig {
    /// Returns the default number of hardware threads.
    fn default_num_threads() -> usize {
        defaults::NUM_THREADS
    }

    /// Returns the default instruction alignment shift.
    fn default_inst_shift() -> u32 {
        defaults::INST_SHIFT
    }

    /// Returns the default call instruction length.
    fn default_inst_bytes() -> u64 {
        defaults::INST_BYTES
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error reported by [`PredictorConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every size constraint of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint: zero-sized tables, sizes that
    /// must be powers of two, history or weight widths out of range, or a
    /// global perceptron table the history cannot index.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::ZeroSized {
                what: "number of threads",
            });
        }
        if self.inst_shift >= 64 {
            return Err(ConfigError::InstShift(self.inst_shift));
        }
        if self.direction != DirectionKind::Static {
            self.perceptron.validate()?;
        }
        self.btb.validate()?;
        self.ras.validate()
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            num_threads: defaults::NUM_THREADS,
            direction: DirectionKind::default(),
            inst_shift: defaults::INST_SHIFT,
            inst_bytes: defaults::INST_BYTES,
            perceptron: PerceptronConfig::default(),
            btb: BtbConfig::default(),
            ras: RasConfig::default(),
        }
    }
}

/// Perceptron predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PerceptronConfig {
    /// Number of perceptrons (weight rows).
    #[serde(default = "PerceptronConfig::default_table_size")]
    pub table_size: usize,

    /// Row selection scheme.
    #[serde(default)]
    pub indexing: PerceptronIndexing,

    /// Global history length (weights per row, excluding the bias).
    #[serde(default = "PerceptronConfig::default_history")]
    pub history_length: u32,

    /// Width of each signed weight in bits.
    #[serde(default = "PerceptronConfig::default_weight_bits")]
    pub weight_bits: u32,

    /// Predict from a history register advanced at lookup time instead of the
    /// register advanced at commit.
    #[serde(default = "PerceptronConfig::default_speculative_history")]
    pub speculative_history: bool,

    /// Training threshold override; `None` uses `round(1.93 * history + 14)`.
    #[serde(default)]
    pub theta: Option<i32>,
}

impl PerceptronConfig {
    /// Returns the default number of perceptron rows.
    fn default_table_size() -> usize {
        defaults::PERCEPTRON_TABLE_SIZE
    }

    /// Returns the default global history length.
    fn default_history() -> u32 {
        defaults::PERCEPTRON_HISTORY
    }

    /// Returns the default weight width in bits.
    fn default_weight_bits() -> u32 {
        defaults::PERCEPTRON_WEIGHT_BITS
    }

    /// Speculative history is on unless explicitly disabled.
    fn default_speculative_history() -> bool {
        true
    }

    /// Checks the perceptron table geometry.
    ///
    /// # Errors
    ///
    /// See [`PredictorConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::ZeroSized {
                what: "perceptron table size",
            });
        }
        if self.history_length == 0 || self.history_length > 64 {
            return Err(ConfigError::HistoryWidth(self.history_length));
        }
        if !(2..=16).contains(&self.weight_bits) {
            return Err(ConfigError::WeightBits(self.weight_bits));
        }
        if self.indexing == PerceptronIndexing::Global {
            if !self.table_size.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo {
                    what: "global perceptron table size",
                    value: self.table_size,
                });
            }
            let needed = self.table_size.trailing_zeros();
            if self.history_length < needed {
                return Err(ConfigError::HistoryTooShort {
                    rows: self.table_size,
                    needed,
                    history: self.history_length,
                });
            }
        }
        Ok(())
    }

    /// Training threshold: the configured override, or the empirical
    /// `1.93 * history + 14` rounded to the nearest integer.
    pub fn theta(&self) -> i32 {
        self.theta
            .unwrap_or_else(|| (1.93 * f64::from(self.history_length) + 14.0).round() as i32)
    }
}

impl Default for PerceptronConfig {
    fn default() -> Self {
        Self {
            table_size: defaults::PERCEPTRON_TABLE_SIZE,
            indexing: PerceptronIndexing::default(),
            history_length: defaults::PERCEPTRON_HISTORY,
            weight_bits: defaults::PERCEPTRON_WEIGHT_BITS,
            speculative_history: true,
            theta: None,
        }
    }
}

/// Branch Target Buffer geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct BtbConfig {
    /// Number of sets.
    #[serde(default = "BtbConfig::default_sets")]
    pub sets: usize,

    /// Ways per set; `1` is direct-mapped.
    #[serde(default = "BtbConfig::default_assoc")]
    pub assoc: usize,
}

impl BtbConfig {
    /// Returns the default BTB set count.
    fn default_sets() -> usize {
        defaults::BTB_SETS
    }

    /// Returns the default BTB associativity.
    fn default_assoc() -> usize {
        defaults::BTB_ASSOC
    }

    /// Checks that both dimensions are non-zero powers of two.
    ///
    /// # Errors
    ///
    /// See [`PredictorConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sets == 0 {
            return Err(ConfigError::ZeroSized { what: "BTB sets" });
        }
        if !self.sets.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                what: "BTB sets",
                value: self.sets,
            });
        }
        if self.assoc == 0 {
            return Err(ConfigError::ZeroSized {
                what: "BTB associativity",
            });
        }
        if !self.assoc.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                what: "BTB associativity",
                value: self.assoc,
            });
        }
        if self.assoc > MAX_BTB_ASSOC {
            return Err(ConfigError::TooManyWays(self.assoc));
        }
        Ok(())
    }
}

impl Default for BtbConfig {
    fn default() -> Self {
        Self {
            sets: defaults::BTB_SETS,
            assoc: defaults::BTB_ASSOC,
        }
    }
}

/// Return Address Stack geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct RasConfig {
    /// Number of entries; zero disables return prediction.
    #[serde(default = "RasConfig::default_size")]
    pub size: usize,
}

impl RasConfig {
    /// Returns the default RAS depth.
    fn default_size() -> usize {
        defaults::RAS_SIZE
    }

    /// Checks that the depth is zero or a power of two.
    ///
    /// # Errors
    ///
    /// See [`PredictorConfig::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size != 0 && !self.size.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo {
                what: "return-address stack size",
                value: self.size,
            });
        }
        Ok(())
    }
}

impl Default for RasConfig {
    fn default() -> Self {
        Self {
            size: defaults::RAS_SIZE,
        }
    }
}
