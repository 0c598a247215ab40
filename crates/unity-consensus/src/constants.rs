//! Chain constants for the Unity blockchain.
//!
//! `ChainConstants` is an immutable snapshot of per-chain consensus
//! parameters. It is created once at startup, either from the verified
//! mainnet defaults or from a genesis configuration file, and shared by
//! reference with every calculator and rule for the lifetime of the
//! process.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Deserialize;
use std::fmt;

/// Error when constructing `ChainConstants` from configuration.
///
/// Configuration errors are fatal: they are raised before any validator is
/// constructed.
#[derive(Debug, Clone)]
pub struct ChainConstantsError {
    /// The field that is missing or invalid.
    pub field: &'static str,
    /// Description of the error.
    pub message: String,
}

impl fmt::Display for ChainConstantsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChainConstants error for '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ChainConstantsError {}

/// Configuration for loading `ChainConstants` from TOML/JSON.
///
/// All fields are optional so partial configs can be validated with clear
/// errors naming the offending field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConstantsConfig {
    /// Maximum extra-data size in bytes.
    pub max_extra_data_size: Option<usize>,
    /// Divisor bounding per-block energy-limit movement.
    pub energy_divisor_limit: Option<u64>,
    /// Absolute lower bound on the energy limit.
    pub energy_lower_bound: Option<u64>,
    /// Timestamp delta at or below which difficulty increases (seconds).
    pub block_time_lower_bound: Option<u64>,
    /// Timestamp delta at or above which difficulty decreases (seconds).
    pub block_time_upper_bound: Option<u64>,
    /// Divisor deriving the per-step difficulty adjustment.
    pub difficulty_bound_divisor: Option<u64>,
    /// Protocol minimum difficulty.
    pub minimum_difficulty: Option<u64>,
    /// Genesis difficulty as hex string (optional "0x" prefix).
    pub genesis_difficulty_hex: Option<String>,
    /// Allowed wall-clock drift for candidate timestamps (seconds).
    pub clock_drift_tolerance_secs: Option<u64>,
    /// Equihash N parameter.
    pub equihash_n: Option<u32>,
    /// Equihash K parameter.
    pub equihash_k: Option<u32>,
    /// Unity retarget barrier (seconds between same-epoch ancestors).
    pub unity_barrier_secs: Option<u64>,
    /// Unity difficulty increase rate numerator.
    pub unity_increase_numerator: Option<u64>,
    /// Unity difficulty increase rate denominator.
    pub unity_increase_denominator: Option<u64>,
    /// Unity difficulty decrease rate numerator.
    pub unity_decrease_numerator: Option<u64>,
    /// Unity difficulty decrease rate denominator.
    pub unity_decrease_denominator: Option<u64>,
}

/// Immutable per-chain consensus parameters.
///
/// No logic lives here; calculators and rules capture the values they need
/// at construction time.
#[derive(Debug, Clone)]
pub struct ChainConstants {
    /// Maximum extra-data size in bytes.
    pub max_extra_data_size: usize,

    /// Divisor bounding how far a child's energy limit may move from its
    /// parent's in a single block.
    pub energy_divisor_limit: u64,

    /// Absolute lower bound on any block's energy limit.
    pub energy_lower_bound: u64,

    /// Timestamp delta at or below which the legacy retarget raises
    /// difficulty (seconds).
    pub block_time_lower_bound: u64,

    /// Timestamp delta at or above which the legacy retarget lowers
    /// difficulty (seconds).
    pub block_time_upper_bound: u64,

    /// Divisor deriving the per-step adjustment: one step is
    /// `parent_difficulty / difficulty_bound_divisor`, never less than 1.
    pub difficulty_bound_divisor: u64,

    /// Protocol minimum difficulty; every retarget result is floored here.
    pub minimum_difficulty: BigUint,

    /// Difficulty of the genesis block.
    genesis_difficulty: BigUint,

    /// Allowed wall-clock drift for candidate timestamps (seconds).
    pub clock_drift_tolerance_secs: u64,

    /// Equihash N parameter.
    pub equihash_n: u32,

    /// Equihash K parameter.
    pub equihash_k: u32,

    /// Unity retarget barrier in seconds: same-epoch ancestor deltas at or
    /// above it lower difficulty, deltas below it raise difficulty.
    pub unity_barrier_secs: u64,

    /// Unity difficulty increase rate as an integer rational.
    pub unity_increase_numerator: u64,
    /// Denominator of the increase rate.
    pub unity_increase_denominator: u64,

    /// Unity difficulty decrease rate as an integer rational.
    pub unity_decrease_numerator: u64,
    /// Denominator of the decrease rate.
    pub unity_decrease_denominator: u64,
}

impl ChainConstants {
    /// Create mainnet constants (stable, verified values).
    pub fn mainnet() -> Self {
        Self {
            max_extra_data_size: 32,
            energy_divisor_limit: 1024,
            energy_lower_bound: 5000,
            block_time_lower_bound: 5,
            block_time_upper_bound: 15,
            difficulty_bound_divisor: 2048,
            minimum_difficulty: BigUint::from(16u32),
            genesis_difficulty: BigUint::from(1024u32),
            clock_drift_tolerance_secs: 1,
            equihash_n: 210,
            equihash_k: 9,
            unity_barrier_secs: 14,
            unity_increase_numerator: 105,
            unity_increase_denominator: 100,
            unity_decrease_numerator: 100,
            unity_decrease_denominator: 105,
        }
    }

    /// Create `ChainConstants` from configuration.
    ///
    /// Returns an error naming the specific field if any required field is
    /// missing or invalid.
    ///
    /// Note: `genesis_difficulty_hex` is trimmed and accepts an optional
    /// "0x" prefix.
    pub fn from_config(config: &ChainConstantsConfig) -> Result<Self, ChainConstantsError> {
        let genesis_hex = config
            .genesis_difficulty_hex
            .as_ref()
            .ok_or_else(|| missing("genesis_difficulty_hex"))?;

        // Hex hygiene: trim whitespace and strip optional 0x prefix
        let hex_cleaned = genesis_hex.trim();
        let hex_cleaned = hex_cleaned
            .strip_prefix("0x")
            .or_else(|| hex_cleaned.strip_prefix("0X"))
            .unwrap_or(hex_cleaned);

        let genesis_difficulty = BigUint::parse_bytes(hex_cleaned.as_bytes(), 16).ok_or_else(
            || ChainConstantsError {
                field: "genesis_difficulty_hex",
                message: format!("invalid hex string: '{}'", genesis_hex),
            },
        )?;

        if genesis_difficulty.is_zero() {
            return Err(ChainConstantsError {
                field: "genesis_difficulty_hex",
                message: "difficulty cannot be zero".to_string(),
            });
        }

        let difficulty_bound_divisor = config
            .difficulty_bound_divisor
            .ok_or_else(|| missing("difficulty_bound_divisor"))?;
        if difficulty_bound_divisor == 0 {
            return Err(ChainConstantsError {
                field: "difficulty_bound_divisor",
                message: "divisor cannot be zero".to_string(),
            });
        }

        let energy_divisor_limit = config
            .energy_divisor_limit
            .ok_or_else(|| missing("energy_divisor_limit"))?;
        if energy_divisor_limit == 0 {
            return Err(ChainConstantsError {
                field: "energy_divisor_limit",
                message: "divisor cannot be zero".to_string(),
            });
        }

        let unity_increase_denominator = config
            .unity_increase_denominator
            .ok_or_else(|| missing("unity_increase_denominator"))?;
        let unity_decrease_denominator = config
            .unity_decrease_denominator
            .ok_or_else(|| missing("unity_decrease_denominator"))?;
        if unity_increase_denominator == 0 || unity_decrease_denominator == 0 {
            return Err(ChainConstantsError {
                field: "unity_increase_denominator",
                message: "rate denominators cannot be zero".to_string(),
            });
        }

        let equihash_n = config.equihash_n.ok_or_else(|| missing("equihash_n"))?;
        let equihash_k = config.equihash_k.ok_or_else(|| missing("equihash_k"))?;
        if equihash_k == 0 || equihash_k >= equihash_n {
            return Err(ChainConstantsError {
                field: "equihash_k",
                message: format!("k must satisfy 0 < k < n, got k={} n={}", equihash_k, equihash_n),
            });
        }

        Ok(Self {
            max_extra_data_size: config
                .max_extra_data_size
                .ok_or_else(|| missing("max_extra_data_size"))?,
            energy_divisor_limit,
            energy_lower_bound: config
                .energy_lower_bound
                .ok_or_else(|| missing("energy_lower_bound"))?,
            block_time_lower_bound: config
                .block_time_lower_bound
                .ok_or_else(|| missing("block_time_lower_bound"))?,
            block_time_upper_bound: config
                .block_time_upper_bound
                .ok_or_else(|| missing("block_time_upper_bound"))?,
            difficulty_bound_divisor,
            minimum_difficulty: BigUint::from(
                config
                    .minimum_difficulty
                    .ok_or_else(|| missing("minimum_difficulty"))?,
            ),
            genesis_difficulty,
            clock_drift_tolerance_secs: config
                .clock_drift_tolerance_secs
                .ok_or_else(|| missing("clock_drift_tolerance_secs"))?,
            equihash_n,
            equihash_k,
            unity_barrier_secs: config
                .unity_barrier_secs
                .ok_or_else(|| missing("unity_barrier_secs"))?,
            unity_increase_numerator: config
                .unity_increase_numerator
                .ok_or_else(|| missing("unity_increase_numerator"))?,
            unity_increase_denominator,
            unity_decrease_numerator: config
                .unity_decrease_numerator
                .ok_or_else(|| missing("unity_decrease_numerator"))?,
            unity_decrease_denominator,
        })
    }

    /// Get the genesis difficulty.
    pub fn genesis_difficulty(&self) -> &BigUint {
        &self.genesis_difficulty
    }
}

fn missing(field: &'static str) -> ChainConstantsError {
    ChainConstantsError {
        field,
        message: "required field missing".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> ChainConstantsConfig {
        ChainConstantsConfig {
            max_extra_data_size: Some(32),
            energy_divisor_limit: Some(1024),
            energy_lower_bound: Some(5000),
            block_time_lower_bound: Some(5),
            block_time_upper_bound: Some(15),
            difficulty_bound_divisor: Some(2048),
            minimum_difficulty: Some(16),
            genesis_difficulty_hex: Some("0400".to_string()),
            clock_drift_tolerance_secs: Some(1),
            equihash_n: Some(210),
            equihash_k: Some(9),
            unity_barrier_secs: Some(14),
            unity_increase_numerator: Some(105),
            unity_increase_denominator: Some(100),
            unity_decrease_numerator: Some(100),
            unity_decrease_denominator: Some(105),
        }
    }

    #[test]
    fn test_mainnet_constants() {
        let constants = ChainConstants::mainnet();
        assert_eq!(constants.max_extra_data_size, 32);
        assert_eq!(constants.energy_divisor_limit, 1024);
        assert_eq!(constants.energy_lower_bound, 5000);
        assert_eq!(constants.difficulty_bound_divisor, 2048);
        assert_eq!(constants.minimum_difficulty, BigUint::from(16u32));
        assert_eq!(constants.genesis_difficulty(), &BigUint::from(1024u32));
        assert_eq!(constants.equihash_n, 210);
        assert_eq!(constants.equihash_k, 9);
    }

    #[test]
    fn test_from_config_full() {
        let constants = ChainConstants::from_config(&full_config()).unwrap();
        assert_eq!(constants.genesis_difficulty(), &BigUint::from(1024u32));
        assert_eq!(constants.unity_barrier_secs, 14);
    }

    #[test]
    fn test_from_config_missing_field_returns_error() {
        let config = ChainConstantsConfig {
            max_extra_data_size: Some(32),
            ..Default::default()
        };

        let err = ChainConstants::from_config(&config).unwrap_err();
        // genesis_difficulty_hex is validated first
        assert_eq!(err.field, "genesis_difficulty_hex");
        assert!(err.message.contains("missing"));
    }

    #[test]
    fn test_from_config_error_names_field() {
        let mut config = full_config();
        config.energy_lower_bound = None;
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "energy_lower_bound");

        let mut config = full_config();
        config.unity_decrease_numerator = None;
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "unity_decrease_numerator");
    }

    #[test]
    fn test_from_config_invalid_hex_returns_error() {
        let mut config = full_config();
        config.genesis_difficulty_hex = Some("not_valid_hex".to_string());
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "genesis_difficulty_hex");
        assert!(err.message.contains("invalid hex"));
    }

    #[test]
    fn test_from_config_zero_difficulty_returns_error() {
        let mut config = full_config();
        config.genesis_difficulty_hex = Some("00".to_string());
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "genesis_difficulty_hex");
        assert!(err.message.contains("zero"));
    }

    #[test]
    fn test_from_config_hex_hygiene() {
        let mut config = full_config();
        config.genesis_difficulty_hex = Some(" 0x0400 ".to_string());
        let constants = ChainConstants::from_config(&config).unwrap();
        assert_eq!(constants.genesis_difficulty(), &BigUint::from(1024u32));
    }

    #[test]
    fn test_from_config_rejects_zero_divisors() {
        let mut config = full_config();
        config.difficulty_bound_divisor = Some(0);
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "difficulty_bound_divisor");

        let mut config = full_config();
        config.energy_divisor_limit = Some(0);
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "energy_divisor_limit");
    }

    #[test]
    fn test_from_config_rejects_bad_equihash_params() {
        let mut config = full_config();
        config.equihash_k = Some(210);
        let err = ChainConstants::from_config(&config).unwrap_err();
        assert_eq!(err.field, "equihash_k");
    }
}
