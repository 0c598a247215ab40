//! Error types for consensus validation.

use thiserror::Error;

/// Consensus validation errors.
///
/// Every rule failure maps to exactly one variant, so the failing rule can
/// be recovered from the error alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Seal-type byte is not a known discriminant.
    #[error("Unknown seal type byte: {seal_byte:#04x}")]
    UnknownSealType { seal_byte: u8 },

    /// Seal payload does not match the declared seal type.
    #[error("Seal payload mismatch: header declares {declared:#04x}")]
    SealPayloadMismatch { declared: u8 },

    /// Block timestamp is too far in the future.
    #[error("Timestamp too far in future: {timestamp} > {limit}")]
    FutureBlock { timestamp: u64, limit: u64 },

    /// Extra-data field exceeds the configured maximum.
    #[error("Extra data too large: {size} bytes, max {max} bytes")]
    ExtraDataTooLarge { size: usize, max: usize },

    /// Energy consumed exceeds the block's own energy limit.
    #[error("Energy consumed {consumed} exceeds limit {limit}")]
    EnergyConsumedExceedsLimit { consumed: u64, limit: u64 },

    /// PoW header hash does not meet the difficulty-derived target.
    #[error("PoW hash above target for difficulty {difficulty}")]
    PowTargetMissed { difficulty: String },

    /// Equihash solution rejected by the verifier.
    #[error("Invalid Equihash solution: {0}")]
    InvalidEquihashSolution(String),

    /// Staking signature rejected by the verifier.
    #[error("Invalid staking signature: {0}")]
    InvalidSignature(String),

    /// Block number is not parent number + 1.
    #[error("Invalid block number: {got}, expected {expected}")]
    InvalidBlockNumber { got: u64, expected: u64 },

    /// Block timestamp is not strictly after the parent's.
    #[error("Invalid timestamp: block {block_time}, expected after {parent_time}")]
    InvalidTimestamp { block_time: u64, parent_time: u64 },

    /// PoS block produced before the minimum staking spacing elapsed.
    #[error("Staking block too early: {block_time}, expected at least {earliest}")]
    StakingBlockTooEarly { block_time: u64, earliest: u64 },

    /// Energy limit outside the divisor-bounded window around the parent's.
    #[error("Energy limit {got} outside [{lower}, {upper}]")]
    EnergyLimitOutOfBounds { got: u64, lower: u64, upper: u64 },

    /// Energy limit below the protocol lower bound.
    #[error("Energy limit {got} below minimum {minimum}")]
    EnergyLimitBelowMinimum { got: u64, minimum: u64 },

    /// Post-fork seal types must strictly alternate.
    #[error("Seal type {seal_byte:#04x} matches parent; alternation required")]
    SameSealTypeAsParent { seal_byte: u8 },

    /// Declared difficulty does not match the retarget calculation.
    #[error("Invalid difficulty: got {got}, expected {expected}")]
    InvalidDifficulty { got: String, expected: String },

    /// An ancestor the validator structurally requires was not supplied.
    /// This is pipeline misuse, not a bad block.
    #[error("Missing ancestor: {0}")]
    MissingAncestor(&'static str),
}

/// Coarse classification used by the import pipeline to route rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed header fields; discard, never retry.
    Structural,
    /// Continuity violation against ancestors; discard or re-request.
    Ordering,
    /// Cryptographic or difficulty mismatch; escalate, likely adversarial.
    Consensus,
    /// Caller bug (missing ancestor); fatal.
    Misuse,
}

impl ConsensusError {
    /// Classify this error into the pipeline's handling taxonomy.
    pub fn category(&self) -> ErrorCategory {
        use ConsensusError::*;
        match self {
            UnknownSealType { .. }
            | SealPayloadMismatch { .. }
            | FutureBlock { .. }
            | ExtraDataTooLarge { .. }
            | EnergyConsumedExceedsLimit { .. }
            | EnergyLimitBelowMinimum { .. } => ErrorCategory::Structural,
            InvalidBlockNumber { .. }
            | InvalidTimestamp { .. }
            | StakingBlockTooEarly { .. }
            | EnergyLimitOutOfBounds { .. }
            | SameSealTypeAsParent { .. } => ErrorCategory::Ordering,
            PowTargetMissed { .. }
            | InvalidEquihashSolution(_)
            | InvalidSignature(_)
            | InvalidDifficulty { .. } => ErrorCategory::Consensus,
            MissingAncestor(_) => ErrorCategory::Misuse,
        }
    }
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
