//! Atomic header validation rules.
//!
//! Each rule is one predicate over a header (self-consistency) or a
//! header/ancestor pair or triple (dependent rules). Rules are enumerated
//! kinds with a single exhaustive-match dispatch per generation distance,
//! so adding a rule is a compile-time-checked change rather than a runtime
//! registration.
//!
//! Rules are pure: the wall clock reaches `FutureBlock` as a caller-
//! supplied argument, and the cryptographic verifiers are injected
//! collaborators captured at construction.

use crate::difficulty::DifficultyCalculator;
use crate::equihash::EquihashValidator;
use crate::error::{ConsensusError, ConsensusResult};
use crate::header::{BlockHeader, Seal};
use crate::unity_difficulty::UnityDifficultyCalculator;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::fmt;
use std::sync::Arc;

/// Opaque staking-signature verifier.
pub trait StakingSignatureVerifier: Send + Sync {
    /// Whether `signature` over `message` verifies under `public_key`.
    fn verify(&self, message: &[u8], public_key: &[u8], signature: &[u8]) -> bool;
}

/// Default staking-signature verifier: Ed25519 over the header mine hash.
#[derive(Debug, Clone, Default)]
pub struct Ed25519SignatureVerifier;

impl StakingSignatureVerifier for Ed25519SignatureVerifier {
    fn verify(&self, message: &[u8], public_key: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes) = <&[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(key_bytes) else {
            return false;
        };
        let Ok(sig_bytes) = <&[u8; 64]>::try_from(signature) else {
            return false;
        };
        key.verify(message, &Signature::from_bytes(sig_bytes)).is_ok()
    }
}

/// Minimum-spacing policy for staking blocks.
///
/// The production policy derives the delay from the producer's seed and
/// stake; that computation belongs to an external collaborator, so the
/// rule only depends on this contract.
pub trait StakingDelayPolicy: Send + Sync {
    /// Minimum seconds between `parent.timestamp` and a valid child
    /// staking block.
    fn minimum_delay(&self, header: &BlockHeader, parent: &BlockHeader) -> u64;
}

/// Flat minimum spacing, independent of seed and stake.
#[derive(Debug, Clone)]
pub struct FixedStakingDelay {
    /// Minimum spacing in seconds.
    pub delay_secs: u64,
}

impl FixedStakingDelay {
    /// Create a fixed-spacing policy.
    pub fn new(delay_secs: u64) -> Self {
        Self { delay_secs }
    }
}

impl StakingDelayPolicy for FixedStakingDelay {
    fn minimum_delay(&self, _header: &BlockHeader, _parent: &BlockHeader) -> u64 {
        self.delay_secs
    }
}

/// Self-consistency rules: one header, no ancestors.
#[derive(Clone)]
pub enum HeaderRule {
    /// Seal-type byte is a known discriminant and the payload matches it.
    HeaderSealType,
    /// Timestamp is within the allowed drift of the supplied wall clock.
    FutureBlock {
        /// Allowed drift in seconds.
        clock_drift_secs: u64,
    },
    /// Extra-data length is bounded.
    ExtraData {
        /// Maximum extra-data size in bytes.
        max_size: usize,
    },
    /// Energy consumed does not exceed the block's own limit.
    EnergyConsumed,
    /// PoW header hash meets the difficulty-derived target.
    PowTarget,
    /// Equihash solution verifies under the chain's (N, K).
    EquihashSolution(Arc<EquihashValidator>),
    /// Staking signature verifies against the header content.
    Signature(Arc<dyn StakingSignatureVerifier>),
}

impl HeaderRule {
    /// Rule name used in failure reporting.
    pub fn name(&self) -> &'static str {
        match self {
            HeaderRule::HeaderSealType => "HeaderSealTypeRule",
            HeaderRule::FutureBlock { .. } => "FutureBlockRule",
            HeaderRule::ExtraData { .. } => "ExtraDataRule",
            HeaderRule::EnergyConsumed => "EnergyConsumedRule",
            HeaderRule::PowTarget => "PowTargetRule",
            HeaderRule::EquihashSolution(_) => "EquihashSolutionRule",
            HeaderRule::Signature(_) => "SignatureRule",
        }
    }

    /// Check the rule against `header`, with `now_secs` as the caller's
    /// wall clock.
    pub fn check(&self, header: &BlockHeader, now_secs: u64) -> ConsensusResult<()> {
        match self {
            HeaderRule::HeaderSealType => check_seal_type(header),
            HeaderRule::FutureBlock { clock_drift_secs } => {
                let limit = now_secs.saturating_add(*clock_drift_secs);
                if header.timestamp > limit {
                    return Err(ConsensusError::FutureBlock {
                        timestamp: header.timestamp,
                        limit,
                    });
                }
                Ok(())
            }
            HeaderRule::ExtraData { max_size } => {
                if header.extra_data.len() > *max_size {
                    return Err(ConsensusError::ExtraDataTooLarge {
                        size: header.extra_data.len(),
                        max: *max_size,
                    });
                }
                Ok(())
            }
            HeaderRule::EnergyConsumed => {
                if header.energy_consumed > header.energy_limit {
                    return Err(ConsensusError::EnergyConsumedExceedsLimit {
                        consumed: header.energy_consumed,
                        limit: header.energy_limit,
                    });
                }
                Ok(())
            }
            HeaderRule::PowTarget => check_pow_target(header),
            HeaderRule::EquihashSolution(validator) => {
                if !validator.validate(header) {
                    return Err(ConsensusError::InvalidEquihashSolution(format!(
                        "solution rejected for (N, K) = ({}, {})",
                        validator.n(),
                        validator.k()
                    )));
                }
                Ok(())
            }
            HeaderRule::Signature(verifier) => {
                let Seal::ProofOfStake {
                    signature,
                    signing_public_key,
                    ..
                } = &header.seal
                else {
                    return Err(ConsensusError::SealPayloadMismatch {
                        declared: header.seal_type,
                    });
                };
                if !verifier.verify(&header.mine_hash(), signing_public_key, signature) {
                    return Err(ConsensusError::InvalidSignature(
                        "signature does not verify against header content".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for HeaderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check_seal_type(header: &BlockHeader) -> ConsensusResult<()> {
    let Some(seal_type) = header.seal_type() else {
        return Err(ConsensusError::UnknownSealType {
            seal_byte: header.seal_type,
        });
    };
    let payload_matches = matches!(
        (seal_type, &header.seal),
        (crate::header::SealType::ProofOfWork, Seal::ProofOfWork { .. })
            | (crate::header::SealType::ProofOfStake, Seal::ProofOfStake { .. })
    );
    if !payload_matches {
        return Err(ConsensusError::SealPayloadMismatch {
            declared: header.seal_type,
        });
    }
    Ok(())
}

fn check_pow_target(header: &BlockHeader) -> ConsensusResult<()> {
    let Seal::ProofOfWork { nonce, solution } = &header.seal else {
        return Err(ConsensusError::SealPayloadMismatch {
            declared: header.seal_type,
        });
    };

    if header.difficulty.is_zero() {
        return Err(ConsensusError::PowTargetMissed {
            difficulty: "0".to_string(),
        });
    }
    let boundary = (BigUint::one() << 256u32) / &header.difficulty;

    // hit = H(mine_hash || nonce || H(solution))
    let mut solution_hasher = Blake2b::<typenum::U32>::new();
    Digest::update(&mut solution_hasher, solution);
    let solution_digest: [u8; 32] = solution_hasher.finalize().into();

    let mut hasher = Blake2b::<typenum::U32>::new();
    Digest::update(&mut hasher, header.mine_hash());
    Digest::update(&mut hasher, nonce);
    Digest::update(&mut hasher, solution_digest);
    let hit: [u8; 32] = hasher.finalize().into();

    if BigUint::from_bytes_be(&hit) >= boundary {
        return Err(ConsensusError::PowTargetMissed {
            difficulty: header.difficulty.to_string(),
        });
    }
    Ok(())
}

/// Parent-dependent rules.
#[derive(Clone)]
pub enum DependentRule {
    /// Child number is parent number + 1.
    BlockNumber,
    /// Child timestamp is strictly after the parent's.
    Timestamp,
    /// Post-fork seal types strictly alternate.
    ParentOppositeType,
    /// PoS-specific minimum spacing over the parent holds.
    StakingBlockTimestamp(Arc<dyn StakingDelayPolicy>),
    /// Energy limit moves within the divisor-bounded window and stays
    /// above the protocol lower bound.
    EnergyLimit {
        /// Divisor bounding per-block movement.
        divisor: u64,
        /// Protocol lower bound on the energy limit.
        lower_bound: u64,
    },
}

impl DependentRule {
    /// Rule name used in failure reporting.
    pub fn name(&self) -> &'static str {
        match self {
            DependentRule::BlockNumber => "BlockNumberRule",
            DependentRule::Timestamp => "TimeStampRule",
            DependentRule::ParentOppositeType => "ParentOppositeTypeRule",
            DependentRule::StakingBlockTimestamp(_) => "StakingBlockTimeStampRule",
            DependentRule::EnergyLimit { .. } => "EnergyLimitRule",
        }
    }

    /// Check the rule against `header` and its parent.
    pub fn check(&self, header: &BlockHeader, parent: &BlockHeader) -> ConsensusResult<()> {
        match self {
            DependentRule::BlockNumber => {
                // a parent at u64::MAX has no valid successor
                let expected = parent.number.checked_add(1);
                if Some(header.number) != expected {
                    return Err(ConsensusError::InvalidBlockNumber {
                        got: header.number,
                        expected: expected.unwrap_or(u64::MAX),
                    });
                }
                Ok(())
            }
            DependentRule::Timestamp => {
                if header.timestamp <= parent.timestamp {
                    return Err(ConsensusError::InvalidTimestamp {
                        block_time: header.timestamp,
                        parent_time: parent.timestamp,
                    });
                }
                Ok(())
            }
            DependentRule::ParentOppositeType => {
                if header.seal_type == parent.seal_type {
                    return Err(ConsensusError::SameSealTypeAsParent {
                        seal_byte: header.seal_type,
                    });
                }
                Ok(())
            }
            DependentRule::StakingBlockTimestamp(policy) => {
                let earliest = parent
                    .timestamp
                    .saturating_add(policy.minimum_delay(header, parent));
                if header.timestamp < earliest {
                    return Err(ConsensusError::StakingBlockTooEarly {
                        block_time: header.timestamp,
                        earliest,
                    });
                }
                Ok(())
            }
            DependentRule::EnergyLimit {
                divisor,
                lower_bound,
            } => {
                if header.energy_limit < *lower_bound {
                    return Err(ConsensusError::EnergyLimitBelowMinimum {
                        got: header.energy_limit,
                        minimum: *lower_bound,
                    });
                }
                let window = parent.energy_limit / divisor;
                let lower = parent.energy_limit.saturating_sub(window);
                let upper = parent.energy_limit.saturating_add(window);
                if header.energy_limit < lower || header.energy_limit > upper {
                    return Err(ConsensusError::EnergyLimitOutOfBounds {
                        got: header.energy_limit,
                        lower,
                        upper,
                    });
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for DependentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grandparent-dependent rules (pre-fork).
#[derive(Debug, Clone)]
pub enum GrandParentRule {
    /// Declared difficulty matches the legacy retarget over
    /// (parent, grandparent).
    Difficulty(DifficultyCalculator),
}

impl GrandParentRule {
    /// Rule name used in failure reporting.
    pub fn name(&self) -> &'static str {
        match self {
            GrandParentRule::Difficulty(_) => "DifficultyRule",
        }
    }

    /// Check the rule against `header` and its two nearest ancestors.
    pub fn check(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        grand_parent: &BlockHeader,
    ) -> ConsensusResult<()> {
        match self {
            GrandParentRule::Difficulty(calculator) => {
                let expected = calculator.calculate(parent, grand_parent);
                if header.difficulty != expected {
                    return Err(ConsensusError::InvalidDifficulty {
                        got: header.difficulty.to_string(),
                        expected: expected.to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Great-grandparent-dependent rules (post-fork).
#[derive(Debug, Clone)]
pub enum GreatGrandParentRule {
    /// Declared difficulty matches the unified retarget over the two
    /// adjacent ancestors two and three generations back.
    UnityDifficulty(UnityDifficultyCalculator),
}

impl GreatGrandParentRule {
    /// Rule name used in failure reporting.
    pub fn name(&self) -> &'static str {
        match self {
            GreatGrandParentRule::UnityDifficulty(_) => "UnityDifficultyRule",
        }
    }

    /// Check the rule against `header`, its grandparent, and its
    /// great-grandparent.
    pub fn check(
        &self,
        header: &BlockHeader,
        grand_parent: &BlockHeader,
        great_grand_parent: &BlockHeader,
    ) -> ConsensusResult<()> {
        match self {
            GreatGrandParentRule::UnityDifficulty(calculator) => {
                let expected = calculator.calculate(grand_parent, great_grand_parent);
                if header.difficulty != expected {
                    return Err(ConsensusError::InvalidDifficulty {
                        got: header.difficulty.to_string(),
                        expected: expected.to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}
