//! # unity-consensus
//!
//! Consensus validation for the Unity hybrid PoW/PoS blockchain.
//!
//! This crate provides:
//! - Header validation as composable rule chains, keyed by seal type
//! - Legacy (pre-fork) and unified (post-fork) difficulty adjustment
//! - Block reward schedule with the monetary-update switch
//! - The chain configuration composition root wiring it all together
//!
//! ## Unity consensus
//!
//! Before the Unity fork the chain is pure Equihash proof-of-work. From
//! the fork height on, proof-of-work and proof-of-stake blocks strictly
//! alternate, and difficulty retargets against the ancestor of the same
//! seal type two generations back instead of the parent.
//!
//! ## Validation model
//!
//! Validators are grouped by how many ancestors they need: none (self
//! consistency), parent, grandparent (legacy difficulty), or grandparent
//! plus great-grandparent (unified difficulty). Each validator runs the
//! rule chain registered for the header's seal type in order and fails on
//! the first violated rule.

mod chain_config;
mod constants;
mod difficulty;
mod equihash;
mod error;
pub mod header;
pub mod rewards;
mod rules;
mod unity_difficulty;
mod validation;


pub use chain_config::{ChainConfiguration, EquihashVerifierFactory};
pub use constants::{ChainConstants, ChainConstantsConfig, ChainConstantsError};
pub use difficulty::DifficultyCalculator;
pub use equihash::{EquihashSolutionVerifier, EquihashValidator};
pub use error::{ConsensusError, ConsensusResult, ErrorCategory};
pub use header::{BlockHeader, Seal, SealType, HASH_SIZE};
pub use rewards::RewardsCalculator;
pub use rules::{
    DependentRule, Ed25519SignatureVerifier, FixedStakingDelay, GrandParentRule,
    GreatGrandParentRule, HeaderRule, StakingDelayPolicy, StakingSignatureVerifier,
};
pub use unity_difficulty::UnityDifficultyCalculator;
pub use validation::{
    BlockHeaderValidator, GrandParentBlockHeaderValidator, GreatGrandParentBlockHeaderValidator,
    ParentBlockHeaderValidator, RuleChainMap,
};
