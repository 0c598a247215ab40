//! Chain configuration: the composition root of the consensus subsystem.
//!
//! Wires chain constants into the difficulty and rewards calculators once
//! at startup and builds every rule chain the validators run. Validators
//! do not reference the configuration back; they only hold the rules and
//! calculator copies they were built with.

use crate::constants::ChainConstants;
use crate::difficulty::DifficultyCalculator;
use crate::equihash::{EquihashSolutionVerifier, EquihashValidator};
use crate::header::BlockHeader;
use crate::rewards::RewardsCalculator;
use crate::rules::{
    DependentRule, Ed25519SignatureVerifier, FixedStakingDelay, GrandParentRule,
    GreatGrandParentRule, HeaderRule, StakingDelayPolicy, StakingSignatureVerifier,
};
use crate::unity_difficulty::UnityDifficultyCalculator;
use crate::validation::{
    BlockHeaderValidator, GrandParentBlockHeaderValidator, GreatGrandParentBlockHeaderValidator,
    ParentBlockHeaderValidator, RuleChainMap,
};
use num_bigint::BigUint;
use std::sync::{Arc, OnceLock};

/// Factory producing the opaque Equihash backend for the chain's (N, K).
///
/// Invoked at most once per configuration, the first time
/// [`ChainConfiguration::equihash_validator`] runs. Building a
/// self-consistency validator counts as such a use.
pub type EquihashVerifierFactory =
    Box<dyn Fn(u32, u32) -> Box<dyn EquihashSolutionVerifier> + Send + Sync>;

/// Composition root for consensus validation.
///
/// Immutable after construction; safe for unsynchronized concurrent reads
/// from multiple validation workers. The one lazily built member, the
/// Equihash validator, sits behind a `OnceLock`, so concurrent first
/// uses construct it exactly once and never observe a partial value.
pub struct ChainConfiguration {
    constants: Arc<ChainConstants>,
    unity_fork_number: Option<u64>,
    difficulty_calculator: DifficultyCalculator,
    unity_difficulty_calculator: UnityDifficultyCalculator,
    rewards_calculator: RewardsCalculator,
    equihash_factory: EquihashVerifierFactory,
    equihash: OnceLock<Arc<EquihashValidator>>,
    signature_verifier: Arc<dyn StakingSignatureVerifier>,
    staking_delay: Arc<dyn StakingDelayPolicy>,
}

impl ChainConfiguration {
    /// Default minimum spacing for staking blocks, in seconds.
    const DEFAULT_STAKING_DELAY_SECS: u64 = 1;

    /// Create a chain configuration.
    ///
    /// `unity_fork_number` is the height at which the chain switches to
    /// hybrid PoW/PoS consensus (`None` = never). `monetary_update_block`
    /// and `initial_supply` parameterize the rewards schedule switch.
    /// `equihash_factory` supplies the opaque Equihash backend; it is
    /// invoked once, the first time a self-consistency validator is built
    /// or [`Self::equihash_validator`] is called directly.
    pub fn new(
        constants: ChainConstants,
        unity_fork_number: Option<u64>,
        monetary_update_block: Option<u64>,
        initial_supply: BigUint,
        equihash_factory: EquihashVerifierFactory,
    ) -> Self {
        let difficulty_calculator = DifficultyCalculator::new(&constants);
        let unity_difficulty_calculator = UnityDifficultyCalculator::new(&constants);
        let rewards_calculator = RewardsCalculator::new(monetary_update_block, initial_supply);

        Self {
            constants: Arc::new(constants),
            unity_fork_number,
            difficulty_calculator,
            unity_difficulty_calculator,
            rewards_calculator,
            equihash_factory,
            equihash: OnceLock::new(),
            signature_verifier: Arc::new(Ed25519SignatureVerifier),
            staking_delay: Arc::new(FixedStakingDelay::new(Self::DEFAULT_STAKING_DELAY_SECS)),
        }
    }

    /// Replace the staking-signature verifier collaborator.
    pub fn with_signature_verifier(
        mut self,
        verifier: Arc<dyn StakingSignatureVerifier>,
    ) -> Self {
        self.signature_verifier = verifier;
        self
    }

    /// Replace the staking-spacing policy collaborator.
    pub fn with_staking_delay_policy(mut self, policy: Arc<dyn StakingDelayPolicy>) -> Self {
        self.staking_delay = policy;
        self
    }

    /// The chain constants.
    pub fn constants(&self) -> &ChainConstants {
        &self.constants
    }

    /// The legacy (pre-fork) difficulty calculator.
    pub fn difficulty_calculator(&self) -> &DifficultyCalculator {
        &self.difficulty_calculator
    }

    /// The unified (post-fork) difficulty calculator.
    pub fn unity_difficulty_calculator(&self) -> &UnityDifficultyCalculator {
        &self.unity_difficulty_calculator
    }

    /// The block rewards calculator.
    pub fn rewards_calculator(&self) -> &RewardsCalculator {
        &self.rewards_calculator
    }

    /// Whether the Unity fork is active at `block_number`.
    ///
    /// This height comparison is the single branch point of the consensus
    /// state machine; the import pipeline selects the pre- or post-fork
    /// validators with it.
    pub fn is_unity_active(&self, block_number: u64) -> bool {
        self.unity_fork_number
            .map(|fork| block_number >= fork)
            .unwrap_or(false)
    }

    /// The Equihash validator, built on first use.
    pub fn equihash_validator(&self) -> Arc<EquihashValidator> {
        self.equihash
            .get_or_init(|| {
                let n = self.constants.equihash_n;
                let k = self.constants.equihash_k;
                Arc::new(EquihashValidator::new(n, k, (self.equihash_factory)(n, k)))
            })
            .clone()
    }

    /// Build the self-consistency validator.
    ///
    /// Cheap structural rules run before the cryptographic ones so a
    /// malformed header never pays for verification.
    pub fn create_block_header_validator(&self) -> BlockHeaderValidator {
        let shared_prefix = [
            HeaderRule::HeaderSealType,
            HeaderRule::FutureBlock {
                clock_drift_secs: self.constants.clock_drift_tolerance_secs,
            },
            HeaderRule::ExtraData {
                max_size: self.constants.max_extra_data_size,
            },
            HeaderRule::EnergyConsumed,
        ];

        let mut pow_rules = shared_prefix.to_vec();
        pow_rules.push(HeaderRule::PowTarget);
        pow_rules.push(HeaderRule::EquihashSolution(self.equihash_validator()));

        let mut pos_rules = shared_prefix.to_vec();
        pos_rules.push(HeaderRule::Signature(self.signature_verifier.clone()));

        BlockHeaderValidator::new(RuleChainMap::new(pow_rules, pos_rules))
    }

    /// Build the pre-fork parent validator (one chain for both seal
    /// types; the pre-fork chain is PoW-only anyway).
    pub fn create_pre_unity_parent_validator(&self) -> ParentBlockHeaderValidator {
        let rules = vec![
            DependentRule::BlockNumber,
            DependentRule::Timestamp,
            self.energy_limit_rule(),
        ];

        ParentBlockHeaderValidator::new(RuleChainMap::new(rules.clone(), rules))
    }

    /// Build the post-fork parent validator: both seal types must
    /// alternate against the parent, and staking blocks additionally obey
    /// the minimum-spacing policy.
    pub fn create_unity_parent_validator(&self) -> ParentBlockHeaderValidator {
        let pow_rules = vec![
            DependentRule::BlockNumber,
            DependentRule::ParentOppositeType,
            DependentRule::Timestamp,
            self.energy_limit_rule(),
        ];

        let pos_rules = vec![
            DependentRule::BlockNumber,
            DependentRule::ParentOppositeType,
            DependentRule::Timestamp,
            DependentRule::StakingBlockTimestamp(self.staking_delay.clone()),
            self.energy_limit_rule(),
        ];

        ParentBlockHeaderValidator::new(RuleChainMap::new(pow_rules, pos_rules))
    }

    /// Build the pre-fork grandparent validator: the legacy difficulty
    /// check, populated for PoW only.
    pub fn create_pre_unity_grand_parent_validator(&self) -> GrandParentBlockHeaderValidator {
        let pow_rules = vec![GrandParentRule::Difficulty(
            self.difficulty_calculator.clone(),
        )];

        GrandParentBlockHeaderValidator::new(RuleChainMap::new(pow_rules, vec![]))
    }

    /// Build the post-fork great-grandparent validator: the unified
    /// difficulty check, shared by both seal types.
    pub fn create_unity_great_grand_parent_validator(
        &self,
    ) -> GreatGrandParentBlockHeaderValidator {
        let rules = vec![GreatGrandParentRule::UnityDifficulty(
            self.unity_difficulty_calculator.clone(),
        )];

        GreatGrandParentBlockHeaderValidator::new(RuleChainMap::new(rules.clone(), rules))
    }

    /// Required difficulty for the block following `parent`, using the
    /// calculator for the epoch `block_number` falls in.
    pub fn required_difficulty(
        &self,
        block_number: u64,
        parent: &BlockHeader,
        grand_parent: &BlockHeader,
    ) -> BigUint {
        if self.is_unity_active(block_number) {
            self.unity_difficulty_calculator.calculate(parent, grand_parent)
        } else {
            self.difficulty_calculator.calculate(parent, grand_parent)
        }
    }

    fn energy_limit_rule(&self) -> DependentRule {
        DependentRule::EnergyLimit {
            divisor: self.constants.energy_divisor_limit,
            lower_bound: self.constants.energy_lower_bound,
        }
    }
}

impl std::fmt::Debug for ChainConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConfiguration")
            .field("constants", &self.constants)
            .field("unity_fork_number", &self.unity_fork_number)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Seal, SealType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AcceptAll;

    impl EquihashSolutionVerifier for AcceptAll {
        fn is_valid_solution(&self, _: &[u8], _: &[u8], _: &[u8]) -> bool {
            true
        }
    }

    fn config_with(unity_fork_number: Option<u64>) -> ChainConfiguration {
        ChainConfiguration::new(
            ChainConstants::mainnet(),
            unity_fork_number,
            None,
            BigUint::from(0u32),
            Box::new(|_, _| Box::new(AcceptAll)),
        )
    }

    fn pow_header(number: u64, timestamp: u64) -> BlockHeader {
        BlockHeader {
            number,
            timestamp,
            seal_type: SealType::ProofOfWork.byte(),
            difficulty: BigUint::from(16u32),
            extra_data: vec![],
            energy_limit: 15_000_000,
            energy_consumed: 0,
            seal: Seal::ProofOfWork {
                nonce: vec![0; 32],
                solution: vec![0; 1408],
            },
        }
    }

    #[test]
    fn test_fork_branch_point() {
        let config = config_with(Some(1_000));
        assert!(!config.is_unity_active(0));
        assert!(!config.is_unity_active(999));
        assert!(config.is_unity_active(1_000));
        assert!(config.is_unity_active(u64::MAX));

        let never = config_with(None);
        assert!(!never.is_unity_active(u64::MAX));
    }

    #[test]
    fn test_equihash_built_exactly_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let config = ChainConfiguration::new(
            ChainConstants::mainnet(),
            None,
            None,
            BigUint::from(0u32),
            Box::new(|_, _| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Box::new(AcceptAll)
            }),
        );

        let first = config.equihash_validator();
        let second = config.equihash_validator();
        // validator construction inside the rule chains reuses the handle
        let _ = config.create_block_header_validator();
        let _ = config.create_block_header_validator();

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.n(), 210);
        assert_eq!(first.k(), 9);
    }

    #[test]
    fn test_pre_fork_parent_chain_has_no_alternation_rule() {
        let config = config_with(Some(100));
        let validator = config.create_pre_unity_parent_validator();

        // two consecutive PoW blocks are fine pre-fork
        let parent = pow_header(10, 100);
        let child = pow_header(11, 110);
        assert!(validator.validate(&child, &parent).is_ok());
    }

    #[test]
    fn test_post_fork_parent_chain_requires_alternation() {
        let config = config_with(Some(100));
        let validator = config.create_unity_parent_validator();

        let parent = pow_header(100, 1_000);
        let child = pow_header(101, 1_010);
        assert!(matches!(
            validator.validate(&child, &parent),
            Err(crate::ConsensusError::SameSealTypeAsParent { .. })
        ));
    }

    #[test]
    fn test_grand_parent_validator_skips_pos() {
        let config = config_with(None);
        let validator = config.create_pre_unity_grand_parent_validator();

        // PoS chain is unpopulated pre-fork; nothing to check
        let mut pos = pow_header(3, 130);
        pos.seal_type = SealType::ProofOfStake.byte();
        pos.seal = Seal::ProofOfStake {
            seed: vec![0; 64],
            signature: vec![0; 64],
            signing_public_key: vec![0; 32],
        };
        assert!(validator
            .validate(&pos, &pow_header(2, 120), &pow_header(1, 110))
            .is_ok());
    }

    #[test]
    fn test_required_difficulty_selects_epoch_calculator() {
        let config = config_with(Some(100));
        let grand_parent = pow_header(97, 970);
        let mut parent = pow_header(98, 980);
        parent.difficulty = BigUint::from(1_000_000u64);

        let legacy = config.required_difficulty(99, &parent, &grand_parent);
        let unity = config.required_difficulty(100, &parent, &grand_parent);

        assert_eq!(
            legacy,
            config.difficulty_calculator().calculate(&parent, &grand_parent)
        );
        assert_eq!(
            unity,
            config
                .unity_difficulty_calculator()
                .calculate(&parent, &grand_parent)
        );
        assert_ne!(legacy, unity);
    }
}
