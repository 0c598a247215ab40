//! Unified post-fork difficulty retarget.
//!
//! Once the Unity fork activates, PoW and PoS headers share this single
//! retarget. Under strict seal-type alternation the timing signal for a
//! candidate comes from its same-seal-type ancestor two generations back
//! and the block before that one, so the calculator keeps the familiar
//! two-ancestor contract and the great-grandparent validator feeds it the
//! right pair.
//!
//! The barrier and the adjustment rates are chain-policy data carried in
//! [`ChainConstants`], not protocol-derived values.

use crate::constants::ChainConstants;
use crate::header::BlockHeader;
use num_bigint::BigUint;
use tracing::trace;

/// Post-fork difficulty calculator, shared by both seal types.
#[derive(Debug, Clone)]
pub struct UnityDifficultyCalculator {
    barrier_secs: u64,
    increase_numerator: BigUint,
    increase_denominator: BigUint,
    decrease_numerator: BigUint,
    decrease_denominator: BigUint,
    minimum_difficulty: BigUint,
}

impl UnityDifficultyCalculator {
    /// Create a calculator from chain constants.
    pub fn new(constants: &ChainConstants) -> Self {
        Self {
            barrier_secs: constants.unity_barrier_secs,
            increase_numerator: BigUint::from(constants.unity_increase_numerator),
            increase_denominator: BigUint::from(constants.unity_increase_denominator),
            decrease_numerator: BigUint::from(constants.unity_decrease_numerator),
            decrease_denominator: BigUint::from(constants.unity_decrease_denominator),
            minimum_difficulty: constants.minimum_difficulty.clone(),
        }
    }

    /// Required difficulty for the block following `parent`, where `parent`
    /// and `grand_parent` are the two adjacent ancestors the import
    /// pipeline selected (two and three generations back from the
    /// candidate, post-fork).
    ///
    /// Total over any two headers; timestamp ordering is enforced by the
    /// timestamp rule, not here.
    pub fn calculate(&self, parent: &BlockHeader, grand_parent: &BlockHeader) -> BigUint {
        if parent.is_genesis() {
            return parent.difficulty.clone();
        }

        let delta = parent.timestamp.saturating_sub(grand_parent.timestamp);
        let outcome = if delta >= self.barrier_secs {
            &parent.difficulty * &self.decrease_numerator / &self.decrease_denominator
        } else {
            &parent.difficulty * &self.increase_numerator / &self.increase_denominator
        };

        let output = outcome.max(self.minimum_difficulty.clone());
        trace!(delta, parent = %parent.difficulty, output = %output, "unity retarget");
        output
    }
}
