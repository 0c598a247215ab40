//! Legacy proof-of-work difficulty retarget.
//!
//! Used on the pre-fork, PoW-only chain. The retarget compares the
//! parent/grandparent timestamp delta against the chain's block-time band
//! and moves the difficulty by at most one step per block, where a step is
//! `parent_difficulty / difficulty_bound_divisor` (never less than 1).
//! All arithmetic is integer-only so every node reproduces the result
//! bit-for-bit.

use crate::constants::ChainConstants;
use crate::header::BlockHeader;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;

/// Legacy difficulty calculator.
///
/// A small value object holding only the captured constants; cheap to
/// clone into the rules that need it.
#[derive(Debug, Clone)]
pub struct DifficultyCalculator {
    block_time_lower_bound: u64,
    block_time_upper_bound: u64,
    bound_divisor: BigUint,
    minimum_difficulty: BigUint,
}

impl DifficultyCalculator {
    /// Create a calculator from chain constants.
    pub fn new(constants: &ChainConstants) -> Self {
        Self {
            block_time_lower_bound: constants.block_time_lower_bound,
            block_time_upper_bound: constants.block_time_upper_bound,
            bound_divisor: BigUint::from(constants.difficulty_bound_divisor),
            minimum_difficulty: constants.minimum_difficulty.clone(),
        }
    }

    /// Create with explicit parameters (for testing).
    pub fn with_params(
        block_time_lower_bound: u64,
        block_time_upper_bound: u64,
        bound_divisor: u64,
        minimum_difficulty: u64,
    ) -> Self {
        Self {
            block_time_lower_bound,
            block_time_upper_bound,
            bound_divisor: BigUint::from(bound_divisor),
            minimum_difficulty: BigUint::from(minimum_difficulty),
        }
    }

    /// Required difficulty for the block following `parent`.
    ///
    /// The block immediately after genesis inherits the genesis difficulty
    /// unchanged; retargeting needs two real ancestors.
    ///
    /// Total over any two headers: a non-increasing timestamp pair
    /// saturates the delta to zero (and is rejected separately by the
    /// timestamp rule before the difficulty is trusted).
    pub fn calculate(&self, parent: &BlockHeader, grand_parent: &BlockHeader) -> BigUint {
        if parent.is_genesis() {
            return parent.difficulty.clone();
        }

        let delta = parent.timestamp.saturating_sub(grand_parent.timestamp);
        let output = self.calculate_target(delta, &parent.difficulty);

        trace!(delta, parent = %parent.difficulty, output = %output, "legacy retarget");
        output
    }

    fn calculate_target(&self, delta: u64, parent_difficulty: &BigUint) -> BigUint {
        let mut step = parent_difficulty / &self.bound_divisor;
        // a small difficulty still moves
        if step.is_zero() {
            step = BigUint::one();
        }

        let outcome = if delta <= self.block_time_lower_bound {
            parent_difficulty + &step
        } else if delta >= self.block_time_upper_bound {
            // difficulty is floored below, so saturate instead of underflowing
            if *parent_difficulty > step {
                parent_difficulty - &step
            } else {
                BigUint::zero()
            }
        } else {
            parent_difficulty.clone()
        };

        outcome.max(self.minimum_difficulty.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Seal;

    fn header(number: u64, timestamp: u64, difficulty: u64) -> BlockHeader {
        BlockHeader {
            number,
            timestamp,
            seal_type: 1,
            difficulty: BigUint::from(difficulty),
            extra_data: vec![],
            energy_limit: 15_000_000,
            energy_consumed: 0,
            seal: Seal::ProofOfWork {
                nonce: vec![0; 32],
                solution: vec![0; 1408],
            },
        }
    }

    fn calculator() -> DifficultyCalculator {
        DifficultyCalculator::with_params(5, 15, 2048, 16)
    }

    #[test]
    fn test_genesis_parent_returns_parent_difficulty() {
        let calc = calculator();
        let genesis = header(0, 100, 123_456);

        // Grandparent values must not matter for the first block.
        for grand_parent in [header(0, 0, 1), header(0, 99, 999_999)] {
            assert_eq!(
                calc.calculate(&genesis, &grand_parent),
                BigUint::from(123_456u32)
            );
        }
    }

    #[test]
    fn test_fast_blocks_increase_difficulty() {
        let calc = calculator();
        let grand_parent = header(1, 100, 1 << 20);
        let parent = header(2, 105, 1 << 20); // delta == lower bound

        let expected = BigUint::from((1u64 << 20) + (1u64 << 20) / 2048);
        assert_eq!(calc.calculate(&parent, &grand_parent), expected);
    }

    #[test]
    fn test_slow_blocks_decrease_difficulty() {
        let calc = calculator();
        let grand_parent = header(1, 100, 1 << 20);
        let parent = header(2, 115, 1 << 20); // delta == upper bound

        let expected = BigUint::from((1u64 << 20) - (1u64 << 20) / 2048);
        assert_eq!(calc.calculate(&parent, &grand_parent), expected);
    }

    #[test]
    fn test_on_target_blocks_keep_difficulty() {
        let calc = calculator();
        let grand_parent = header(1, 100, 1 << 20);
        let parent = header(2, 110, 1 << 20); // inside the band

        assert_eq!(calc.calculate(&parent, &grand_parent), BigUint::from(1u64 << 20));
    }

    #[test]
    fn test_step_never_below_one() {
        // parent difficulty 100 / divisor 2048 rounds to 0; step must be 1
        let calc = calculator();
        let grand_parent = header(1, 100, 100);
        let parent = header(2, 103, 100);

        assert_eq!(calc.calculate(&parent, &grand_parent), BigUint::from(101u32));
    }

    #[test]
    fn test_floor_at_minimum_difficulty() {
        let calc = calculator();
        let grand_parent = header(1, 100, 16);
        let parent = header(2, 200, 16); // slow block at the floor

        assert_eq!(calc.calculate(&parent, &grand_parent), BigUint::from(16u32));
    }

    #[test]
    fn test_total_over_malformed_timestamp_order() {
        // Reversed timestamps must not panic; the timestamp rule rejects
        // such pairs before the difficulty is trusted.
        let calc = calculator();
        let grand_parent = header(1, 500, 1 << 20);
        let parent = header(2, 100, 1 << 20);

        // Saturated delta of 0 falls in the "too fast" band.
        let expected = BigUint::from((1u64 << 20) + (1u64 << 20) / 2048);
        assert_eq!(calc.calculate(&parent, &grand_parent), expected);
    }
}
