//! Block reward schedule.
//!
//! Two regimes with a hard boundary at the monetary-update block number:
//!
//! - **Legacy**: a linear ramp from [`RAMP_START_REWARD`] to
//!   [`PLATEAU_REWARD`] over the first [`RAMP_UP_BLOCKS`] blocks, then a
//!   flat plateau.
//! - **Post-update**: a flat annual-percentage reward derived from the
//!   configured initial total supply.
//!
//! There is no interpolation across the boundary: `reward(n - 1)` uses the
//! legacy formula and `reward(n)` the post-update formula for
//! `n = monetary_update_block`.

use num_bigint::BigUint;

/// Length of the legacy ramp-up period in blocks (~30 days at 10 s).
pub const RAMP_UP_BLOCKS: u64 = 259_200;

/// Reward at block 0 of the ramp, in wei-scale units.
pub const RAMP_START_REWARD: u64 = 748_994_641_621_655_092;

/// Plateau reward reached at the end of the ramp.
pub const PLATEAU_REWARD: u64 = 1_497_989_283_243_310_185;

/// Annual issuance after the monetary update, in basis points (1%).
pub const ANNUAL_INTEREST_BASIS_POINTS: u64 = 100;

/// Basis-point divisor.
pub const BASIS_POINT_DIVISOR: u64 = 10_000;

/// Blocks per year at the 10-second target.
pub const BLOCKS_PER_YEAR: u64 = 3_153_600;

/// Block rewards calculator.
///
/// Pure function of the block number; constructed once per process.
#[derive(Debug, Clone)]
pub struct RewardsCalculator {
    /// First block number governed by the post-update schedule, if any.
    monetary_update_block: Option<u64>,
    /// Flat reward after the monetary update.
    post_update_reward: BigUint,
    /// Per-block ramp slope (fixed-point: divide by `RAMP_UP_BLOCKS`).
    ramp_slope: BigUint,
}

impl RewardsCalculator {
    /// Create a rewards calculator.
    ///
    /// `initial_supply` only matters when a monetary-update block number is
    /// configured; pass zero otherwise.
    pub fn new(monetary_update_block: Option<u64>, initial_supply: BigUint) -> Self {
        let post_update_reward = initial_supply * ANNUAL_INTEREST_BASIS_POINTS
            / BASIS_POINT_DIVISOR
            / BLOCKS_PER_YEAR;
        Self {
            monetary_update_block,
            post_update_reward,
            ramp_slope: BigUint::from(PLATEAU_REWARD - RAMP_START_REWARD),
        }
    }

    /// Block reward for the given block number.
    pub fn reward(&self, number: u64) -> BigUint {
        match self.monetary_update_block {
            Some(update) if number >= update => self.post_update_reward.clone(),
            _ => self.legacy_reward(number),
        }
    }

    fn legacy_reward(&self, number: u64) -> BigUint {
        if number <= RAMP_UP_BLOCKS {
            BigUint::from(RAMP_START_REWARD) + &self.ramp_slope * number / RAMP_UP_BLOCKS
        } else {
            BigUint::from(PLATEAU_REWARD)
        }
    }
}
