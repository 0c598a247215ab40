//! Composite header validators.
//!
//! Each validator dispatches a header to the rule chain for its seal type
//! and evaluates the chain in order, failing fast on the first violated
//! rule. Chains are fixed-size arrays indexed by the seal-type
//! discriminant, built once at construction and never mutated, so
//! validation performs no map lookups and no locking.

use crate::error::{ConsensusError, ConsensusResult};
use crate::header::{BlockHeader, SealType};
use crate::rules::{DependentRule, GrandParentRule, GreatGrandParentRule, HeaderRule};
use tracing::{debug, warn};

/// Ordered rule chains, one per seal type.
#[derive(Debug, Clone)]
pub struct RuleChainMap<R> {
    chains: [Vec<R>; SealType::COUNT],
}

impl<R> RuleChainMap<R> {
    /// Build the map from one chain per seal type. An empty chain means
    /// the validator has nothing to check for that seal type.
    pub fn new(pow_chain: Vec<R>, pos_chain: Vec<R>) -> Self {
        Self {
            chains: [pow_chain, pos_chain],
        }
    }

    fn chain(&self, seal_type: SealType) -> &[R] {
        &self.chains[seal_type.index()]
    }
}

/// Resolve the seal type, rejecting unknown discriminants before any
/// chain is consulted.
fn resolve_seal_type(header: &BlockHeader) -> ConsensusResult<SealType> {
    header.seal_type().ok_or(ConsensusError::UnknownSealType {
        seal_byte: header.seal_type,
    })
}

/// Self-consistency validator: checks a header in isolation.
#[derive(Debug, Clone)]
pub struct BlockHeaderValidator {
    rules: RuleChainMap<HeaderRule>,
}

impl BlockHeaderValidator {
    /// Create a validator over the given rule chains.
    pub fn new(rules: RuleChainMap<HeaderRule>) -> Self {
        Self { rules }
    }

    /// Validate `header` on its own, with `now_secs` as the caller's wall
    /// clock (seconds since the epoch).
    pub fn validate(&self, header: &BlockHeader, now_secs: u64) -> ConsensusResult<()> {
        let seal_type = resolve_seal_type(header)?;
        for rule in self.rules.chain(seal_type) {
            if let Err(error) = rule.check(header, now_secs) {
                warn!(
                    number = header.number,
                    hash = %hex::encode(header.mine_hash()),
                    rule = rule.name(),
                    %error,
                    "header rejected"
                );
                return Err(error);
            }
        }
        debug!(number = header.number, ?seal_type, "header validation passed");
        Ok(())
    }
}

/// Parent-dependent validator.
#[derive(Debug, Clone)]
pub struct ParentBlockHeaderValidator {
    rules: RuleChainMap<DependentRule>,
}

impl ParentBlockHeaderValidator {
    /// Create a validator over the given rule chains.
    pub fn new(rules: RuleChainMap<DependentRule>) -> Self {
        Self { rules }
    }

    /// Validate `header` against its parent.
    pub fn validate(&self, header: &BlockHeader, parent: &BlockHeader) -> ConsensusResult<()> {
        let seal_type = resolve_seal_type(header)?;
        for rule in self.rules.chain(seal_type) {
            if let Err(error) = rule.check(header, parent) {
                warn!(number = header.number, rule = rule.name(), %error, "header rejected");
                return Err(error);
            }
        }
        debug!(number = header.number, ?seal_type, "parent validation passed");
        Ok(())
    }
}

/// Grandparent-dependent validator (pre-fork difficulty check).
#[derive(Debug, Clone)]
pub struct GrandParentBlockHeaderValidator {
    rules: RuleChainMap<GrandParentRule>,
}

impl GrandParentBlockHeaderValidator {
    /// Create a validator over the given rule chains.
    pub fn new(rules: RuleChainMap<GrandParentRule>) -> Self {
        Self { rules }
    }

    /// Validate `header` against its parent and grandparent.
    pub fn validate(
        &self,
        header: &BlockHeader,
        parent: &BlockHeader,
        grand_parent: &BlockHeader,
    ) -> ConsensusResult<()> {
        let seal_type = resolve_seal_type(header)?;
        for rule in self.rules.chain(seal_type) {
            if let Err(error) = rule.check(header, parent, grand_parent) {
                warn!(number = header.number, rule = rule.name(), %error, "header rejected");
                return Err(error);
            }
        }
        debug!(number = header.number, ?seal_type, "grandparent validation passed");
        Ok(())
    }
}

/// Great-grandparent-dependent validator (post-fork difficulty check).
///
/// Takes the candidate's grandparent and great-grandparent: under strict
/// seal-type alternation those are the candidate's same-seal-type ancestor
/// and the block before it, which carry the timing the unified retarget
/// needs.
#[derive(Debug, Clone)]
pub struct GreatGrandParentBlockHeaderValidator {
    rules: RuleChainMap<GreatGrandParentRule>,
}

impl GreatGrandParentBlockHeaderValidator {
    /// Create a validator over the given rule chains.
    pub fn new(rules: RuleChainMap<GreatGrandParentRule>) -> Self {
        Self { rules }
    }

    /// Validate `header` against its grandparent and great-grandparent.
    pub fn validate(
        &self,
        header: &BlockHeader,
        grand_parent: &BlockHeader,
        great_grand_parent: &BlockHeader,
    ) -> ConsensusResult<()> {
        let seal_type = resolve_seal_type(header)?;
        for rule in self.rules.chain(seal_type) {
            if let Err(error) = rule.check(header, grand_parent, great_grand_parent) {
                warn!(number = header.number, rule = rule.name(), %error, "header rejected");
                return Err(error);
            }
        }
        debug!(
            number = header.number,
            ?seal_type,
            "great-grandparent validation passed"
        );
        Ok(())
    }
}
