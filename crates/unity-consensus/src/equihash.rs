//! Equihash solution validation wrapper.
//!
//! The actual Equihash verifier is an external collaborator supplied at
//! startup; this module wraps it together with the chain's (N, K)
//! parameters and performs the cheap structural checks (solution byte
//! length) before paying for verification.

use crate::header::{BlockHeader, Seal};

/// Opaque Equihash solution verifier.
///
/// Implementations check that `solution` is a valid Equihash(N, K)
/// solution for `mine_hash || nonce`.
pub trait EquihashSolutionVerifier: Send + Sync {
    /// Whether the solution verifies against the header's mine hash and
    /// nonce under the configured (N, K).
    fn is_valid_solution(&self, solution: &[u8], mine_hash: &[u8], nonce: &[u8]) -> bool;
}

/// Equihash validator bound to a chain's (N, K) parameters.
///
/// Constructed at most once per process through
/// [`ChainConfiguration::equihash_validator`](crate::ChainConfiguration::equihash_validator).
pub struct EquihashValidator {
    n: u32,
    k: u32,
    backend: Box<dyn EquihashSolutionVerifier>,
}

impl EquihashValidator {
    /// Create a validator for the given parameters and backend.
    pub fn new(n: u32, k: u32, backend: Box<dyn EquihashSolutionVerifier>) -> Self {
        Self { n, k, backend }
    }

    /// The N parameter.
    pub fn n(&self) -> u32 {
        self.n
    }

    /// The K parameter.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Expected solution size in bytes: `2^k * (n / (k + 1) + 1) / 8`.
    ///
    /// 1408 bytes for the mainnet (210, 9) parameters.
    pub fn solution_size(&self) -> usize {
        ((1usize << self.k) * (self.n as usize / (self.k as usize + 1) + 1)) / 8
    }

    /// Validate the PoW seal attached to `header`.
    ///
    /// Returns false for non-PoW seals, wrong-length solutions, and
    /// solutions the backend rejects.
    pub fn validate(&self, header: &BlockHeader) -> bool {
        let (nonce, solution) = match &header.seal {
            Seal::ProofOfWork { nonce, solution } => (nonce, solution),
            Seal::ProofOfStake { .. } => return false,
        };

        if solution.len() != self.solution_size() {
            return false;
        }

        self.backend
            .is_valid_solution(solution, &header.mine_hash(), nonce)
    }
}

impl std::fmt::Debug for EquihashValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquihashValidator")
            .field("n", &self.n)
            .field("k", &self.k)
            .finish()
    }
}
