//! Block header data model.
//!
//! Headers are produced by the wire/storage layers and consumed here
//! read-only. The seal-type discriminant is kept as the raw wire byte so
//! that unknown values survive decoding and can be rejected by the
//! seal-type rule rather than at construction.

use blake2::{Blake2b, Digest};
use num_bigint::BigUint;

/// Size of Blake2b-256 output.
pub const HASH_SIZE: usize = 32;

/// Seal-type discriminant on a block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SealType {
    /// Block sealed with an Equihash proof-of-work solution.
    ProofOfWork = 1,
    /// Block sealed with a staking signature.
    ProofOfStake = 2,
}

impl SealType {
    /// Number of known seal types; sizes the rule-chain arrays.
    pub const COUNT: usize = 2;

    /// Decode a wire byte into a seal type.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(SealType::ProofOfWork),
            2 => Some(SealType::ProofOfStake),
            _ => None,
        }
    }

    /// The wire byte for this seal type.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// The other seal type; post-fork chains strictly alternate.
    pub fn opposite(self) -> Self {
        match self {
            SealType::ProofOfWork => SealType::ProofOfStake,
            SealType::ProofOfStake => SealType::ProofOfWork,
        }
    }

    /// Dense index used to address fixed-size rule-chain arrays.
    pub(crate) fn index(self) -> usize {
        match self {
            SealType::ProofOfWork => 0,
            SealType::ProofOfStake => 1,
        }
    }
}

/// Seal-type-specific payload attached to a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seal {
    /// Proof-of-work seal: mining nonce plus Equihash solution bytes.
    ProofOfWork {
        /// Mining nonce.
        nonce: Vec<u8>,
        /// Equihash solution bytes.
        solution: Vec<u8>,
    },
    /// Proof-of-stake seal.
    ProofOfStake {
        /// Stake-derived seed used for spacing/eligibility.
        seed: Vec<u8>,
        /// Signature over the header's mine hash.
        signature: Vec<u8>,
        /// Producer's staking public key.
        signing_public_key: Vec<u8>,
    },
}

/// A block header as seen by the consensus rules.
///
/// Consumed read-only; this crate never constructs or mutates headers
/// outside of tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block number (0 for genesis).
    pub number: u64,
    /// Timestamp in seconds.
    pub timestamp: u64,
    /// Raw seal-type byte as decoded from the wire; may be unknown.
    pub seal_type: u8,
    /// Declared difficulty.
    pub difficulty: BigUint,
    /// Arbitrary producer-supplied bytes, bounded by chain constants.
    pub extra_data: Vec<u8>,
    /// Energy limit for this block.
    pub energy_limit: u64,
    /// Energy consumed by this block.
    pub energy_consumed: u64,
    /// Seal-type-specific payload.
    pub seal: Seal,
}

impl BlockHeader {
    /// Decode the seal-type byte; `None` for unknown discriminants.
    pub fn seal_type(&self) -> Option<SealType> {
        SealType::from_byte(self.seal_type)
    }

    /// Whether this header is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }

    /// Deterministic encoding of every field except the seal payload.
    ///
    /// This is the pre-image the PoW target check and the staking
    /// signature commit to. Length-prefixed so the encoding is injective.
    pub fn mine_bytes(&self) -> Vec<u8> {
        let difficulty_bytes = self.difficulty.to_bytes_be();
        let mut bytes = Vec::with_capacity(
            8 * 4 + 1 + 4 * 2 + difficulty_bytes.len() + self.extra_data.len(),
        );
        bytes.extend_from_slice(&self.number.to_be_bytes());
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.push(self.seal_type);
        bytes.extend_from_slice(&(difficulty_bytes.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&difficulty_bytes);
        bytes.extend_from_slice(&(self.extra_data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.extra_data);
        bytes.extend_from_slice(&self.energy_limit.to_be_bytes());
        bytes.extend_from_slice(&self.energy_consumed.to_be_bytes());
        bytes
    }

    /// Blake2b-256 of [`mine_bytes`](Self::mine_bytes).
    pub fn mine_hash(&self) -> [u8; HASH_SIZE] {
        let mut hasher = Blake2b::<typenum::U32>::new();
        Digest::update(&mut hasher, self.mine_bytes());
        hasher.finalize().into()
    }
}
