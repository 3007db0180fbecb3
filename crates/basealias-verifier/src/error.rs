//! Verification error types
//!
//! Everything here converts into the core taxonomy at the crate boundary:
//! staleness maps to `StaleAnchor`, all other failures to `ProofInvalid`.
//! A rejection is terminal for the request that produced it.

use thiserror::Error;

use crate::trie::TrieError;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("stale anchor: proof at block {proof_block}, anchor at block {anchor_block}")]
    Stale { proof_block: u64, anchor_block: u64 },

    #[error("proof block {proof_block} is ahead of the anchor at block {anchor_block}")]
    AheadOfAnchor { proof_block: u64, anchor_block: u64 },

    #[error("no anchor accepted yet")]
    NoAnchor,

    #[error("state root mismatch at block {block}")]
    RootMismatch { block: u64 },

    #[error("anchor update requires an output-proposal commitment in finalized mode")]
    CommitmentRequired,

    #[error("output root mismatch: computed {computed}, committed {committed}")]
    OutputRootMismatch { computed: String, committed: String },

    #[error("trie proof: {0}")]
    Trie(#[from] TrieError),

    #[error("resolver account {0} is absent under the anchored root")]
    AccountMissing(String),

    #[error("slot descriptor mismatch: derived {expected}, response has {got}")]
    SlotMismatch { expected: String, got: String },

    #[error("response carries {got} proven slot(s), descriptor needs {expected}")]
    SlotCount { expected: usize, got: usize },

    #[error("claimed value for slot {0} does not match the proven storage word")]
    ValueMismatch(String),

    #[error(transparent)]
    Core(#[from] basealias_core::Error),
}

impl From<VerifyError> for basealias_core::Error {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Stale { proof_block, anchor_block } => {
                basealias_core::Error::StaleAnchor { proof_block, anchor_block }
            }
            VerifyError::Core(inner) => inner,
            other => basealias_core::Error::ProofInvalid(other.to_string()),
        }
    }
}
