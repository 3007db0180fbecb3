//! Error taxonomy for the resolution pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed wire name or label sequence. Rejected before any
    /// off-chain interaction.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Neither an alias nor an ownership-registry resolver applies.
    #[error("no resolver for node {0}")]
    NoResolver(String),

    /// A non-administrator attempted to mutate the alias store.
    /// Rejected before any other effect.
    #[error("unauthorized caller {0}")]
    Unauthorized(String),

    /// The proof references a root older than the acceptable staleness
    /// window. Staleness alone is sufficient to reject.
    #[error("stale anchor: proof at block {proof_block}, anchor at block {anchor_block}")]
    StaleAnchor { proof_block: u64, anchor_block: u64 },

    /// Cryptographic verification of a gateway response failed.
    #[error("proof invalid: {0}")]
    ProofInvalid(String),

    /// No configured gateway endpoint produced a response in time.
    #[error("no gateway reachable ({attempts} endpoint(s) tried)")]
    GatewayUnreachable { attempts: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
