//! basealias-verifier: anchored state-proof verification
//!
//! Holds the trusted side of the cross-chain protocol: the state anchor
//! tracking the remote chain's roots, the Merkle-Patricia proof walk, and
//! the verifier that turns a gateway response into a record value or a
//! rejection. Nothing here talks to the network; gateways and clients feed
//! it data and it answers on cryptographic grounds alone.

pub mod anchor;
pub mod build;
pub mod error;
pub mod trie;
pub mod verify;

pub use anchor::{AnchorEvent, Commitment, StateAnchor};
pub use error::VerifyError;
pub use trie::{decode_account, verify_proof, Account, TrieError};
pub use verify::{CrossChainVerifier, Lookup};
