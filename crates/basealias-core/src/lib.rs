//! basealias-core: types and algorithms for alias resolution
//!
//! This crate holds everything that is pure computation in the alias
//! resolution pipeline:
//! - hierarchical name hashing and DNS wire-name decoding
//! - the administrator-controlled alias store (source node -> canonical node)
//! - the ancestor-walking resolver that projects aliased names onto the
//!   canonical subtree
//! - the storage layout of the remote resolver contract, so that client and
//!   gateway derive identical storage-slot descriptors from a logical query
//! - the wire protocol DTOs exchanged with gateways
//!
//! Nothing in here performs I/O beyond config load/save; the gateway and
//! resolver crates drive the network side.

mod alias;
mod config;
mod error;
mod name;
mod record;
mod registry;
mod resolver;

pub mod layout;
pub mod proto;

#[doc(hidden)]
pub mod hexfmt;

pub use alias::{AliasEvent, AliasStore, NO_ALIAS};
pub use config::{HexAddress, HexNode, ResolverConfig, TrustMode};
pub use error::Error;
pub use name::{label_hash, namehash, node_id, WireName};
pub use record::{RecordKind, COIN_TYPE_ETH};
pub use registry::{OwnershipOracle, OwnershipRecord, StaticRegistry, WrappedRegistry};
pub use resolver::{AliasResolver, Resolution, ResolutionSource};

pub type Result<T> = std::result::Result<T, Error>;

/// 20-byte account address in either hierarchy's chain
pub type Address = [u8; 20];

/// 32-byte node identifier in a naming hierarchy
pub type NodeId = [u8; 32];

/// 32-byte keccak hash of a single label
pub type LabelHash = [u8; 32];

/// The reserved id of the hierarchy root
pub const ROOT_NODE: NodeId = [0u8; 32];

/// Constants shared across the workspace
pub mod constants {
    /// Maximum length of a single DNS wire label
    pub const MAX_LABEL_LEN: usize = 63;

    /// Maximum decoded record value size accepted from a gateway, in bytes
    pub const MAX_RECORD_LEN: usize = 4096;
}
