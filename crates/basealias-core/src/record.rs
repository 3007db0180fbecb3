//! Record kinds resolvable for a canonical node

use serde::{Deserialize, Serialize};

/// SLIP-44 coin type for an EVM mainnet address record
pub const COIN_TYPE_ETH: u64 = 60;

/// The record kinds served by the remote resolver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordKind {
    /// Coin address record (`coin_type` per SLIP-44)
    Address { coin_type: u64 },
    /// Free-form text record under a key (e.g. `avatar`)
    Text { key: String },
    /// Content hash record
    ContentHash,
}

impl RecordKind {
    /// The mainnet address record
    pub fn eth_address() -> Self {
        RecordKind::Address { coin_type: COIN_TYPE_ETH }
    }

    pub fn text(key: impl Into<String>) -> Self {
        RecordKind::Text { key: key.into() }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Address { coin_type } => write!(f, "addr[{}]", coin_type),
            RecordKind::Text { key } => write!(f, "text[{}]", key),
            RecordKind::ContentHash => write!(f, "contenthash"),
        }
    }
}

/// Interpret a record value as a 20-byte EVM address
pub fn as_eth_address(value: &[u8]) -> Option<crate::Address> {
    if value.len() == 20 {
        let mut out = [0u8; 20];
        out.copy_from_slice(value);
        Some(out)
    } else {
        None
    }
}
