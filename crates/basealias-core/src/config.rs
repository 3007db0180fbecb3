//! Resolver configuration

use serde::{Deserialize, Serialize};

use crate::{Address, NodeId};

/// How updates to the remote-chain state anchor are trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Accept whatever root the remote chain's head reports. Suitable when
    /// the remote chain operator is trusted and the proofs only guard the
    /// data channel.
    SelfCertified,
    /// Only accept roots carried by the rollup's own output commitment.
    Finalized,
}

impl Default for TrustMode {
    fn default() -> Self {
        TrustMode::SelfCertified
    }
}

impl std::fmt::Display for TrustMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustMode::SelfCertified => write!(f, "self_certified"),
            TrustMode::Finalized => write!(f, "finalized"),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_max_anchor_lag() -> u64 {
    64
}

/// Configuration for a resolution client
///
/// An empty `gateways` list disables off-chain verification entirely:
/// node resolution still works, but record queries that would need a
/// proof fail fast. There are no compiled-in default endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// The only address allowed to mutate the alias store
    #[serde(with = "crate::hexfmt::bytes20")]
    pub admin: Address,
    /// Root registry contract (ownership fallback)
    #[serde(with = "crate::hexfmt::bytes20")]
    pub registry: Address,
    /// Optional wrapping contract consulted for wrapped owners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_wrapper: Option<HexAddress>,
    /// Remote resolver contract holding the records on the second chain
    #[serde(with = "crate::hexfmt::bytes20")]
    pub l2_resolver: Address,
    /// Root node of the canonical subtree (e.g. namehash of `base.eth`)
    #[serde(with = "crate::hexfmt::bytes32")]
    pub canonical_root: NodeId,
    /// Gateway endpoints, tried in order
    #[serde(default)]
    pub gateways: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How many blocks a proof may trail the anchor before it is stale
    #[serde(default = "default_max_anchor_lag")]
    pub max_anchor_lag: u64,
    #[serde(default)]
    pub trust: TrustMode,
    /// Source node aliased onto `canonical_root` at startup, the
    /// deployment's default fallback. The `eth` TLD node projects
    /// `raffy.eth` to `raffy.base.eth`; the root node projects the full
    /// label sequence instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_fallback: Option<HexNode>,
}

/// Hex-serialized address wrapper for optional fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexAddress(#[serde(with = "crate::hexfmt::bytes20")] pub Address);

/// Hex-serialized node wrapper for optional fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexNode(#[serde(with = "crate::hexfmt::bytes32")] pub NodeId);

impl ResolverConfig {
    pub fn new(admin: Address, registry: Address, l2_resolver: Address, canonical_root: NodeId) -> Self {
        Self {
            admin,
            registry,
            name_wrapper: None,
            l2_resolver,
            canonical_root,
            gateways: Vec::new(),
            request_timeout_ms: default_timeout_ms(),
            max_anchor_lag: default_max_anchor_lag(),
            trust: TrustMode::default(),
            default_fallback: None,
        }
    }

    pub fn with_gateways(mut self, gateways: Vec<String>) -> Self {
        self.gateways = gateways;
        self
    }

    pub fn with_name_wrapper(mut self, wrapper: Address) -> Self {
        self.name_wrapper = Some(HexAddress(wrapper));
        self
    }

    pub fn with_trust(mut self, trust: TrustMode) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_default_fallback(mut self, source: NodeId) -> Self {
        self.default_fallback = Some(HexNode(source));
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}
