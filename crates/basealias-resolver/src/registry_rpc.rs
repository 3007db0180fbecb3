//! Ownership snapshots over the root registry's public read interface
//!
//! `eth_call`s `owner(bytes32)` / `resolver(bytes32)` for every ancestor
//! of a name (and `ownerOf(uint256)` on the wrapping contract when the
//! registry reports it as owner), collecting the answers into a
//! `StaticRegistry` the alias walk can fall back on. Production code
//! never reads the registry's storage layout directly.

use alloy_primitives::{Address as RpcAddress, Bytes};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_rpc_types::BlockNumberOrTag;
use serde::Serialize;

use basealias_core::{Address, NodeId, StaticRegistry, WireName};

use crate::error::{ClientError, Result};

/// `owner(bytes32)`
const SELECTOR_OWNER: [u8; 4] = [0x02, 0x57, 0x1b, 0xe3];
/// `resolver(bytes32)`
const SELECTOR_RESOLVER: [u8; 4] = [0x01, 0x78, 0xb8, 0xbf];
/// `ownerOf(uint256)`
const SELECTOR_OWNER_OF: [u8; 4] = [0x63, 0x52, 0x21, 0x1e];

#[derive(Debug, Clone, Serialize)]
struct CallRequest {
    to: RpcAddress,
    data: Bytes,
}

pub struct RegistryFetcher {
    client: RpcClient,
    registry: Address,
    wrapper: Option<Address>,
}

impl RegistryFetcher {
    pub async fn connect(
        url: &str,
        registry: Address,
        wrapper: Option<Address>,
    ) -> anyhow::Result<Self> {
        let client = ClientBuilder::default().connect(url).await?;
        Ok(Self { client, registry, wrapper })
    }

    /// Snapshot ownership for every ancestor of `name` into a static
    /// registry usable as the walk's ownership oracle.
    pub async fn snapshot(&self, name: &WireName) -> Result<StaticRegistry> {
        let mut registry = StaticRegistry::new();
        for node in name.node_ids().iter().skip(1) {
            let Some(mut owner) = self.call_address(self.registry, SELECTOR_OWNER, node).await?
            else {
                continue;
            };
            if let Some(wrapper) = self.wrapper {
                if owner == wrapper {
                    if let Some(wrapped) =
                        self.call_address(wrapper, SELECTOR_OWNER_OF, node).await?
                    {
                        owner = wrapped;
                    }
                }
            }
            let resolver = self.call_address(self.registry, SELECTOR_RESOLVER, node).await?;
            registry.set_record(*node, owner, resolver);
        }
        Ok(registry)
    }

    /// One-word `eth_call` returning an address; the zero address means
    /// "none".
    async fn call_address(
        &self,
        to: Address,
        selector: [u8; 4],
        node: &NodeId,
    ) -> Result<Option<Address>> {
        let call = CallRequest {
            to: RpcAddress::from(to),
            data: Bytes::from(call_data(selector, node)),
        };
        let out: Bytes = self
            .client
            .request("eth_call", (call, BlockNumberOrTag::Latest))
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        if out.len() < 32 {
            return Ok(None);
        }
        let mut address = [0u8; 20];
        address.copy_from_slice(&out[12..32]);
        Ok((address != [0u8; 20]).then_some(address))
    }
}

/// Calldata of a one-argument node query: selector followed by the node
/// id as a single 32-byte word
fn call_data(selector: [u8; 4], node: &NodeId) -> Vec<u8> {
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector);
    data.extend_from_slice(node);
    data
}

impl std::fmt::Debug for RegistryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryFetcher")
            .field("registry", &format!("0x{}", hex::encode(self.registry)))
            .finish()
    }
}
