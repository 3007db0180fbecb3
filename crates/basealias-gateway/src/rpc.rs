//! JSON-RPC client for the remote chain
//!
//! Raw `alloy-rpc-client` calls with hand-rolled response DTOs; only the
//! four methods the gateway needs.

use alloy_primitives::{Address as RpcAddress, Bytes, B256, U256, U64};
use alloy_rpc_client::{ClientBuilder, RpcClient};
use alloy_rpc_types::BlockNumberOrTag;
use serde::Deserialize;

use basealias_core::proto::AnchorHead;

use crate::error::{Result, ServerError};

/// Header fields of `eth_getBlockByNumber`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeaderDto {
    pub number: U64,
    pub state_root: B256,
    pub timestamp: U64,
}

/// One storage proof entry of `eth_getProof`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProofDto {
    pub key: U256,
    pub value: U256,
    pub proof: Vec<Bytes>,
}

/// Response of `eth_getProof`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDto {
    pub address: RpcAddress,
    pub balance: U256,
    pub nonce: U64,
    pub code_hash: B256,
    pub storage_hash: B256,
    pub account_proof: Vec<Bytes>,
    pub storage_proof: Vec<StorageProofDto>,
}

pub struct RpcChain {
    client: RpcClient,
    url: String,
}

fn rpc_err(err: impl std::fmt::Display) -> ServerError {
    ServerError::ChainUnavailable(err.to_string())
}

impl RpcChain {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = ClientBuilder::default().connect(url).await?;
        Ok(Self { client, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn block_number(&self) -> Result<u64> {
        let block: U64 = self
            .client
            .request_noparams("eth_blockNumber")
            .await
            .map_err(rpc_err)?;
        Ok(block.to::<u64>())
    }

    /// Current head as a self-certified anchor commitment
    pub async fn head(&self) -> Result<AnchorHead> {
        self.header_at(BlockNumberOrTag::Latest).await
    }

    /// Header of a specific block
    pub async fn header_at(&self, block: BlockNumberOrTag) -> Result<AnchorHead> {
        let header: BlockHeaderDto = self
            .client
            .request("eth_getBlockByNumber", (block, false))
            .await
            .map_err(rpc_err)?;
        Ok(AnchorHead {
            block: header.number.to::<u64>(),
            state_root: header.state_root.0,
            timestamp: header.timestamp.to::<u64>(),
        })
    }

    pub async fn storage_at(
        &self,
        address: [u8; 20],
        slot: [u8; 32],
        block: u64,
    ) -> Result<[u8; 32]> {
        let word: B256 = self
            .client
            .request(
                "eth_getStorageAt",
                (
                    RpcAddress::from(address),
                    B256::from(slot),
                    BlockNumberOrTag::Number(block),
                ),
            )
            .await
            .map_err(rpc_err)?;
        Ok(word.0)
    }

    pub async fn proof(
        &self,
        address: [u8; 20],
        slots: &[[u8; 32]],
        block: u64,
    ) -> Result<ProofDto> {
        let keys: Vec<B256> = slots.iter().copied().map(B256::from).collect();
        self.client
            .request(
                "eth_getProof",
                (RpcAddress::from(address), keys, BlockNumberOrTag::Number(block)),
            )
            .await
            .map_err(rpc_err)
    }
}

impl std::fmt::Debug for RpcChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChain").field("url", &self.url).finish()
    }
}
