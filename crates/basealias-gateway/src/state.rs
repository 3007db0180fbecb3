//! Gateway state: the chain backend plus the proof-assembly logic

use std::sync::Arc;

use basealias_core::layout;
use basealias_core::proto::{AnchorHead, GatewayRequest, GatewayResponse};

use crate::chain::{ChainBackend, MemoryChain};
use crate::error::{Result, ServerError};
use crate::metrics;

pub struct GatewayState {
    backend: ChainBackend,
    metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl GatewayState {
    pub fn new(backend: ChainBackend) -> Self {
        Self { backend, metrics_handle: None }
    }

    pub fn with_metrics(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    pub fn backend(&self) -> &ChainBackend {
        &self.backend
    }

    /// Mutable access to the in-memory chain, if that is the backend.
    /// Fixtures use this to seed records between requests.
    pub fn memory_mut(&mut self) -> Option<&mut MemoryChain> {
        match &mut self.backend {
            ChainBackend::Memory(memory) => Some(memory),
            ChainBackend::Rpc(_) => None,
        }
    }

    pub fn render_metrics(&self) -> Option<String> {
        self.metrics_handle.as_ref().map(|handle| handle.render())
    }

    /// Current head, served to clients as a self-certified commitment
    pub async fn anchor_head(&self) -> Result<AnchorHead> {
        let head = self.backend.head().await?;
        metrics::set_anchor_block(head.block);
        Ok(head)
    }

    /// Answer a proof request.
    ///
    /// The slot set is derived exactly the way the verifier re-derives it:
    /// version slot, then the value head slot for the proven version, then
    /// one continuation slot per 32-byte chunk of a long value. All slots
    /// are proven in a single pass against one pinned block.
    pub async fn answer(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        let head = self.backend.head().await?;
        metrics::set_anchor_block(head.block);

        let version_slot = layout::record_version_slot(&request.node);
        let version_word = self
            .backend
            .storage_at(request.resolver, version_slot, head.block)
            .await?;
        let version = layout::decode_u64_word(&version_word)
            .map_err(|e| ServerError::Proof(e.to_string()))?;

        let head_slot = layout::value_head_slot(version, &request.node, &request.record);
        let head_word = self
            .backend
            .storage_at(request.resolver, head_slot, head.block)
            .await?;
        let tail_count =
            layout::tail_slot_count(&head_word).map_err(|e| ServerError::Proof(e.to_string()))?;

        let mut slots = Vec::with_capacity(2 + tail_count);
        slots.push(version_slot);
        slots.push(head_slot);
        for i in 0..tail_count {
            slots.push(layout::bytes_tail_slot(&head_slot, i as u64));
        }

        let (state_root, account_proof, proven) = self
            .backend
            .proof(request.resolver, &slots, head.block)
            .await?;

        tracing::debug!(
            node = %hex::encode(request.node),
            record = %request.record,
            block = head.block,
            slots = proven.len(),
            "proof assembled"
        );

        Ok(GatewayResponse {
            block: head.block,
            state_root,
            account_proof,
            slots: proven,
        })
    }
}

/// Shared gateway state type
pub type SharedState = Arc<tokio::sync::RwLock<GatewayState>>;

/// Create shared state from a backend
pub fn create_shared_state(backend: ChainBackend) -> SharedState {
    Arc::new(tokio::sync::RwLock::new(GatewayState::new(backend)))
}
