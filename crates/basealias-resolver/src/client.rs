//! Verifying resolution client

use std::time::Duration;

use basealias_core::proto::{AnchorHead, GatewayRequest, GatewayResponse};
use basealias_core::{
    AliasEvent, AliasResolver, AliasStore, Error, NodeId, OwnershipOracle, RecordKind, Resolution,
    ResolverConfig, WireName, ROOT_NODE,
};
use basealias_verifier::anchor::Commitment;
use basealias_verifier::{CrossChainVerifier, Lookup, StateAnchor};

use crate::error::{ClientError, Result};

/// The single logical entry point for name resolution: walk, fetch,
/// verify. One instance serves any number of concurrent lookups; only
/// the alias store and the anchor hold shared state, and both swap
/// atomically under their readers.
pub struct ResolverClient {
    config: ResolverConfig,
    store: AliasStore,
    oracle: Box<dyn OwnershipOracle>,
    verifier: CrossChainVerifier,
    http: reqwest::Client,
}

impl ResolverClient {
    /// Client with an empty alias store and no ownership oracle
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let store = AliasStore::new(config.admin);
        Self::from_parts(config, store, Box::new(basealias_core::StaticRegistry::new()))
    }

    /// Client over an existing store (e.g. reconstructed from events) and
    /// ownership oracle.
    pub fn from_parts(
        config: ResolverConfig,
        store: AliasStore,
        oracle: Box<dyn OwnershipOracle>,
    ) -> Result<Self> {
        if let Some(fallback) = config.default_fallback {
            if store.get_alias(&fallback.0).is_none() {
                let admin = config.admin;
                store
                    .set_alias(&admin, fallback.0, config.canonical_root)
                    .map_err(ClientError::Core)?;
            }
        }
        let anchor = StateAnchor::new(config.trust, config.max_anchor_lag);
        let verifier = CrossChainVerifier::new(anchor);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self { config, store, oracle, verifier, http })
    }

    /// Rebuild the alias store from an event log
    pub fn from_events(config: ResolverConfig, events: &[AliasEvent]) -> Result<Self> {
        let store = AliasStore::from_events(config.admin, events);
        Self::from_parts(config, store, Box::new(basealias_core::StaticRegistry::new()))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The alias store; administrative mutation goes through
    /// [`AliasStore::set_alias`] with the configured admin as caller.
    pub fn store(&self) -> &AliasStore {
        &self.store
    }

    pub fn anchor(&self) -> &StateAnchor {
        self.verifier.anchor()
    }

    /// Install an authoritative local record; lookups for it never leave
    /// the process.
    pub fn set_local_record(&mut self, node: NodeId, record: RecordKind, value: Vec<u8>) {
        self.verifier.set_local_record(node, record, value);
    }

    /// Resolve the effective canonical node for a wire-encoded name.
    /// Synchronous; no off-chain interaction.
    pub fn resolve_node(&self, wire: &[u8]) -> Result<Resolution> {
        let name = WireName::decode(wire).map_err(ClientError::Core)?;
        let resolver = AliasResolver::new(&self.store, self.oracle.as_ref());
        resolver.resolve(&name).map_err(ClientError::Core)
    }

    /// Convenience over [`resolve_node`] for a dotted name
    pub fn resolve_name(&self, dotted: &str) -> Result<Resolution> {
        let name = WireName::parse(dotted).map_err(ClientError::Core)?;
        self.resolve_node(&name.encode())
    }

    /// Resolve a record for a wire-encoded name: the single logical call
    /// that walks, fetches and verifies, possibly with one off-chain
    /// round trip per attempted endpoint.
    pub async fn resolve_record(&self, wire: &[u8], record: RecordKind) -> Result<Vec<u8>> {
        let resolution = self.resolve_node(wire)?;
        self.record_of(resolution.node, record).await
    }

    /// Resolve a record for an already-resolved canonical node
    pub async fn record_of(&self, node: NodeId, record: RecordKind) -> Result<Vec<u8>> {
        match self.verifier.begin(self.config.l2_resolver, node, record) {
            Lookup::Local(value) => Ok(value),
            Lookup::Pending(request) => self.fetch_verified(&request).await,
        }
    }

    /// Try each configured endpoint in order until one yields a response
    /// that verifies. Transport failures move on to the next endpoint; a
    /// verification rejection is terminal for that response but the next
    /// endpoint still gets its chance with a fresh one.
    async fn fetch_verified(&self, request: &GatewayRequest) -> Result<Vec<u8>> {
        if self.config.gateways.is_empty() {
            return Err(ClientError::Core(Error::GatewayUnreachable { attempts: 0 }));
        }
        let mut last_rejection: Option<Error> = None;
        for endpoint in &self.config.gateways {
            let response = match self.post_proof(endpoint, request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, error = %err, "gateway request failed");
                    continue;
                }
            };
            match self.verifier.verify(request, &response) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, error = %err, "gateway response rejected");
                    last_rejection = Some(err.into());
                }
            }
        }
        Err(ClientError::Core(last_rejection.unwrap_or(Error::GatewayUnreachable {
            attempts: self.config.gateways.len(),
        })))
    }

    async fn post_proof(&self, endpoint: &str, request: &GatewayRequest) -> Result<GatewayResponse> {
        let url = format!("{}/proof", endpoint.trim_end_matches('/'));
        let resp = self.http.post(&url).json(request).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Gateway {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Fetch the head commitment from the first reachable endpoint and
    /// advance the anchor. Self-certified deployments only; finalized
    /// deployments feed [`accept_anchor`](Self::accept_anchor) from their
    /// own settlement-layer source.
    pub async fn refresh_anchor(&self) -> Result<AnchorHead> {
        let mut attempts = 0;
        for endpoint in &self.config.gateways {
            attempts += 1;
            let head = match self.fetch_anchor(endpoint).await {
                Ok(head) => head,
                Err(err) => {
                    tracing::warn!(endpoint = %endpoint, error = %err, "anchor fetch failed");
                    continue;
                }
            };
            self.anchor()
                .advance(head, &Commitment::ChainHead)
                .map_err(|e| ClientError::Core(e.into()))?;
            tracing::debug!(block = head.block, "anchor refreshed");
            return Ok(head);
        }
        Err(ClientError::Core(Error::GatewayUnreachable { attempts }))
    }

    /// Accept an anchor update with explicit commitment evidence
    pub fn accept_anchor(&self, head: AnchorHead, commitment: &Commitment) -> Result<u64> {
        self.anchor()
            .advance(head, commitment)
            .map_err(|e| ClientError::Core(e.into()))
    }

    async fn fetch_anchor(&self, endpoint: &str) -> Result<AnchorHead> {
        let url = format!("{}/anchor", endpoint.trim_end_matches('/'));
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Gateway {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp.json().await?)
    }
}

impl std::fmt::Debug for ResolverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverClient")
            .field("gateways", &self.config.gateways)
            .field("aliases", &self.store.len())
            .finish()
    }
}
