//! End-to-end gateway/client integration tests
//!
//! Spins the axum gateway over an in-memory chain on an ephemeral port
//! and drives full resolve-and-verify flows through the client, including
//! endpoint fallback and rejection of tampered responses.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio::net::TcpListener;

use basealias_core::{namehash, Error, NodeId, RecordKind, ResolverConfig};
use basealias_gateway::chain::{ChainBackend, MemoryChain};
use basealias_gateway::routes::create_router;
use basealias_gateway::state::{create_shared_state, SharedState};
use basealias_resolver::{ClientError, ResolverClient};

const ADMIN: [u8; 20] = [0xad; 20];
const REGISTRY: [u8; 20] = [0x01; 20];
const L2_RESOLVER: [u8; 20] = [0xc6; 20];

const AVATAR_URL: &str = "https://raffy.antistupid.com/chonker.png";

static PORT_COUNTER: AtomicU16 = AtomicU16::new(19300);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

fn chonker_node() -> NodeId {
    namehash("chonker.base.eth")
}

/// Chain content mirroring the deployed resolver's records
fn default_chain() -> MemoryChain {
    let mut chain = MemoryChain::new();
    chain.set_record(L2_RESOLVER, chonker_node(), &RecordKind::text("avatar"), AVATAR_URL.as_bytes());
    chain.set_record(L2_RESOLVER, chonker_node(), &RecordKind::eth_address(), &[0x11; 20]);
    chain.set_record(L2_RESOLVER, chonker_node(), &RecordKind::ContentHash, &[0xe3, 0x01, 0x01, 0x70]);
    chain.set_record(L2_RESOLVER, namehash("abc.chonker.base.eth"), &RecordKind::eth_address(), &[0x22; 20]);
    chain.set_record(L2_RESOLVER, namehash("raffy.base.eth"), &RecordKind::eth_address(), &[0x33; 20]);
    chain
}

/// Test harness running one gateway on an ephemeral port
pub struct TestHarness {
    pub server_url: String,
    pub state: SharedState,
    pub http: Client,
    _shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_chain(default_chain()).await
    }

    pub async fn with_chain(chain: MemoryChain) -> Self {
        let state = create_shared_state(ChainBackend::Memory(chain));

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let port = next_port();
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();
        let server_url = format!("http://127.0.0.1:{}", port);

        let router = create_router(state.clone());
        let listener = TcpListener::bind(addr).await.expect("Bind should succeed");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let http = Client::new();
        for _ in 0..10 {
            if http
                .get(format!("{}/health", server_url))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Self {
            server_url,
            state,
            http,
            _shutdown: Some(shutdown_tx),
        }
    }

    /// Client configured against this gateway alone
    pub fn client(&self) -> ResolverClient {
        ResolverClient::new(self.config(vec![self.server_url.clone()])).unwrap()
    }

    pub fn config(&self, gateways: Vec<String>) -> ResolverConfig {
        ResolverConfig::new(ADMIN, REGISTRY, L2_RESOLVER, namehash("base.eth"))
            .with_gateways(gateways)
    }
}

#[tokio::test]
async fn test_health_and_anchor_endpoints() {
    let harness = TestHarness::new().await;

    let health: serde_json::Value = harness
        .http
        .get(format!("{}/health", harness.server_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ready");
    assert_eq!(health["backend"], "memory");

    let anchor: serde_json::Value = harness
        .http
        .get(format!("{}/anchor", harness.server_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(anchor["block"], 1);
    assert!(anchor["state_root"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn test_resolve_records_end_to_end() {
    let harness = TestHarness::new().await;
    let client = harness.client();
    client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();

    client.refresh_anchor().await.unwrap();

    let wire = b"\x05chonk\x03xyz\x00";
    // long text value exercises the continuation-slot path over HTTP
    let avatar = client
        .resolve_record(wire, RecordKind::text("avatar"))
        .await
        .unwrap();
    assert_eq!(avatar, AVATAR_URL.as_bytes());

    let address = client.resolve_record(wire, RecordKind::eth_address()).await.unwrap();
    assert_eq!(address, vec![0x11; 20]);

    let hash = client.resolve_record(wire, RecordKind::ContentHash).await.unwrap();
    assert_eq!(hash, vec![0xe3, 0x01, 0x01, 0x70]);

    // a subdomain transplants onto the canonical subtree
    let sub = client
        .resolve_record(b"\x03abc\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap();
    assert_eq!(sub, vec![0x22; 20]);
}

#[tokio::test]
async fn test_default_fallback_resolves_over_http() {
    let harness = TestHarness::new().await;
    let config = harness
        .config(vec![harness.server_url.clone()])
        .with_default_fallback(namehash("eth"));
    let client = ResolverClient::new(config).unwrap();

    client.refresh_anchor().await.unwrap();

    let address = client
        .resolve_record(b"\x05raffy\x03eth\x00", RecordKind::eth_address())
        .await
        .unwrap();
    assert_eq!(address, vec![0x33; 20]);
}

#[tokio::test]
async fn test_absent_record_resolves_empty() {
    let harness = TestHarness::new().await;
    let client = harness.client();
    client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();
    client.refresh_anchor().await.unwrap();

    let value = client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::text("url"))
        .await
        .unwrap();
    assert!(value.is_empty());
}

#[tokio::test]
async fn test_endpoint_fallback() {
    let harness = TestHarness::new().await;
    let dead = format!("http://127.0.0.1:{}", next_port());

    let config = harness.config(vec![dead.clone(), harness.server_url.clone()]);
    let client = ResolverClient::new(config).unwrap();
    client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();

    // anchor refresh and record fetch both fall through the dead endpoint
    client.refresh_anchor().await.unwrap();
    let address = client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap();
    assert_eq!(address, vec![0x11; 20]);

    // with every endpoint dead, the failure names the attempts made
    let dead_config = harness.config(vec![dead.clone(), format!("http://127.0.0.1:{}", next_port())]);
    let dead_client = ResolverClient::new(dead_config).unwrap();
    dead_client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();
    let err = dead_client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Core(Error::GatewayUnreachable { attempts: 2 })
    ));
}

#[tokio::test]
async fn test_gateway_with_divergent_state_rejected() {
    let honest = TestHarness::new().await;

    // same block height, different record content, therefore a different
    // state root than the one the client anchored
    let mut forged_chain = default_chain();
    forged_chain.set_record(
        L2_RESOLVER,
        chonker_node(),
        &RecordKind::eth_address(),
        &[0xee; 20],
    );
    let forged = TestHarness::with_chain(forged_chain).await;

    let client = ResolverClient::new(honest.config(vec![forged.server_url.clone()])).unwrap();
    client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();

    let honest_head = honest.state.read().await.anchor_head().await.unwrap();
    client
        .accept_anchor(honest_head, &basealias_verifier::anchor::Commitment::ChainHead)
        .unwrap();

    let err = client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Core(Error::ProofInvalid(_))));
}

#[tokio::test]
async fn test_unaliased_name_fails_before_any_fetch() {
    // no gateway configured at all: a name with neither alias nor
    // ownership resolver must fail synchronously, never reaching for
    // an endpoint
    let config = ResolverConfig::new(ADMIN, REGISTRY, L2_RESOLVER, namehash("base.eth"));
    let client = ResolverClient::new(config).unwrap();
    let err = client
        .resolve_record(b"\x06nobody\x03eth\x00", RecordKind::eth_address())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Core(Error::NoResolver(_))));
}

#[tokio::test]
async fn test_record_update_visible_after_anchor_refresh() {
    let harness = TestHarness::new().await;
    let client = harness.client();
    client
        .store()
        .set_alias(&ADMIN, namehash("chonk.xyz"), chonker_node())
        .unwrap();
    client.refresh_anchor().await.unwrap();

    let before = client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap();
    assert_eq!(before, vec![0x11; 20]);

    {
        let mut state = harness.state.write().await;
        let chain = state.memory_mut().unwrap();
        chain.set_record(L2_RESOLVER, chonker_node(), &RecordKind::eth_address(), &[0x44; 20]);
        chain.advance_block();
    }

    client.refresh_anchor().await.unwrap();
    let after = client
        .resolve_record(b"\x05chonk\x03xyz\x00", RecordKind::eth_address())
        .await
        .unwrap();
    assert_eq!(after, vec![0x44; 20]);
}
