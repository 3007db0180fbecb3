//! End-to-end integration tests for verified alias resolution
//!
//! Exercises the full library pipeline without a server: name hashing,
//! alias walking, proof construction against an in-memory chain, and
//! verification against the anchor.

use basealias_core::proto::GatewayRequest;
use basealias_core::{
    namehash, AliasResolver, AliasStore, Error, RecordKind, ResolverConfig, StaticRegistry,
    TrustMode, WireName, NO_ALIAS, ROOT_NODE,
};
use basealias_gateway::chain::{ChainBackend, MemoryChain};
use basealias_gateway::state::GatewayState;
use basealias_verifier::anchor::Commitment;
use basealias_verifier::{CrossChainVerifier, Lookup, StateAnchor, VerifyError};

const ADMIN: [u8; 20] = [0xad; 20];
const L2_RESOLVER: [u8; 20] = [0xc6; 20];

/// Published EIP-137 vectors hold for the wire decoder too
#[test]
fn test_namehash_matches_wire_decoding() {
    let name = WireName::decode(b"\x03foo\x03eth\x00").unwrap();
    assert_eq!(
        hex::encode(name.node()),
        "de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f"
    );
    assert_eq!(name.node(), namehash("foo.eth"));
}

/// The three concrete alias scenarios from the deployed configuration
#[test]
fn test_alias_scenarios() {
    let store = AliasStore::new(ADMIN);
    let registry = StaticRegistry::new();

    store
        .set_alias(&ADMIN, namehash("chonk.xyz"), namehash("chonker.base.eth"))
        .unwrap();
    store
        .set_alias(&ADMIN, namehash("a.b.c"), namehash("chonker.base.eth"))
        .unwrap();
    store.set_alias(&ADMIN, namehash("eth"), namehash("base.eth")).unwrap();
    store.set_alias(&ADMIN, ROOT_NODE, namehash("base.eth")).unwrap();

    let resolver = AliasResolver::new(&store, &registry);

    let resolve = |dotted: &str| {
        resolver
            .resolve(&WireName::parse(dotted).unwrap())
            .unwrap()
            .node
    };

    assert_eq!(resolve("abc.chonk.xyz"), namehash("abc.chonker.base.eth"));
    assert_eq!(resolve("abc.sub.a.b.c"), namehash("abc.sub.chonker.base.eth"));
    // unaliased eth names project through the TLD fallback
    assert_eq!(resolve("raffy.eth"), namehash("raffy.base.eth"));
    // everything else lands on the root alias with its full sequence
    assert_eq!(resolve("foo.bar"), namehash("foo.bar.base.eth"));
}

/// Overwriting an alias leaves only the latest mapping visible, and the
/// event log replays to the identical store.
#[test]
fn test_last_write_wins_and_replay() {
    let store = AliasStore::new(ADMIN);
    let source = namehash("chonk.xyz");

    store.set_alias(&ADMIN, source, namehash("first.base.eth")).unwrap();
    store.set_alias(&ADMIN, source, namehash("second.base.eth")).unwrap();
    store.set_alias(&ADMIN, namehash("gone.xyz"), namehash("x.base.eth")).unwrap();
    store.set_alias(&ADMIN, namehash("gone.xyz"), NO_ALIAS).unwrap();

    assert_eq!(store.get_alias(&source), Some(namehash("second.base.eth")));
    assert_eq!(store.len(), 1);

    let rebuilt = AliasStore::from_events(ADMIN, &store.events());
    assert_eq!(rebuilt.get_alias(&source), Some(namehash("second.base.eth")));
    assert!(rebuilt.get_alias(&namehash("gone.xyz")).is_none());
    assert_eq!(rebuilt.events(), store.events());
}

#[test]
fn test_unauthorized_mutation_rejected_before_effect() {
    let store = AliasStore::new(ADMIN);
    let err = store
        .set_alias(&[0x66; 20], namehash("chonk.xyz"), namehash("chonker.base.eth"))
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));
    assert!(store.is_empty());
    assert!(store.events().is_empty());
}

/// Full pipeline: seed a record on the in-memory chain, let the gateway
/// logic assemble the proof, verify it against a fresh anchor.
#[tokio::test]
async fn test_memory_chain_proof_verifies() {
    let node = namehash("chonker.base.eth");
    let record = RecordKind::text("avatar");
    let value = b"https://raffy.antistupid.com/chonker.png".to_vec();

    let mut chain = MemoryChain::new();
    chain.set_record(L2_RESOLVER, node, &record, &value);
    let head = chain.head();

    let gateway = GatewayState::new(ChainBackend::Memory(chain));

    let anchor = StateAnchor::new(TrustMode::SelfCertified, 64);
    anchor.advance(head, &Commitment::ChainHead).unwrap();
    let verifier = CrossChainVerifier::new(anchor);

    let request = match verifier.begin(L2_RESOLVER, node, record) {
        Lookup::Pending(request) => request,
        Lookup::Local(_) => panic!("no local record configured"),
    };
    let response = gateway.answer(&request).await.unwrap();
    assert_eq!(verifier.verify(&request, &response).unwrap(), value);
}

/// A value that does not match its proof is rejected no matter which
/// endpoint produced it.
#[tokio::test]
async fn test_tampered_response_rejected() {
    let node = namehash("chonker.base.eth");
    let record = RecordKind::eth_address();

    let mut chain = MemoryChain::new();
    chain.set_record(L2_RESOLVER, node, &record, &[0x11; 20]);
    let head = chain.head();
    let gateway = GatewayState::new(ChainBackend::Memory(chain));

    let anchor = StateAnchor::new(TrustMode::SelfCertified, 64);
    anchor.advance(head, &Commitment::ChainHead).unwrap();
    let verifier = CrossChainVerifier::new(anchor);

    let request = GatewayRequest { resolver: L2_RESOLVER, node, record };
    let mut response = gateway.answer(&request).await.unwrap();
    response.slots[1].value[31] ^= 0x01;

    let err = verifier.verify(&request, &response).unwrap_err();
    assert!(matches!(err, VerifyError::ValueMismatch(_)));
}

/// A proof against a superseded root is rejected on staleness alone,
/// even though the value it carries is correct.
#[tokio::test]
async fn test_stale_root_rejected() {
    let node = namehash("chonker.base.eth");
    let record = RecordKind::eth_address();

    let mut chain = MemoryChain::new();
    chain.set_record(L2_RESOLVER, node, &record, &[0x11; 20]);
    let old_head = chain.head();
    let gateway = GatewayState::new(ChainBackend::Memory(chain));

    let anchor = StateAnchor::new(TrustMode::SelfCertified, 2);
    anchor.advance(old_head, &Commitment::ChainHead).unwrap();

    let request = GatewayRequest { resolver: L2_RESOLVER, node, record };
    let response = gateway.answer(&request).await.unwrap();

    // the remote chain moves far beyond the staleness window
    anchor
        .advance(
            basealias_core::proto::AnchorHead {
                block: old_head.block + 10,
                state_root: [0x99; 32],
                timestamp: old_head.timestamp + 20,
            },
            &Commitment::ChainHead,
        )
        .unwrap();

    let verifier = CrossChainVerifier::new(anchor);
    let err = verifier.verify(&request, &response).unwrap_err();
    assert!(matches!(err, VerifyError::Stale { .. }));
}

#[test]
fn test_config_roundtrip() {
    let dir = std::env::temp_dir().join("basealias-e2e-config");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("config.json");

    let config = ResolverConfig::new(ADMIN, [0x01; 20], L2_RESOLVER, namehash("base.eth"))
        .with_gateways(vec!["http://localhost:8045".into()])
        .with_default_fallback(namehash("eth"));
    config.save(&path).unwrap();

    let loaded = ResolverConfig::load(&path).unwrap();
    assert_eq!(loaded.canonical_root, namehash("base.eth"));
    assert_eq!(loaded.gateways, config.gateways);
    assert_eq!(loaded.default_fallback.map(|n| n.0), Some(namehash("eth")));

    let _ = std::fs::remove_dir_all(&dir);
}
