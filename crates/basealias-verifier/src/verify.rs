//! Cross-chain record verification
//!
//! A record lookup is either answered locally (`Lookup::Local`) or turned
//! into a deterministic gateway request (`Lookup::Pending`). The returned
//! response is then checked in order: anchor coverage, the account proof
//! locating the resolver contract, the record-version slot, and every
//! value slot re-derived locally from the proven version. Any failure is a
//! terminal rejection for that request; nothing is ever downgraded to a
//! default value.

use std::collections::HashMap;

use alloy_primitives::B256;

use basealias_core::proto::{GatewayRequest, GatewayResponse, ProvenSlot};
use basealias_core::{layout, Address, NodeId, RecordKind};

use crate::anchor::StateAnchor;
use crate::error::VerifyError;
use crate::trie;

/// Outcome of starting a record lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// An authoritative local record exists; no off-chain fetch needed
    Local(Vec<u8>),
    /// Off-chain fetch required; the descriptor is reproducible from
    /// (resolver, node, record) alone
    Pending(GatewayRequest),
}

pub struct CrossChainVerifier {
    anchor: StateAnchor,
    local: HashMap<(NodeId, RecordKind), Vec<u8>>,
}

impl CrossChainVerifier {
    pub fn new(anchor: StateAnchor) -> Self {
        Self { anchor, local: HashMap::new() }
    }

    pub fn anchor(&self) -> &StateAnchor {
        &self.anchor
    }

    /// Install an authoritative local record; subsequent lookups for this
    /// (node, kind) short-circuit without a gateway round trip.
    pub fn set_local_record(&mut self, node: NodeId, record: RecordKind, value: Vec<u8>) {
        self.local.insert((node, record), value);
    }

    /// Begin a lookup for a record of the canonical node
    pub fn begin(&self, resolver: Address, node: NodeId, record: RecordKind) -> Lookup {
        if let Some(value) = self.local.get(&(node, record.clone())) {
            return Lookup::Local(value.clone());
        }
        Lookup::Pending(GatewayRequest { resolver, node, record })
    }

    /// Verify a gateway response against the request it answers.
    ///
    /// Slot keys are never taken from the response: the version slot, the
    /// value head slot and every continuation slot are re-derived locally
    /// and compared, so a gateway can only influence the outcome by
    /// producing a valid proof under an anchored root. Idempotent; no
    /// state beyond the anchor is consulted.
    pub fn verify(
        &self,
        request: &GatewayRequest,
        response: &GatewayResponse,
    ) -> Result<Vec<u8>, VerifyError> {
        self.anchor.covers(response.block, &response.state_root)?;

        let account_leaf = trie::verify_proof(
            B256::from(response.state_root),
            &request.resolver,
            &response.account_proof,
        )?
        .ok_or_else(|| {
            VerifyError::AccountMissing(format!("0x{}", hex::encode(request.resolver)))
        })?;
        let account = trie::decode_account(&account_leaf)?;
        let storage_root = account.storage_root;

        if response.slots.len() < 2 {
            return Err(VerifyError::SlotCount { expected: 2, got: response.slots.len() });
        }

        let version_slot = layout::record_version_slot(&request.node);
        let version_word = proven_word(storage_root, &response.slots[0], &version_slot)?;
        let version = layout::decode_u64_word(&version_word).map_err(VerifyError::Core)?;

        let head_slot = layout::value_head_slot(version, &request.node, &request.record);
        let head_word = proven_word(storage_root, &response.slots[1], &head_slot)?;
        let tail_count = layout::tail_slot_count(&head_word).map_err(VerifyError::Core)?;

        if response.slots.len() != 2 + tail_count {
            return Err(VerifyError::SlotCount {
                expected: 2 + tail_count,
                got: response.slots.len(),
            });
        }
        let mut tails = Vec::with_capacity(tail_count);
        for (i, slot) in response.slots[2..].iter().enumerate() {
            let expected = layout::bytes_tail_slot(&head_slot, i as u64);
            tails.push(proven_word(storage_root, slot, &expected)?);
        }

        let value = layout::decode_storage_bytes(&head_word, &tails).map_err(VerifyError::Core)?;
        tracing::debug!(
            node = %hex::encode(request.node),
            record = %request.record,
            block = response.block,
            len = value.len(),
            "record verified"
        );
        Ok(value)
    }
}

/// Check one proven slot: the key must match the locally derived slot, and
/// the claimed word must match what the proof actually commits to (an
/// exclusion proof commits to the zero word).
fn proven_word(
    storage_root: B256,
    slot: &ProvenSlot,
    expected_key: &[u8; 32],
) -> Result<[u8; 32], VerifyError> {
    if slot.slot != *expected_key {
        return Err(VerifyError::SlotMismatch {
            expected: format!("0x{}", hex::encode(expected_key)),
            got: format!("0x{}", hex::encode(slot.slot)),
        });
    }
    let word = match trie::verify_proof(storage_root, &slot.slot, &slot.proof)? {
        Some(leaf) => trie::decode_storage_word(&leaf)?,
        None => [0u8; 32],
    };
    if word != slot.value {
        return Err(VerifyError::ValueMismatch(format!("0x{}", hex::encode(slot.slot))));
    }
    Ok(word)
}
