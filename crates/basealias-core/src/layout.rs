//! Storage layout of the remote resolver (and, for fixtures, the registry)
//!
//! Slot derivation must be a pure function of (node, record kind): the
//! client, the verifier, and every gateway recompute the identical
//! descriptor, so nothing about slot placement is ever taken from an
//! untrusted response.
//!
//! Remote resolver layout (versioned records):
//!
//! ```text
//! slot 0  recordVersions: mapping(bytes32 node => uint64)
//! slot 1  addresses:      mapping(uint64 => mapping(bytes32 => mapping(uint256 => bytes)))
//! slot 2  texts:          mapping(uint64 => mapping(bytes32 => mapping(string => string)))
//! slot 3  contenthashes:  mapping(uint64 => mapping(bytes32 => bytes))
//! ```
//!
//! Root registry layout (test fixtures only; production resolution uses
//! the registry's public read interface):
//!
//! ```text
//! slot 0  records: mapping(bytes32 node => Record { owner, ... })
//! ```

use crate::constants::MAX_RECORD_LEN;
use crate::name::keccak256;
use crate::record::RecordKind;
use crate::{Error, NodeId, Result};

pub const SLOT_RECORD_VERSIONS: u64 = 0;
pub const SLOT_ADDRESSES: u64 = 1;
pub const SLOT_TEXTS: u64 = 2;
pub const SLOT_CONTENT_HASHES: u64 = 3;
pub const REGISTRY_RECORDS_SLOT: u64 = 0;

/// A 32-byte storage slot key
pub type Slot = [u8; 32];

fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Slot of `mapping[key]` for a mapping rooted at `base`:
/// `keccak256(key || base)`
pub fn mapping_slot(key: &[u8; 32], base: &[u8; 32]) -> Slot {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(key);
    buf[32..].copy_from_slice(base);
    keccak256(&buf)
}

/// Slot of `mapping[key]` for a string/bytes-keyed mapping:
/// `keccak256(key_bytes || base)`
pub fn string_mapping_slot(key: &[u8], base: &[u8; 32]) -> Slot {
    let mut buf = Vec::with_capacity(key.len() + 32);
    buf.extend_from_slice(key);
    buf.extend_from_slice(base);
    keccak256(&buf)
}

/// `records[node].owner` in the root registry (fixtures only)
pub fn registry_owner_slot(node: &NodeId) -> Slot {
    mapping_slot(node, &u64_word(REGISTRY_RECORDS_SLOT))
}

/// `recordVersions[node]` in the remote resolver
pub fn record_version_slot(node: &NodeId) -> Slot {
    mapping_slot(node, &u64_word(SLOT_RECORD_VERSIONS))
}

/// Head slot of the record value for (version, node, kind)
pub fn value_head_slot(version: u64, node: &NodeId, kind: &RecordKind) -> Slot {
    match kind {
        RecordKind::Address { coin_type } => {
            let per_version = mapping_slot(&u64_word(version), &u64_word(SLOT_ADDRESSES));
            let per_node = mapping_slot(node, &per_version);
            mapping_slot(&u64_word(*coin_type), &per_node)
        }
        RecordKind::Text { key } => {
            let per_version = mapping_slot(&u64_word(version), &u64_word(SLOT_TEXTS));
            let per_node = mapping_slot(node, &per_version);
            string_mapping_slot(key.as_bytes(), &per_node)
        }
        RecordKind::ContentHash => {
            let per_version = mapping_slot(&u64_word(version), &u64_word(SLOT_CONTENT_HASHES));
            mapping_slot(node, &per_version)
        }
    }
}

/// Continuation slot `keccak256(head) + index` for long bytes values
pub fn bytes_tail_slot(head: &Slot, index: u64) -> Slot {
    let mut slot = keccak256(head);
    let mut carry = index;
    for byte in slot.iter_mut().rev() {
        if carry == 0 {
            break;
        }
        let sum = *byte as u64 + (carry & 0xff);
        *byte = (sum & 0xff) as u8;
        carry = (carry >> 8) + (sum >> 8);
    }
    slot
}

/// Interpret a storage word as uint64, rejecting values that overflow
pub fn decode_u64_word(word: &[u8; 32]) -> Result<u64> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(Error::ProofInvalid("uint64 storage word overflows".into()));
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(be))
}

/// Byte length of a Solidity `bytes`/`string` value from its head word,
/// and whether the long (out-of-place) form is in use.
fn bytes_len(head: &Slot) -> Result<(usize, bool)> {
    let marker = head[31];
    if marker & 1 == 0 {
        // short form: data in place, length in the low byte
        let len = (marker / 2) as usize;
        if len > 31 {
            return Err(Error::ProofInvalid("short bytes length exceeds 31".into()));
        }
        Ok((len, false))
    } else {
        // long form: head holds 2*len + 1
        if head[..24].iter().any(|b| *b != 0) {
            return Err(Error::ProofInvalid("bytes length word overflows".into()));
        }
        let mut be = [0u8; 8];
        be.copy_from_slice(&head[24..]);
        let encoded = u64::from_be_bytes(be);
        let len = ((encoded - 1) / 2) as usize;
        if len <= 31 {
            return Err(Error::ProofInvalid("long-form bytes shorter than 32".into()));
        }
        if len > MAX_RECORD_LEN {
            return Err(Error::ProofInvalid(format!("record value of {} bytes exceeds bound", len)));
        }
        Ok((len, true))
    }
}

/// Number of continuation slots needed beyond the head slot
pub fn tail_slot_count(head: &Slot) -> Result<usize> {
    let (len, long) = bytes_len(head)?;
    if long {
        Ok(len.div_ceil(32))
    } else {
        Ok(0)
    }
}

/// Decode a Solidity `bytes` value from its head word and (for the long
/// form) its continuation words.
pub fn decode_storage_bytes(head: &Slot, tails: &[Slot]) -> Result<Vec<u8>> {
    let (len, long) = bytes_len(head)?;
    if !long {
        if !tails.is_empty() {
            return Err(Error::ProofInvalid("unexpected continuation slots for short bytes".into()));
        }
        return Ok(head[..len].to_vec());
    }
    if tails.len() != len.div_ceil(32) {
        return Err(Error::ProofInvalid(format!(
            "expected {} continuation slots, got {}",
            len.div_ceil(32),
            tails.len()
        )));
    }
    let mut out = Vec::with_capacity(len);
    for tail in tails {
        out.extend_from_slice(tail);
    }
    out.truncate(len);
    Ok(out)
}

/// Encode a value into its head word and continuation words (the inverse
/// of [`decode_storage_bytes`]; used by fixtures and the in-memory chain).
pub fn encode_storage_bytes(value: &[u8]) -> (Slot, Vec<Slot>) {
    if value.len() <= 31 {
        let mut head = [0u8; 32];
        head[..value.len()].copy_from_slice(value);
        head[31] = (value.len() as u8) * 2;
        (head, Vec::new())
    } else {
        let head = u64_word(value.len() as u64 * 2 + 1);
        let tails = value
            .chunks(32)
            .map(|chunk| {
                let mut word = [0u8; 32];
                word[..chunk.len()].copy_from_slice(chunk);
                word
            })
            .collect();
        (head, tails)
    }
}
