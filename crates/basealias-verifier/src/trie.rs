//! Merkle-Patricia proof verification
//!
//! Walks a hash-chained node path from a state (or storage) root down to a
//! leaf, consuming the nibbles of the keccak-hashed key. Branch, extension
//! and leaf nodes are decoded from their RLP form; sub-32-byte child nodes
//! may be inlined in their parent instead of hash-referenced. A walk that
//! diverges from the key is a valid exclusion proof and yields `None`.

use alloy_primitives::{b256, keccak256, B256, U256};
use alloy_rlp::Header;
use thiserror::Error;

/// Root of the empty trie: `keccak256(rlp(""))`
pub const EMPTY_ROOT: B256 =
    b256!("0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("proof is missing the node for hash {0}")]
    MissingNode(String),

    #[error("proof node does not hash to the expected reference {0}")]
    HashMismatch(String),

    #[error("node decode failed: {0}")]
    Decode(String),

    #[error("malformed trie node: {0}")]
    Malformed(String),
}

/// How a trie node refers to a child
enum ChildRef<'a> {
    Empty,
    Hash(B256),
    Inline(&'a [u8]),
}

fn rlp_err(err: alloy_rlp::Error) -> TrieError {
    TrieError::Decode(err.to_string())
}

/// Split a node into its raw RLP items (header bytes included per item)
fn list_items(node: &[u8]) -> Result<Vec<&[u8]>, TrieError> {
    let mut buf = node;
    let header = Header::decode(&mut buf).map_err(rlp_err)?;
    if !header.list {
        return Err(TrieError::Malformed("expected a list node".into()));
    }
    if buf.len() != header.payload_length {
        return Err(TrieError::Malformed("trailing bytes after node".into()));
    }
    let mut items = Vec::new();
    while !buf.is_empty() {
        let start = buf;
        let mut peek = buf;
        let item = Header::decode(&mut peek).map_err(rlp_err)?;
        let consumed = start.len() - peek.len() + item.payload_length;
        if consumed > start.len() {
            return Err(TrieError::Malformed("item overruns node".into()));
        }
        items.push(&start[..consumed]);
        buf = &start[consumed..];
    }
    Ok(items)
}

/// Payload of a string item; rejects nested lists
fn string_payload(item: &[u8]) -> Result<&[u8], TrieError> {
    let mut buf = item;
    let header = Header::decode(&mut buf).map_err(rlp_err)?;
    if header.list {
        return Err(TrieError::Malformed("expected a string item".into()));
    }
    Ok(&buf[..header.payload_length])
}

fn classify(item: &[u8]) -> Result<ChildRef<'_>, TrieError> {
    let first = *item
        .first()
        .ok_or_else(|| TrieError::Malformed("empty child reference".into()))?;
    if first >= 0xc0 {
        if item.len() >= 32 {
            return Err(TrieError::Malformed("inline node of 32+ bytes".into()));
        }
        return Ok(ChildRef::Inline(item));
    }
    let payload = string_payload(item)?;
    match payload.len() {
        0 => Ok(ChildRef::Empty),
        32 => Ok(ChildRef::Hash(B256::from_slice(payload))),
        n => Err(TrieError::Malformed(format!("{}-byte child reference", n))),
    }
}

fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(b >> 4);
        out.push(b & 0x0f);
    }
    out
}

/// Decode a hex-prefix encoded path into (nibbles, is_leaf)
fn hp_decode(encoded: &[u8]) -> Result<(Vec<u8>, bool), TrieError> {
    let first = *encoded
        .first()
        .ok_or_else(|| TrieError::Malformed("empty hex-prefix path".into()))?;
    if first & 0xc0 != 0 {
        return Err(TrieError::Malformed("bad hex-prefix flag".into()));
    }
    let leaf = first & 0x20 != 0;
    let odd = first & 0x10 != 0;
    let mut nibbles = Vec::with_capacity(encoded.len() * 2);
    if odd {
        nibbles.push(first & 0x0f);
    }
    for b in &encoded[1..] {
        nibbles.push(b >> 4);
        nibbles.push(b & 0x0f);
    }
    Ok((nibbles, leaf))
}

fn next_node<'a>(
    nodes: &mut std::slice::Iter<'a, Vec<u8>>,
    expected: B256,
) -> Result<&'a [u8], TrieError> {
    let node = nodes
        .next()
        .ok_or_else(|| TrieError::MissingNode(hex::encode(expected)))?;
    if keccak256(node) != expected {
        return Err(TrieError::HashMismatch(hex::encode(expected)));
    }
    Ok(node.as_slice())
}

/// Verify a Merkle-Patricia proof for `key` under `root`.
///
/// The trie path is the nibble sequence of `keccak256(key)`, matching both
/// the account trie (key = address) and storage tries (key = slot). Returns
/// the leaf value, or `None` for a valid exclusion proof.
pub fn verify_proof(
    root: B256,
    key: &[u8],
    proof: &[Vec<u8>],
) -> Result<Option<Vec<u8>>, TrieError> {
    if proof.is_empty() {
        if root == EMPTY_ROOT {
            return Ok(None);
        }
        return Err(TrieError::MissingNode(hex::encode(root)));
    }

    let path = to_nibbles(keccak256(key).as_slice());
    let mut offset = 0usize;
    let mut nodes = proof.iter();
    let mut cursor = next_node(&mut nodes, root)?;

    loop {
        let items = list_items(cursor)?;
        match items.len() {
            17 => {
                if offset == path.len() {
                    let value = string_payload(items[16])?;
                    return Ok((!value.is_empty()).then(|| value.to_vec()));
                }
                let child = items[path[offset] as usize];
                offset += 1;
                match classify(child)? {
                    ChildRef::Empty => return Ok(None),
                    ChildRef::Hash(hash) => cursor = next_node(&mut nodes, hash)?,
                    ChildRef::Inline(raw) => cursor = raw,
                }
            }
            2 => {
                let (node_path, leaf) = hp_decode(string_payload(items[0])?)?;
                if leaf {
                    if path[offset..] == node_path[..] {
                        return Ok(Some(string_payload(items[1])?.to_vec()));
                    }
                    return Ok(None);
                }
                if !path[offset..].starts_with(&node_path) {
                    return Ok(None);
                }
                offset += node_path.len();
                match classify(items[1])? {
                    ChildRef::Empty => {
                        return Err(TrieError::Malformed("extension to empty child".into()))
                    }
                    ChildRef::Hash(hash) => cursor = next_node(&mut nodes, hash)?,
                    ChildRef::Inline(raw) => cursor = raw,
                }
            }
            n => return Err(TrieError::Malformed(format!("{}-item node", n))),
        }
    }
}

/// A chain account as stored in the state trie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: B256,
    pub code_hash: B256,
}

/// Decode the RLP account body from a state-trie leaf value
pub fn decode_account(leaf: &[u8]) -> Result<Account, TrieError> {
    let items = list_items(leaf)?;
    if items.len() != 4 {
        return Err(TrieError::Malformed(format!(
            "account body has {} fields",
            items.len()
        )));
    }
    let nonce_bytes = string_payload(items[0])?;
    if nonce_bytes.len() > 8 {
        return Err(TrieError::Malformed("account nonce overflows u64".into()));
    }
    let mut nonce = 0u64;
    for b in nonce_bytes {
        nonce = nonce << 8 | *b as u64;
    }
    let balance_bytes = string_payload(items[1])?;
    if balance_bytes.len() > 32 {
        return Err(TrieError::Malformed("account balance overflows".into()));
    }
    let storage_root = string_payload(items[2])?;
    let code_hash = string_payload(items[3])?;
    if storage_root.len() != 32 || code_hash.len() != 32 {
        return Err(TrieError::Malformed("account hash field is not 32 bytes".into()));
    }
    Ok(Account {
        nonce,
        balance: U256::from_be_slice(balance_bytes),
        storage_root: B256::from_slice(storage_root),
        code_hash: B256::from_slice(code_hash),
    })
}

/// Decode a storage-trie leaf value (RLP of the zero-stripped word) into a
/// full 32-byte storage word.
pub fn decode_storage_word(leaf: &[u8]) -> Result<[u8; 32], TrieError> {
    let payload = string_payload(leaf)?;
    if payload.len() > 32 {
        return Err(TrieError::Malformed("storage word longer than 32 bytes".into()));
    }
    let mut word = [0u8; 32];
    word[32 - payload.len()..].copy_from_slice(payload);
    Ok(word)
}
