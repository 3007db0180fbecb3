//! Deterministic in-memory trie construction
//!
//! Builds a Merkle-Patricia trie over keccak-hashed keys and extracts the
//! same per-key proofs a remote node would serve from `eth_getProof`. This
//! powers the gateway's in-memory backend and the verifier's own tests;
//! production proofs come from the remote chain itself.

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, B256};
use alloy_rlp::Header;

use crate::trie::{Account, EMPTY_ROOT};

enum Node {
    Empty,
    Leaf { path: Vec<u8>, value: Vec<u8> },
    Extension { path: Vec<u8>, child: Box<Node> },
    Branch { children: Box<[Node; 16]>, value: Option<Vec<u8>> },
}

fn empty_children() -> Box<[Node; 16]> {
    Box::new(std::array::from_fn(|_| Node::Empty))
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn insert(node: Node, path: &[u8], value: Vec<u8>) -> Node {
    match node {
        Node::Empty => Node::Leaf { path: path.to_vec(), value },
        Node::Leaf { path: leaf_path, value: leaf_value } => {
            if leaf_path == path {
                return Node::Leaf { path: leaf_path, value };
            }
            let common = common_prefix(&leaf_path, path);
            let mut children = empty_children();
            let mut branch_value = None;
            place(&mut children, &mut branch_value, &leaf_path[common..], leaf_value);
            place(&mut children, &mut branch_value, &path[common..], value);
            let branch = Node::Branch { children, value: branch_value };
            wrap(&path[..common], branch)
        }
        Node::Extension { path: ext_path, child } => {
            let common = common_prefix(&ext_path, path);
            if common == ext_path.len() {
                return Node::Extension {
                    path: ext_path,
                    child: Box::new(insert(*child, &path[common..], value)),
                };
            }
            let mut children = empty_children();
            let mut branch_value = None;
            let ext_rest = &ext_path[common + 1..];
            let sub = if ext_rest.is_empty() {
                *child
            } else {
                Node::Extension { path: ext_rest.to_vec(), child }
            };
            children[ext_path[common] as usize] = sub;
            place(&mut children, &mut branch_value, &path[common..], value);
            let branch = Node::Branch { children, value: branch_value };
            wrap(&path[..common], branch)
        }
        Node::Branch { mut children, value: branch_value } => {
            if path.is_empty() {
                return Node::Branch { children, value: Some(value) };
            }
            let idx = path[0] as usize;
            let child = std::mem::replace(&mut children[idx], Node::Empty);
            children[idx] = insert(child, &path[1..], value);
            Node::Branch { children, value: branch_value }
        }
    }
}

fn place(
    children: &mut [Node; 16],
    branch_value: &mut Option<Vec<u8>>,
    rel_path: &[u8],
    value: Vec<u8>,
) {
    if rel_path.is_empty() {
        *branch_value = Some(value);
    } else {
        let idx = rel_path[0] as usize;
        let child = std::mem::replace(&mut children[idx], Node::Empty);
        children[idx] = insert(child, &rel_path[1..], value);
    }
}

fn wrap(prefix: &[u8], node: Node) -> Node {
    if prefix.is_empty() {
        node
    } else {
        Node::Extension { path: prefix.to_vec(), child: Box::new(node) }
    }
}

/// Hex-prefix encode a nibble path
fn hp_encode(nibbles: &[u8], leaf: bool) -> Vec<u8> {
    let mut flag: u8 = if leaf { 0x20 } else { 0x00 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    let rest = if nibbles.len() % 2 == 1 {
        flag |= 0x10;
        out.push(flag | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag);
        nibbles
    };
    for pair in rest.chunks(2) {
        out.push(pair[0] << 4 | pair[1]);
    }
    out
}

fn encode_str(payload: &[u8]) -> Vec<u8> {
    if payload.len() == 1 && payload[0] < 0x80 {
        return payload.to_vec();
    }
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header { list: false, payload_length: payload.len() }.encode(&mut out);
    out.extend_from_slice(payload);
    out
}

fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: usize = items.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(payload + 9);
    Header { list: true, payload_length: payload }.encode(&mut out);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Raw RLP item referring to an encoded child: inline when under 32 bytes,
/// otherwise the keccak hash as a string.
fn reference(encoded: Vec<u8>) -> Vec<u8> {
    if encoded.len() < 32 {
        return encoded;
    }
    let mut out = Vec::with_capacity(33);
    out.push(0xa0);
    out.extend_from_slice(keccak256(&encoded).as_slice());
    out
}

fn encode(node: &Node) -> Vec<u8> {
    match node {
        Node::Empty => vec![0x80],
        Node::Leaf { path, value } => {
            encode_list(&[encode_str(&hp_encode(path, true)), encode_str(value)])
        }
        Node::Extension { path, child } => {
            encode_list(&[encode_str(&hp_encode(path, false)), reference(encode(child))])
        }
        Node::Branch { children, value } => {
            let mut items = Vec::with_capacity(17);
            for child in children.iter() {
                match child {
                    Node::Empty => items.push(vec![0x80]),
                    _ => items.push(reference(encode(child))),
                }
            }
            match value {
                Some(v) => items.push(encode_str(v)),
                None => items.push(vec![0x80]),
            }
            encode_list(&items)
        }
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

fn strip_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// RLP value of a storage word as stored in a storage-trie leaf
pub fn encode_storage_word(word: &[u8; 32]) -> Vec<u8> {
    encode_str(strip_zeros(word))
}

/// RLP value of an account as stored in a state-trie leaf
pub fn encode_account(account: &Account) -> Vec<u8> {
    let balance = account.balance.to_be_bytes::<32>();
    encode_list(&[
        encode_str(strip_zeros(&account.nonce.to_be_bytes())),
        encode_str(strip_zeros(&balance)),
        encode_str(account.storage_root.as_slice()),
        encode_str(account.code_hash.as_slice()),
    ])
}

/// Builds a trie over keccak-hashed keys and extracts per-key proofs.
///
/// Entries are kept sorted by hashed key so construction is independent of
/// insertion order. Values must already be RLP-encoded leaf bodies
/// ([`encode_storage_word`], [`encode_account`]).
#[derive(Default)]
pub struct TrieBuilder {
    entries: BTreeMap<B256, Vec<u8>>,
}

impl TrieBuilder {
    pub fn insert(&mut self, key: &[u8], value_rlp: Vec<u8>) {
        self.entries.insert(keccak256(key), value_rlp);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tree(&self) -> Node {
        let mut root = Node::Empty;
        for (hashed, value) in &self.entries {
            root = insert(root, &to_nibbles(hashed.as_slice()), value.clone());
        }
        root
    }

    pub fn root(&self) -> B256 {
        let tree = self.tree();
        if matches!(tree, Node::Empty) {
            return EMPTY_ROOT;
        }
        keccak256(encode(&tree))
    }

    /// Proof nodes for `key`, root node first. Sub-32-byte nodes are
    /// embedded in their parent and never appear standalone (except a
    /// small root, which is always included).
    pub fn prove(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let tree = self.tree();
        if matches!(tree, Node::Empty) {
            return Vec::new();
        }
        let path = to_nibbles(keccak256(key).as_slice());
        let mut offset = 0usize;
        let mut proof = Vec::new();
        let mut node = &tree;
        loop {
            let encoded = encode(node);
            if proof.is_empty() || encoded.len() >= 32 {
                proof.push(encoded);
            }
            match node {
                Node::Empty | Node::Leaf { .. } => return proof,
                Node::Extension { path: ext_path, child } => {
                    if !path[offset..].starts_with(ext_path) {
                        return proof;
                    }
                    offset += ext_path.len();
                    node = child;
                }
                Node::Branch { children, .. } => {
                    if offset == path.len() {
                        return proof;
                    }
                    let child = &children[path[offset] as usize];
                    if matches!(child, Node::Empty) {
                        return proof;
                    }
                    offset += 1;
                    node = child;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        let builder = TrieBuilder::default();
        assert!(builder.is_empty());
        assert_eq!(builder.root(), EMPTY_ROOT);
        assert!(builder.prove(b"missing").is_empty());
    }

    #[test]
    fn test_root_independent_of_insertion_order() {
        let mut forward = TrieBuilder::default();
        let mut reverse = TrieBuilder::default();
        let keys: Vec<[u8; 32]> = (0u8..32).map(|i| [i; 32]).collect();
        for key in &keys {
            forward.insert(key, encode_storage_word(&[*key.first().unwrap() + 1; 32]));
        }
        for key in keys.iter().rev() {
            reverse.insert(key, encode_storage_word(&[*key.first().unwrap() + 1; 32]));
        }
        assert_eq!(forward.root(), reverse.root());
    }

    #[test]
    fn test_root_moves_with_content() {
        let mut builder = TrieBuilder::default();
        builder.insert(&[0x01; 32], encode_storage_word(&[0x01; 32]));
        let before = builder.root();
        builder.insert(&[0x01; 32], encode_storage_word(&[0x02; 32]));
        assert_ne!(builder.root(), before);
    }

    #[test]
    fn test_hp_encode_shapes() {
        assert_eq!(hp_encode(&[0x01, 0x02], true), vec![0x20, 0x12]);
        assert_eq!(hp_encode(&[0x01, 0x02, 0x03], true), vec![0x31, 0x23]);
        assert_eq!(hp_encode(&[0x0a], false), vec![0x1a]);
        assert_eq!(hp_encode(&[], false), vec![0x00]);
    }

    #[test]
    fn test_encode_str_single_byte() {
        assert_eq!(encode_str(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_str(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(encode_str(&[]), vec![0x80]);
    }

    #[test]
    fn test_storage_word_strips_zeros() {
        let mut word = [0u8; 32];
        word[31] = 0x2a;
        assert_eq!(encode_storage_word(&word), vec![0x2a]);
        word[30] = 0x01;
        assert_eq!(encode_storage_word(&word), vec![0x82, 0x01, 0x2a]);
    }
}
