//! Hierarchical name hashing and DNS wire-name decoding
//!
//! Node ids follow the standard hierarchical scheme: a node's id is
//! `keccak256(parent_id || keccak256(label))`, with the root at all zeroes.
//! Names are case- and order-sensitive here; normalization is the caller's
//! concern.

use tiny_keccak::{Hasher, Keccak};

use crate::constants::MAX_LABEL_LEN;
use crate::{Error, LabelHash, NodeId, Result, ROOT_NODE};

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// Hash a single label
pub fn label_hash(label: &str) -> LabelHash {
    keccak256(label.as_bytes())
}

/// Derive a child node id from its parent and the child label's hash
pub fn node_id(parent: NodeId, label: LabelHash) -> NodeId {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&parent);
    buf[32..].copy_from_slice(&label);
    keccak256(&buf)
}

/// Namehash of a dotted name. The empty string hashes to the root node.
pub fn namehash(name: &str) -> NodeId {
    if name.is_empty() {
        return ROOT_NODE;
    }
    name.split('.')
        .rev()
        .fold(ROOT_NODE, |node, label| node_id(node, label_hash(label)))
}

/// A validated label sequence, leaf-first (`["abc","raffy","eth"]` for
/// `abc.raffy.eth`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireName {
    labels: Vec<String>,
}

impl WireName {
    /// Decode a DNS wire-encoded name (length-prefixed labels, NUL
    /// terminator). Empty names, empty or oversized labels, non-UTF-8
    /// labels, truncation, and trailing bytes are all rejected.
    pub fn decode(wire: &[u8]) -> Result<Self> {
        let mut labels = Vec::new();
        let mut pos = 0usize;
        loop {
            let len = *wire
                .get(pos)
                .ok_or_else(|| Error::InvalidName("truncated wire name".into()))?
                as usize;
            pos += 1;
            if len == 0 {
                if pos != wire.len() {
                    return Err(Error::InvalidName("trailing bytes after terminator".into()));
                }
                break;
            }
            if len > MAX_LABEL_LEN {
                return Err(Error::InvalidName(format!("label length {} exceeds {}", len, MAX_LABEL_LEN)));
            }
            let raw = wire
                .get(pos..pos + len)
                .ok_or_else(|| Error::InvalidName("truncated label".into()))?;
            let label = std::str::from_utf8(raw)
                .map_err(|_| Error::InvalidName("label is not valid UTF-8".into()))?;
            labels.push(label.to_string());
            pos += len;
        }
        if labels.is_empty() {
            return Err(Error::InvalidName("empty name".into()));
        }
        Ok(Self { labels })
    }

    /// Parse a dotted name (`abc.raffy.eth`)
    pub fn parse(dotted: &str) -> Result<Self> {
        let labels: Vec<String> = dotted.split('.').map(str::to_string).collect();
        if labels.iter().any(String::is_empty) {
            return Err(Error::InvalidName(format!("empty label in {:?}", dotted)));
        }
        if labels.iter().any(|l| l.len() > MAX_LABEL_LEN) {
            return Err(Error::InvalidName(format!("oversized label in {:?}", dotted)));
        }
        Ok(Self { labels })
    }

    /// Encode back into DNS wire format
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        out
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Node id of the full name
    pub fn node(&self) -> NodeId {
        *self
            .node_ids()
            .last()
            .unwrap_or(&ROOT_NODE)
    }

    /// Every ancestor node id from the root outward:
    /// `[root, tld, ..., full name]` (length `label_count() + 1`).
    pub fn node_ids(&self) -> Vec<NodeId> {
        let k = self.labels.len();
        let mut ids = Vec::with_capacity(k + 1);
        ids.push(ROOT_NODE);
        for depth in 1..=k {
            let label = &self.labels[k - depth];
            let parent = ids[depth - 1];
            ids.push(node_id(parent, label_hash(label)));
        }
        ids
    }
}

impl std::fmt::Display for WireName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.labels.join("."))
    }
}
