//! Ancestor-walking alias resolution
//!
//! Given a queried name, find the nearest ancestor (leaf-closest first,
//! including the name itself) with an explicit alias and transplant the
//! labels below it onto the alias destination. Rewriting is single-pass:
//! the transplanted node is never walked through the store again, so
//! self- or descendant-aliases cannot loop.

use crate::alias::AliasStore;
use crate::name::{label_hash, node_id, WireName};
use crate::registry::OwnershipOracle;
use crate::{Address, Error, NodeId, Result};

/// How the canonical node was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// An ancestor alias applied; `depth` is the number of labels
    /// transplanted below the aliased ancestor (0 = the name itself
    /// was aliased, `label_count()` = the root fallback).
    Alias {
        depth: usize,
        source: NodeId,
        dest: NodeId,
    },
    /// No alias applied; the root registry reported a resolver on the
    /// original node.
    Owned { resolver: Address },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The effective canonical node
    pub node: NodeId,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn is_aliased(&self) -> bool {
        matches!(self.source, ResolutionSource::Alias { .. })
    }
}

/// The name-walking engine
pub struct AliasResolver<'a> {
    store: &'a AliasStore,
    oracle: &'a dyn OwnershipOracle,
}

impl<'a> AliasResolver<'a> {
    pub fn new(store: &'a AliasStore, oracle: &'a dyn OwnershipOracle) -> Self {
        Self { store, oracle }
    }

    /// Resolve the effective canonical node for a queried name.
    ///
    /// Ancestors are scanned over a precomputed node-id array, from the
    /// full name toward the root; the first ancestor carrying an alias
    /// wins. With no alias anywhere, resolution falls through to the
    /// ownership registry on the original node.
    pub fn resolve(&self, name: &WireName) -> Result<Resolution> {
        let ids = name.node_ids();
        let labels = name.labels();
        let k = labels.len();

        for depth in 0..=k {
            let ancestor = ids[k - depth];
            if let Some(dest) = self.store.get_alias(&ancestor) {
                // Transplant the labels below the ancestor onto the
                // destination, re-applying the hierarchical hash in
                // original order.
                let mut node = dest;
                for label in labels[..depth].iter().rev() {
                    node = node_id(node, label_hash(label));
                }
                return Ok(Resolution {
                    node,
                    source: ResolutionSource::Alias { depth, source: ancestor, dest },
                });
            }
        }

        match self.oracle.resolver_of(&ids[k]) {
            Some(resolver) => Ok(Resolution {
                node: ids[k],
                source: ResolutionSource::Owned { resolver },
            }),
            None => Err(Error::NoResolver(format!("0x{}", hex::encode(ids[k])))),
        }
    }
}
