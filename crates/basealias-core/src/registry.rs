//! Read-only view of the root registry's ownership records
//!
//! The registry is an external collaborator: this core only ever asks
//! "who owns node X" and "does X have a resolver", as a fallback signal
//! when no alias applies.

use std::collections::HashMap;

use crate::{Address, NodeId};

/// Ownership answer for a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub owner: Address,
    pub resolver: Option<Address>,
}

/// Read-only ownership oracle over the root registry
pub trait OwnershipOracle: Send + Sync {
    fn owner_of(&self, node: &NodeId) -> Option<Address>;
    fn resolver_of(&self, node: &NodeId) -> Option<Address>;
}

/// In-memory ownership records: registry snapshots and test fixtures
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    records: HashMap<NodeId, OwnershipRecord>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_record(&mut self, node: NodeId, owner: Address, resolver: Option<Address>) {
        self.records.insert(node, OwnershipRecord { owner, resolver });
    }

    pub fn remove(&mut self, node: &NodeId) {
        self.records.remove(node);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl OwnershipOracle for StaticRegistry {
    fn owner_of(&self, node: &NodeId) -> Option<Address> {
        self.records.get(node).map(|r| r.owner)
    }

    fn resolver_of(&self, node: &NodeId) -> Option<Address> {
        self.records.get(node).and_then(|r| r.resolver)
    }
}

/// Oracle that never answers; resolution then relies on aliases alone
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl OwnershipOracle for EmptyRegistry {
    fn owner_of(&self, _node: &NodeId) -> Option<Address> {
        None
    }

    fn resolver_of(&self, _node: &NodeId) -> Option<Address> {
        None
    }
}

/// Wrapping-contract indirection: when the primary registry reports the
/// wrapping contract as owner, ownership is re-queried through the wrapper
/// with the same node id. Resolver records stay on the primary registry.
pub struct WrappedRegistry<P, W> {
    primary: P,
    wrapper: W,
    wrapper_address: Address,
}

impl<P: OwnershipOracle, W: OwnershipOracle> WrappedRegistry<P, W> {
    pub fn new(primary: P, wrapper: W, wrapper_address: Address) -> Self {
        Self { primary, wrapper, wrapper_address }
    }
}

impl<P: OwnershipOracle, W: OwnershipOracle> OwnershipOracle for WrappedRegistry<P, W> {
    fn owner_of(&self, node: &NodeId) -> Option<Address> {
        match self.primary.owner_of(node) {
            Some(owner) if owner == self.wrapper_address => self.wrapper.owner_of(node),
            other => other,
        }
    }

    fn resolver_of(&self, node: &NodeId) -> Option<Address> {
        self.primary.resolver_of(node)
    }
}
