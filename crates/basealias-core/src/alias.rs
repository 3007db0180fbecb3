//! Administrator-controlled alias store
//!
//! Maps a source-hierarchy node to a destination node in the canonical
//! subtree. Only the configured administrator may write; readers always
//! observe a complete mapping (the map is swapped atomically), and every
//! mutation is appended to an event log from which the store can be
//! reconstructed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::{Address, Error, NodeId, Result};

/// Sentinel destination that deletes an alias
pub const NO_ALIAS: NodeId = [0u8; 32];

/// One alias mutation. The log is append-only; replaying it in order
/// reconstructs the store exactly (last write wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEvent {
    /// 1-based sequence number
    pub version: u64,
    #[serde(with = "crate::hexfmt::bytes32")]
    pub source: NodeId,
    #[serde(with = "crate::hexfmt::bytes32")]
    pub dest: NodeId,
}

pub struct AliasStore {
    admin: Address,
    map: ArcSwap<HashMap<NodeId, NodeId>>,
    log: Mutex<Vec<AliasEvent>>,
}

impl AliasStore {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            map: ArcSwap::from_pointee(HashMap::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Reconstruct a store from an event log. Events are facts that were
    /// already authorized when emitted, so no caller check is applied.
    pub fn from_events(admin: Address, events: &[AliasEvent]) -> Self {
        let store = Self::new(admin);
        {
            let mut log = store.log.lock().expect("alias log lock poisoned");
            let mut map = HashMap::new();
            for event in events {
                if event.dest == NO_ALIAS {
                    map.remove(&event.source);
                } else {
                    map.insert(event.source, event.dest);
                }
                log.push(event.clone());
            }
            store.map.store(Arc::new(map));
        }
        store
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Set (or, with [`NO_ALIAS`], delete) the alias for `source`.
    /// Rejects non-administrator callers before any other effect.
    /// Returns the event sequence number.
    pub fn set_alias(&self, caller: &Address, source: NodeId, dest: NodeId) -> Result<u64> {
        if caller != &self.admin {
            return Err(Error::Unauthorized(format!("0x{}", hex::encode(caller))));
        }
        let mut log = self.log.lock().expect("alias log lock poisoned");
        let mut map = HashMap::clone(&self.map.load());
        if dest == NO_ALIAS {
            map.remove(&source);
        } else {
            map.insert(source, dest);
        }
        self.map.store(Arc::new(map));
        let version = log.len() as u64 + 1;
        log.push(AliasEvent { version, source, dest });
        Ok(version)
    }

    /// Current alias destination for `source`, if any
    pub fn get_alias(&self, source: &NodeId) -> Option<NodeId> {
        self.map.load().get(source).copied()
    }

    pub fn len(&self) -> usize {
        self.map.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.load().is_empty()
    }

    /// Snapshot of the mutation log
    pub fn events(&self) -> Vec<AliasEvent> {
        self.log.lock().expect("alias log lock poisoned").clone()
    }
}

impl std::fmt::Debug for AliasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasStore")
            .field("admin", &format!("0x{}", hex::encode(self.admin)))
            .field("aliases", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namehash;

    const ADMIN: Address = [0xad; 20];
    const INTRUDER: Address = [0x66; 20];

    #[test]
    fn test_unauthorized_write_rejected() {
        let store = AliasStore::new(ADMIN);
        let err = store
            .set_alias(&INTRUDER, namehash("chonk.xyz"), namehash("chonker.base.eth"))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert!(store.get_alias(&namehash("chonk.xyz")).is_none());
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let store = AliasStore::new(ADMIN);
        let source = namehash("chonk.xyz");
        store.set_alias(&ADMIN, source, namehash("first.base.eth")).unwrap();
        store.set_alias(&ADMIN, source, namehash("second.base.eth")).unwrap();
        assert_eq!(store.get_alias(&source), Some(namehash("second.base.eth")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_via_sentinel() {
        let store = AliasStore::new(ADMIN);
        let source = namehash("chonk.xyz");
        store.set_alias(&ADMIN, source, namehash("chonker.base.eth")).unwrap();
        store.set_alias(&ADMIN, source, NO_ALIAS).unwrap();
        assert!(store.get_alias(&source).is_none());
        assert_eq!(store.events().len(), 2);
    }

    #[test]
    fn test_reconstruct_from_events() {
        let store = AliasStore::new(ADMIN);
        store.set_alias(&ADMIN, namehash("a.b.c"), namehash("x.base.eth")).unwrap();
        store.set_alias(&ADMIN, namehash("chonk.xyz"), namehash("y.base.eth")).unwrap();
        store.set_alias(&ADMIN, namehash("a.b.c"), NO_ALIAS).unwrap();

        let rebuilt = AliasStore::from_events(ADMIN, &store.events());
        assert_eq!(rebuilt.get_alias(&namehash("a.b.c")), None);
        assert_eq!(rebuilt.get_alias(&namehash("chonk.xyz")), Some(namehash("y.base.eth")));
        assert_eq!(rebuilt.events(), store.events());
    }
}
