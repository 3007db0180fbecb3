//! Chain backends for proof construction
//!
//! `Rpc` serves proofs straight from a remote node; `Memory` builds the
//! same proof material from an in-process state trie, for tests and local
//! development. Both answer the identical three questions: current head,
//! a storage word, and an account-plus-slots proof at a pinned block.

use std::collections::HashMap;

use alloy_primitives::{keccak256, U256};

use basealias_core::proto::{AnchorHead, ProvenSlot};
use basealias_core::{layout, Address, NodeId, RecordKind};
use basealias_verifier::build::{encode_account, encode_storage_word, TrieBuilder};
use basealias_verifier::trie::Account;

use crate::error::{Result, ServerError};
use crate::rpc::RpcChain;

/// Proof material for one request: state root, account proof, proven slots
pub type ProofMaterial = ([u8; 32], Vec<Vec<u8>>, Vec<ProvenSlot>);

pub enum ChainBackend {
    Rpc(RpcChain),
    Memory(MemoryChain),
}

impl ChainBackend {
    pub fn describe(&self) -> &'static str {
        match self {
            ChainBackend::Rpc(_) => "rpc",
            ChainBackend::Memory(_) => "memory",
        }
    }

    pub async fn head(&self) -> Result<AnchorHead> {
        match self {
            ChainBackend::Rpc(rpc) => rpc.head().await,
            ChainBackend::Memory(memory) => Ok(memory.head()),
        }
    }

    pub async fn storage_at(
        &self,
        address: Address,
        slot: [u8; 32],
        block: u64,
    ) -> Result<[u8; 32]> {
        match self {
            ChainBackend::Rpc(rpc) => rpc.storage_at(address, slot, block).await,
            ChainBackend::Memory(memory) => {
                memory.check_block(block)?;
                Ok(memory.storage_at(&address, &slot))
            }
        }
    }

    pub async fn proof(
        &self,
        address: Address,
        slots: &[[u8; 32]],
        block: u64,
    ) -> Result<ProofMaterial> {
        match self {
            ChainBackend::Rpc(rpc) => {
                let dto = rpc.proof(address, slots, block).await?;
                let header = rpc
                    .header_at(alloy_rpc_types::BlockNumberOrTag::Number(block))
                    .await?;
                let account_proof =
                    dto.account_proof.iter().map(|node| node.to_vec()).collect();
                if dto.storage_proof.len() != slots.len() {
                    return Err(ServerError::Proof(format!(
                        "node returned {} storage proofs for {} slots",
                        dto.storage_proof.len(),
                        slots.len()
                    )));
                }
                let proven = slots
                    .iter()
                    .zip(&dto.storage_proof)
                    .map(|(slot, entry)| ProvenSlot {
                        slot: *slot,
                        value: entry.value.to_be_bytes::<32>(),
                        proof: entry.proof.iter().map(|node| node.to_vec()).collect(),
                    })
                    .collect();
                Ok((header.state_root, account_proof, proven))
            }
            ChainBackend::Memory(memory) => {
                memory.check_block(block)?;
                Ok(memory.proof(&address, slots))
            }
        }
    }
}

struct MemoryAccount {
    nonce: u64,
    balance: U256,
    storage: HashMap<[u8; 32], [u8; 32]>,
}

impl MemoryAccount {
    fn new() -> Self {
        Self { nonce: 1, balance: U256::ZERO, storage: HashMap::new() }
    }
}

/// In-process chain state serving the same proof shapes a remote node
/// would. Only the current block is queryable.
pub struct MemoryChain {
    block: u64,
    timestamp: u64,
    accounts: HashMap<Address, MemoryAccount>,
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChain {
    pub fn new() -> Self {
        Self { block: 1, timestamp: 1_700_000_000, accounts: HashMap::new() }
    }

    pub fn block(&self) -> u64 {
        self.block
    }

    pub fn advance_block(&mut self) {
        self.block += 1;
        self.timestamp += 2;
    }

    fn check_block(&self, block: u64) -> Result<()> {
        if block != self.block {
            return Err(ServerError::InvalidQuery(format!(
                "memory chain serves only block {}, got {}",
                self.block, block
            )));
        }
        Ok(())
    }

    pub fn set_storage(&mut self, address: Address, slot: [u8; 32], word: [u8; 32]) {
        self.accounts
            .entry(address)
            .or_insert_with(MemoryAccount::new)
            .storage
            .insert(slot, word);
    }

    pub fn storage_at(&self, address: &Address, slot: &[u8; 32]) -> [u8; 32] {
        self.accounts
            .get(address)
            .and_then(|account| account.storage.get(slot))
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Write a record value into the resolver's storage at its current
    /// record version, head slot plus continuation slots.
    pub fn set_record(
        &mut self,
        resolver: Address,
        node: NodeId,
        record: &RecordKind,
        value: &[u8],
    ) {
        let version_word = self.storage_at(&resolver, &layout::record_version_slot(&node));
        let version = layout::decode_u64_word(&version_word).unwrap_or(0);
        let head_slot = layout::value_head_slot(version, &node, record);
        let (head, tails) = layout::encode_storage_bytes(value);
        self.set_storage(resolver, head_slot, head);
        for (i, tail) in tails.iter().enumerate() {
            self.set_storage(resolver, layout::bytes_tail_slot(&head_slot, i as u64), *tail);
        }
    }

    /// Bump the record version for a node, hiding every value written at
    /// the previous version (the resolver's clear-records semantics).
    pub fn bump_record_version(&mut self, resolver: Address, node: NodeId) {
        let slot = layout::record_version_slot(&node);
        let current = layout::decode_u64_word(&self.storage_at(&resolver, &slot)).unwrap_or(0);
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&(current + 1).to_be_bytes());
        self.set_storage(resolver, slot, word);
    }

    /// Override the root registry's ownership record for a node, for
    /// fixtures that simulate registry state.
    pub fn set_registry_owner(&mut self, registry: Address, node: NodeId, owner: Address) {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&owner);
        self.set_storage(registry, layout::registry_owner_slot(&node), word);
    }

    fn storage_trie(&self, account: &MemoryAccount) -> TrieBuilder {
        let mut builder = TrieBuilder::default();
        for (slot, word) in &account.storage {
            if *word != [0u8; 32] {
                builder.insert(slot, encode_storage_word(word));
            }
        }
        builder
    }

    fn state_trie(&self) -> TrieBuilder {
        let mut builder = TrieBuilder::default();
        for (address, account) in &self.accounts {
            let body = Account {
                nonce: account.nonce,
                balance: account.balance,
                storage_root: self.storage_trie(account).root(),
                code_hash: keccak256([]),
            };
            builder.insert(address, encode_account(&body));
        }
        builder
    }

    pub fn state_root(&self) -> [u8; 32] {
        self.state_trie().root().0
    }

    pub fn head(&self) -> AnchorHead {
        AnchorHead {
            block: self.block,
            state_root: self.state_root(),
            timestamp: self.timestamp,
        }
    }

    pub fn proof(&self, address: &Address, slots: &[[u8; 32]]) -> ProofMaterial {
        let state = self.state_trie();
        let storage = match self.accounts.get(address) {
            Some(account) => self.storage_trie(account),
            None => TrieBuilder::default(),
        };
        let proven = slots
            .iter()
            .map(|slot| ProvenSlot {
                slot: *slot,
                value: self.storage_at(address, slot),
                proof: storage.prove(slot),
            })
            .collect();
        (state.root().0, state.prove(address), proven)
    }
}
