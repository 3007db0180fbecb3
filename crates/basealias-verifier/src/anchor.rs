//! Trusted anchor over the remote chain's state roots
//!
//! Keeps a bounded history of accepted (block, root) pairs so proofs taken
//! against a recently superseded root still verify inside the staleness
//! window. Updates are monotonic in block number and checked against the
//! configured trust mode before anything is accepted. Readers observe
//! either the old or the new history, never a partial one.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use alloy_primitives::keccak256;
use basealias_core::proto::AnchorHead;
use basealias_core::TrustMode;

use crate::error::VerifyError;

/// Accepted anchors retained for "covered by" checks
pub const ANCHOR_HISTORY: usize = 64;

/// One accepted anchor update. Replaying the log in order reconstructs
/// the anchor exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorEvent {
    /// 1-based sequence number
    pub version: u64,
    pub block: u64,
    #[serde(with = "basealias_core::hexfmt::bytes32")]
    pub state_root: [u8; 32],
    pub timestamp: u64,
}

/// Evidence accompanying an anchor update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commitment {
    /// Bare head report from the remote chain's own RPC. Only meaningful
    /// when the chain operator is trusted (self-certified mode).
    ChainHead,
    /// Rollup output proposal committed on the settlement layer. The
    /// anchor recomputes `keccak(version || state_root ||
    /// message_passer_root || block_hash)` and requires it to equal the
    /// committed output root.
    OutputProposal {
        version: [u8; 32],
        message_passer_root: [u8; 32],
        block_hash: [u8; 32],
        committed_root: [u8; 32],
    },
}

/// Recompute the rollup output root for a candidate state root
pub fn output_root(
    version: &[u8; 32],
    state_root: &[u8; 32],
    message_passer_root: &[u8; 32],
    block_hash: &[u8; 32],
) -> [u8; 32] {
    let mut buf = [0u8; 128];
    buf[..32].copy_from_slice(version);
    buf[32..64].copy_from_slice(state_root);
    buf[64..96].copy_from_slice(message_passer_root);
    buf[96..].copy_from_slice(block_hash);
    keccak256(buf).0
}

pub struct StateAnchor {
    mode: TrustMode,
    max_lag: u64,
    ring: ArcSwap<Vec<AnchorHead>>,
    log: Mutex<Vec<AnchorEvent>>,
}

impl StateAnchor {
    pub fn new(mode: TrustMode, max_lag: u64) -> Self {
        Self {
            mode,
            max_lag,
            ring: ArcSwap::from_pointee(Vec::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Reconstruct an anchor from an event log. Events were already
    /// commitment-checked when accepted, so they replay unconditionally.
    pub fn from_events(mode: TrustMode, max_lag: u64, events: &[AnchorEvent]) -> Self {
        let anchor = Self::new(mode, max_lag);
        {
            let mut log = anchor.log.lock().expect("anchor log lock poisoned");
            let mut ring = Vec::new();
            for event in events {
                ring.push(AnchorHead {
                    block: event.block,
                    state_root: event.state_root,
                    timestamp: event.timestamp,
                });
                if ring.len() > ANCHOR_HISTORY {
                    ring.remove(0);
                }
                log.push(*event);
            }
            anchor.ring.store(Arc::new(ring));
        }
        anchor
    }

    pub fn mode(&self) -> TrustMode {
        self.mode
    }

    pub fn max_lag(&self) -> u64 {
        self.max_lag
    }

    /// Most recently accepted anchor, if any
    pub fn latest(&self) -> Option<AnchorHead> {
        self.ring.load().last().copied()
    }

    /// Accept a new head after checking the commitment against the trust
    /// mode. Re-submitting the current head is a no-op; an older block is
    /// never substituted in.
    pub fn advance(&self, head: AnchorHead, commitment: &Commitment) -> Result<u64, VerifyError> {
        match (self.mode, commitment) {
            (TrustMode::Finalized, Commitment::ChainHead) => {
                return Err(VerifyError::CommitmentRequired);
            }
            (
                _,
                Commitment::OutputProposal {
                    version,
                    message_passer_root,
                    block_hash,
                    committed_root,
                },
            ) => {
                let computed =
                    output_root(version, &head.state_root, message_passer_root, block_hash);
                if computed != *committed_root {
                    return Err(VerifyError::OutputRootMismatch {
                        computed: format!("0x{}", hex::encode(computed)),
                        committed: format!("0x{}", hex::encode(committed_root)),
                    });
                }
            }
            (TrustMode::SelfCertified, Commitment::ChainHead) => {}
        }

        let mut log = self.log.lock().expect("anchor log lock poisoned");
        let mut ring = Vec::clone(&self.ring.load());
        if let Some(latest) = ring.last() {
            if head.block < latest.block {
                return Err(VerifyError::Stale {
                    proof_block: head.block,
                    anchor_block: latest.block,
                });
            }
            if head.block == latest.block {
                if head.state_root == latest.state_root {
                    return Ok(log.len() as u64);
                }
                return Err(VerifyError::RootMismatch { block: head.block });
            }
        }
        ring.push(head);
        if ring.len() > ANCHOR_HISTORY {
            ring.remove(0);
        }
        self.ring.store(Arc::new(ring));
        let version = log.len() as u64 + 1;
        log.push(AnchorEvent {
            version,
            block: head.block,
            state_root: head.state_root,
            timestamp: head.timestamp,
        });
        tracing::debug!(block = head.block, version, "anchor advanced");
        Ok(version)
    }

    /// The accepted root for `block`, if the anchor still covers it.
    /// Blocks ahead of the anchor, past the staleness window, or never
    /// anchored are all rejected.
    pub fn root_for(&self, block: u64) -> Result<[u8; 32], VerifyError> {
        let ring = self.ring.load();
        let latest = ring.last().ok_or(VerifyError::NoAnchor)?;
        if block > latest.block {
            return Err(VerifyError::AheadOfAnchor {
                proof_block: block,
                anchor_block: latest.block,
            });
        }
        if latest.block - block > self.max_lag {
            return Err(VerifyError::Stale {
                proof_block: block,
                anchor_block: latest.block,
            });
        }
        ring.iter()
            .rev()
            .find(|head| head.block == block)
            .map(|head| head.state_root)
            .ok_or(VerifyError::Stale {
                proof_block: block,
                anchor_block: latest.block,
            })
    }

    /// Check that `(block, root)` is covered by the anchor
    pub fn covers(&self, block: u64, root: &[u8; 32]) -> Result<(), VerifyError> {
        let expected = self.root_for(block)?;
        if expected != *root {
            return Err(VerifyError::RootMismatch { block });
        }
        Ok(())
    }

    /// Snapshot of the acceptance log
    pub fn events(&self) -> Vec<AnchorEvent> {
        self.log.lock().expect("anchor log lock poisoned").clone()
    }
}

impl std::fmt::Debug for StateAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateAnchor")
            .field("mode", &self.mode)
            .field("latest", &self.latest().map(|h| h.block))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(block: u64, root: u8) -> AnchorHead {
        AnchorHead { block, state_root: [root; 32], timestamp: 1_700_000_000 + block }
    }

    #[test]
    fn test_monotonic_blocks() {
        let anchor = StateAnchor::new(TrustMode::SelfCertified, 64);
        anchor.advance(head(10, 0x0a), &Commitment::ChainHead).unwrap();
        anchor.advance(head(12, 0x0c), &Commitment::ChainHead).unwrap();
        let err = anchor.advance(head(11, 0x0b), &Commitment::ChainHead).unwrap_err();
        assert!(matches!(err, VerifyError::Stale { proof_block: 11, anchor_block: 12 }));
        assert_eq!(anchor.latest().unwrap().block, 12);
    }

    #[test]
    fn test_resubmitting_head_is_idempotent() {
        let anchor = StateAnchor::new(TrustMode::SelfCertified, 64);
        let v1 = anchor.advance(head(10, 0x0a), &Commitment::ChainHead).unwrap();
        let v2 = anchor.advance(head(10, 0x0a), &Commitment::ChainHead).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(anchor.events().len(), 1);

        // a different root at the anchored block is never substituted in
        let err = anchor.advance(head(10, 0x0b), &Commitment::ChainHead).unwrap_err();
        assert!(matches!(err, VerifyError::RootMismatch { block: 10 }));
    }

    #[test]
    fn test_covered_window() {
        let anchor = StateAnchor::new(TrustMode::SelfCertified, 4);
        for block in 1..=10 {
            anchor.advance(head(block, block as u8), &Commitment::ChainHead).unwrap();
        }
        // recent superseded roots stay covered
        anchor.covers(8, &[8; 32]).unwrap();
        anchor.covers(10, &[10; 32]).unwrap();
        // past the staleness window
        assert!(matches!(
            anchor.covers(5, &[5; 32]).unwrap_err(),
            VerifyError::Stale { proof_block: 5, anchor_block: 10 }
        ));
        // ahead of the anchor
        assert!(matches!(
            anchor.covers(11, &[11; 32]).unwrap_err(),
            VerifyError::AheadOfAnchor { .. }
        ));
        // covered block, wrong root
        assert!(matches!(
            anchor.covers(9, &[0xee; 32]).unwrap_err(),
            VerifyError::RootMismatch { block: 9 }
        ));
    }

    #[test]
    fn test_no_anchor_rejects() {
        let anchor = StateAnchor::new(TrustMode::SelfCertified, 64);
        assert!(matches!(anchor.root_for(1).unwrap_err(), VerifyError::NoAnchor));
    }

    #[test]
    fn test_finalized_requires_output_proposal() {
        let anchor = StateAnchor::new(TrustMode::Finalized, 64);
        let err = anchor.advance(head(5, 0x05), &Commitment::ChainHead).unwrap_err();
        assert!(matches!(err, VerifyError::CommitmentRequired));

        let h = head(5, 0x05);
        let committed = output_root(&[0u8; 32], &h.state_root, &[0x77; 32], &[0x88; 32]);
        anchor
            .advance(
                h,
                &Commitment::OutputProposal {
                    version: [0u8; 32],
                    message_passer_root: [0x77; 32],
                    block_hash: [0x88; 32],
                    committed_root: committed,
                },
            )
            .unwrap();
        assert_eq!(anchor.latest().unwrap().block, 5);

        // a forged state root fails the recomputation
        let forged = head(6, 0x66);
        let err = anchor
            .advance(
                forged,
                &Commitment::OutputProposal {
                    version: [0u8; 32],
                    message_passer_root: [0x77; 32],
                    block_hash: [0x88; 32],
                    committed_root: committed,
                },
            )
            .unwrap_err();
        assert!(matches!(err, VerifyError::OutputRootMismatch { .. }));
    }

    #[test]
    fn test_event_json_shape() {
        let event = AnchorEvent {
            version: 1,
            block: 42,
            state_root: [0x11; 32],
            timestamp: 1_700_000_042,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"0x1111"));
        assert_eq!(serde_json::from_str::<AnchorEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_reconstruct_from_events() {
        let anchor = StateAnchor::new(TrustMode::SelfCertified, 8);
        for block in 1..=6 {
            anchor.advance(head(block, block as u8), &Commitment::ChainHead).unwrap();
        }
        let rebuilt = StateAnchor::from_events(TrustMode::SelfCertified, 8, &anchor.events());
        assert_eq!(rebuilt.latest(), anchor.latest());
        assert_eq!(rebuilt.root_for(4).unwrap(), [4; 32]);
        assert_eq!(rebuilt.events(), anchor.events());
    }
}
