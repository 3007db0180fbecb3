//! Wire protocol between the resolution client and gateways
//!
//! Requests carry the logical query; gateways answer with the value and
//! the proofs anchoring it to the remote chain's state. Responses carry
//! no session state and are independently verifiable.

use serde::{Deserialize, Serialize};

use crate::record::RecordKind;
use crate::{Address, NodeId};

/// A deterministic query descriptor for one record lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// The remote resolver contract holding the records
    #[serde(with = "crate::hexfmt::bytes20")]
    pub resolver: Address,
    /// The canonical node being queried
    #[serde(with = "crate::hexfmt::bytes32")]
    pub node: NodeId,
    pub record: RecordKind,
}

/// One proven storage slot: the claimed word plus its Merkle path under
/// the account's storage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenSlot {
    #[serde(with = "crate::hexfmt::bytes32")]
    pub slot: [u8; 32],
    #[serde(with = "crate::hexfmt::bytes32")]
    pub value: [u8; 32],
    #[serde(with = "crate::hexfmt::bytes_vec")]
    pub proof: Vec<Vec<u8>>,
}

/// Gateway answer for a [`GatewayRequest`]
///
/// Slot order is fixed: the record-version slot first, then the value
/// head slot, then any continuation slots. The verifier re-derives every
/// slot key locally and rejects responses that deviate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Remote block the proofs were taken at
    pub block: u64,
    #[serde(with = "crate::hexfmt::bytes32")]
    pub state_root: [u8; 32],
    /// Merkle path locating the resolver account under `state_root`
    #[serde(with = "crate::hexfmt::bytes_vec")]
    pub account_proof: Vec<Vec<u8>>,
    pub slots: Vec<ProvenSlot>,
}

/// Self-certified head commitment served by a gateway's chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorHead {
    pub block: u64,
    #[serde(with = "crate::hexfmt::bytes32")]
    pub state_root: [u8; 32],
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namehash;

    #[test]
    fn test_request_roundtrip() {
        let req = GatewayRequest {
            resolver: [0xc6; 20],
            node: namehash("raffy.base.eth"),
            record: RecordKind::text("avatar"),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("0xc6c6"));
        assert_eq!(serde_json::from_str::<GatewayRequest>(&json).unwrap(), req);
    }

    #[test]
    fn test_response_roundtrip() {
        let resp = GatewayResponse {
            block: 1234,
            state_root: [0x11; 32],
            account_proof: vec![vec![0xf8, 0x51], vec![0x80]],
            slots: vec![ProvenSlot {
                slot: [0x22; 32],
                value: [0x33; 32],
                proof: vec![vec![0xde, 0xad]],
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: GatewayResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
