//! basealias-gateway: off-chain proof gateway
//!
//! Answers record-lookup descriptors with the storage values and Merkle
//! proofs that anchor them to the remote chain's state. The gateway is
//! untrusted by design: clients verify everything it returns against
//! their own anchor, so a gateway can deny service but never forge a
//! record.

pub mod chain;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod rpc;
pub mod server;
pub mod state;

pub use chain::{ChainBackend, MemoryChain};
pub use error::ServerError;
pub use routes::create_router;
pub use rpc::RpcChain;
pub use server::{GatewayServer, ServerBuilder};
pub use state::{create_shared_state, GatewayState, SharedState};
