//! basealias-resolver: verifying resolution client
//!
//! Consumes one or more gateway endpoints with fallback, performing the
//! full pipeline for a queried name: wire decode, alias walk, query
//! construction, gateway round trip, proof verification. Nothing a
//! gateway returns is trusted until it verifies against the client's own
//! state anchor.

pub mod client;
pub mod error;
pub mod registry_rpc;

pub use client::ResolverClient;
pub use error::ClientError;
pub use registry_rpc::RegistryFetcher;
