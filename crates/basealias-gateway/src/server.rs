//! Proof gateway server

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::chain::ChainBackend;
use crate::error::Result;
use crate::routes::create_router;
use crate::state::{create_shared_state, GatewayState, SharedState};

pub struct GatewayServer {
    state: SharedState,
    addr: SocketAddr,
}

impl GatewayServer {
    pub fn new(backend: ChainBackend, addr: SocketAddr) -> Self {
        let state = create_shared_state(backend);
        Self { state, addr }
    }

    /// Run the server
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state);

        tracing::info!("Starting proof gateway on {}", self.addr);

        let listener = TcpListener::bind(self.addr).await?;
        axum::serve(listener, router)
            .await
            .map_err(|e| crate::error::ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Get the server state for testing
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }
}

/// Builder for GatewayServer
pub struct ServerBuilder {
    backend: ChainBackend,
    addr: SocketAddr,
    metrics: bool,
}

impl ServerBuilder {
    pub fn new(backend: ChainBackend) -> Self {
        Self {
            backend,
            addr: ([127, 0, 0, 1], 8045).into(),
            metrics: false,
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.addr = ([0, 0, 0, 0], port).into();
        self
    }

    /// Install a Prometheus recorder and expose /metrics
    pub fn metrics(mut self, enabled: bool) -> Self {
        self.metrics = enabled;
        self
    }

    pub fn build(self) -> GatewayServer {
        let mut state = GatewayState::new(self.backend);
        if self.metrics {
            state = state.with_metrics(crate::metrics::init_prometheus_recorder());
        }
        GatewayServer {
            state: std::sync::Arc::new(tokio::sync::RwLock::new(state)),
            addr: self.addr,
        }
    }
}
