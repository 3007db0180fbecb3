//! basealias-gateway binary: off-chain proof gateway

use clap::Parser;

use basealias_gateway::chain::{ChainBackend, MemoryChain};
use basealias_gateway::rpc::RpcChain;
use basealias_gateway::server::ServerBuilder;

#[derive(Parser, Debug)]
#[command(name = "basealias-gateway", about = "Proof gateway for verified alias resolution")]
struct Args {
    /// Remote chain JSON-RPC endpoint
    #[arg(long)]
    rpc: Option<String>,

    /// Serve an empty in-memory chain instead of an RPC backend
    #[arg(long)]
    memory: bool,

    /// Listen port
    #[arg(long, default_value_t = 8045)]
    port: u16,

    /// Expose Prometheus metrics at /metrics
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let backend = if let Some(url) = &args.rpc {
        let chain = RpcChain::connect(url).await?;
        tracing::info!(url = %url, "connected to remote chain");
        ChainBackend::Rpc(chain)
    } else if args.memory {
        tracing::warn!("serving an in-memory chain; proofs cover local state only");
        ChainBackend::Memory(MemoryChain::new())
    } else {
        anyhow::bail!("either --rpc <url> or --memory is required");
    };

    let server = ServerBuilder::new(backend)
        .port(args.port)
        .metrics(args.metrics)
        .build();

    tracing::info!("Gateway ready on port {}", args.port);
    server.run().await?;

    Ok(())
}
