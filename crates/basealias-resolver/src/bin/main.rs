//! basealias-resolver binary: one-shot verified resolution CLI

use basealias_core::{AliasEvent, AliasStore, RecordKind, StaticRegistry, WireName};
use basealias_resolver::ResolverClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <config.json> <name> [record] [--aliases <events.json>]", args[0]);
        eprintln!("  record: addr | text:<key> | contenthash (default: addr)");
        eprintln!(
            "Example: {} config.json abc.chonk.xyz text:avatar --aliases aliases.json",
            args[0]
        );
        std::process::exit(1);
    }

    let config_path = &args[1];
    let name_arg = &args[2];
    let mut record_arg = "addr";
    let mut aliases_path: Option<&str> = None;
    let mut iter = args.iter().skip(3);
    while let Some(arg) = iter.next() {
        if arg == "--aliases" {
            aliases_path = iter.next().map(String::as_str);
        } else {
            record_arg = arg;
        }
    }

    let config = basealias_core::ResolverConfig::load(config_path)?;
    let store = if let Some(path) = aliases_path {
        let events: Vec<AliasEvent> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        AliasStore::from_events(config.admin, &events)
    } else {
        AliasStore::new(config.admin)
    };
    let client = ResolverClient::from_parts(config, store, Box::new(StaticRegistry::new()))?;

    let name = WireName::parse(name_arg)?;
    let resolution = client.resolve_node(&name.encode())?;
    tracing::info!(
        name = %name,
        node = %format!("0x{}", hex::encode(resolution.node)),
        aliased = resolution.is_aliased(),
        "resolved canonical node"
    );

    let record = parse_record(record_arg)?;
    client.refresh_anchor().await?;
    let value = client.record_of(resolution.node, record.clone()).await?;

    match record {
        RecordKind::Text { .. } => println!("{}", String::from_utf8_lossy(&value)),
        _ => println!("0x{}", hex::encode(&value)),
    }

    Ok(())
}

fn parse_record(arg: &str) -> anyhow::Result<RecordKind> {
    if arg == "addr" {
        return Ok(RecordKind::eth_address());
    }
    if arg == "contenthash" {
        return Ok(RecordKind::ContentHash);
    }
    if let Some(key) = arg.strip_prefix("text:") {
        if key.is_empty() {
            anyhow::bail!("text record needs a key, e.g. text:avatar");
        }
        return Ok(RecordKind::text(key));
    }
    anyhow::bail!("unknown record kind: {}", arg)
}
