use clap::Parser;
use corekv::config::NodeConfig;
use corekv::server::{NodeServer, shutdown_signal};
use tracing::info;

/// In-memory key-value storage node serving gRPC
#[derive(Parser, Debug)]
#[command(name = "corekv-node", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// gRPC listening address, overrides the config file
    #[arg(long, env = "GRPC_ADDR")]
    listen: Option<String>,

    /// Number of store shards, overrides the config file
    #[arg(long)]
    shards: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(shards) = args.shards {
        config.shards = shards;
    }
    config.validate()?;

    corekv::logging::init(&config.log)?;

    info!("Starting CoreKV storage node");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = NodeServer::bind(&config).await?;
    info!("Server listening on: {}", server.local_addr());

    server.run_until(shutdown_signal()).await?;
    info!("Shutdown complete");

    Ok(())
}
