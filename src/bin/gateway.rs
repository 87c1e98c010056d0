use clap::Parser;
use corekv::config::GatewayConfig;
use corekv::gateway::GatewayServer;
use corekv::server::shutdown_signal;
use tracing::info;

/// HTTP/JSON gateway in front of a CoreKV storage node
#[derive(Parser, Debug)]
#[command(name = "corekv-gateway", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listening address, overrides the config file
    #[arg(long, env = "HTTP_ADDR")]
    listen: Option<String>,

    /// Storage node gRPC address, overrides the config file
    #[arg(long, env = "KV_GRPC_ADDR")]
    backend: Option<String>,

    /// Per-call deadline for storage requests in milliseconds
    #[arg(long)]
    request_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(backend) = args.backend {
        config.backend_addr = backend;
    }
    if let Some(timeout) = args.request_timeout_ms {
        config.request_timeout_ms = timeout;
    }
    config.validate()?;

    corekv::logging::init(&config.log)?;

    info!("Starting CoreKV gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = GatewayServer::bind(&config).await?;
    info!("Gateway listening on: {}", server.local_addr());

    server.run_until(shutdown_signal()).await?;
    info!("Shutdown complete");

    Ok(())
}
