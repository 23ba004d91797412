//! Standalone service registry.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use unary_cli::{Error, cancel_on_signal, init_tracing};
use unary_rpc::{Endpoint, Registry, RegistryServer, ServerConfig};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:1099", env = "UNARY_REGISTRY_LISTEN")]
    listen: Endpoint,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = 100, env = "UNARY_MAX_CONNECTIONS")]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let args = Args::parse();
    let config = ServerConfig {
        max_connections: args.max_connections,
        ..ServerConfig::default()
    };

    let mut server = RegistryServer::with_config(args.listen, Registry::new(), config);
    let endpoint = server.bind().await?;
    info!("Registry listening on {}", endpoint);

    let shutdown_token = CancellationToken::new();
    cancel_on_signal(shutdown_token.clone());

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_token.cancelled().await;
        handle.shutdown();
    });

    server.serve().await?;
    Ok(())
}
