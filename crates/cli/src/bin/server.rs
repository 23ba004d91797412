//! Serves the order and greeting services from one process.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use unary_cli::{Error, cancel_on_signal, init_tracing};
use unary_hello::Greeter;
use unary_orders::{CatalogOrderService, UnknownOrderPolicy};
use unary_rpc::{Endpoint, Registry, RegistryClient, RpcServer, ServerConfig, registry};

const SERVICE_NAMES: [&str; 2] = [unary_orders::SERVICE_NAME, unary_hello::SERVICE_NAME];

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "UNARY_LISTEN")]
    listen: Endpoint,

    /// Also answer registry requests on the listen address
    #[arg(long, env = "UNARY_EMBEDDED_REGISTRY")]
    embedded_registry: bool,

    /// Remote registry to publish the services in
    #[arg(long, env = "UNARY_REGISTRY")]
    registry: Option<Endpoint>,

    /// Host clients should use to reach this server
    #[arg(long, env = "UNARY_ADVERTISE_HOST")]
    advertise_host: Option<String>,

    /// Answer unknown order ids with the reference order instead of NotFound
    #[arg(long, env = "UNARY_PLACEHOLDER_ORDERS")]
    placeholder_orders: bool,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = 100, env = "UNARY_MAX_CONNECTIONS")]
    max_connections: usize,

    /// Seconds a connection may stay idle
    #[arg(long, default_value_t = 60, env = "UNARY_IDLE_TIMEOUT_SECS")]
    idle_timeout_secs: u64,

    /// Seconds to wait for in-flight calls on shutdown
    #[arg(long, default_value_t = 30, env = "UNARY_DRAIN_TIMEOUT_SECS")]
    drain_timeout_secs: u64,
}

/// Endpoint to publish: the bound port on the advertised host, falling back
/// to loopback when bound to a wildcard address.
fn advertised(bound: &Endpoint, advertise_host: Option<&str>) -> Endpoint {
    let host = advertise_host.unwrap_or(match bound.host() {
        "0.0.0.0" | "::" => "127.0.0.1",
        host => host,
    });
    Endpoint::new(host, bound.port())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let args = Args::parse();

    let policy = if args.placeholder_orders {
        UnknownOrderPolicy::Placeholder
    } else {
        UnknownOrderPolicy::NotFound
    };
    let mut router = unary_orders::router(CatalogOrderService::new().with_policy(policy))
        .merge(unary_hello::router(Greeter));

    let directory = Registry::new();
    if args.embedded_registry {
        router = router.merge(registry::router(&directory));
    }

    let config = ServerConfig {
        max_connections: args.max_connections,
        idle_timeout: Duration::from_secs(args.idle_timeout_secs),
        drain_timeout: Duration::from_secs(args.drain_timeout_secs),
        ..ServerConfig::default()
    };

    info!("Serving operations: {:?}", router.operations());
    let mut server = RpcServer::new(args.listen, router, config);
    let bound = server.bind().await?;
    let endpoint = advertised(&bound, args.advertise_host.as_deref());

    if args.embedded_registry {
        for name in SERVICE_NAMES {
            directory.bind(name, endpoint.clone());
        }
        info!("Embedded registry serving on {}", bound);
    }

    let remote = match args.registry {
        Some(registry) => {
            let client = RegistryClient::new(registry.clone())?;
            for name in SERVICE_NAMES {
                client.bind(name, endpoint.clone()).await?;
            }
            info!("Published services in registry at {}", registry);
            Some(client)
        }
        None => None,
    };

    let shutdown_token = CancellationToken::new();
    cancel_on_signal(shutdown_token.clone());

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_token.cancelled().await;
        handle.shutdown();
    });

    info!("Server ready on {} (advertised as {})", bound, endpoint);
    server.serve().await?;

    if let Some(client) = remote {
        for name in SERVICE_NAMES {
            if let Err(e) = client.unbind(name).await {
                warn!("Failed to unbind {}: {}", name, e);
            }
        }
    }

    Ok(())
}
