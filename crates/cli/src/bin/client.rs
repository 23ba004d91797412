//! Calls the order and greeting services and prints the results.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::time::Duration;

use clap::Parser;
use tracing::info;
use unary_cli::{Error, init_tracing};
use unary_hello::HelloClient;
use unary_orders::OrderClient;
use unary_rpc::{ClientBuilder, CodecKind, Endpoint, RegistryClient};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Call the server at this address instead of looking it up
    #[arg(long, env = "UNARY_SERVER")]
    server: Option<Endpoint>,

    /// Registry used to find the services
    #[arg(long, default_value = "127.0.0.1:1099", env = "UNARY_REGISTRY")]
    registry: Endpoint,

    /// Payload encoding (cbor or json)
    #[arg(long, default_value = "cbor", env = "UNARY_CODEC")]
    codec: CodecKind,

    /// Per-call timeout in seconds; waits indefinitely when unset
    #[arg(long, env = "UNARY_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Order to fetch
    #[arg(long, default_value_t = 1)]
    order_id: i64,

    /// User whose orders to fetch
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// Name to greet
    #[arg(long, default_value = "1")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let args = Args::parse();

    let mut builder = ClientBuilder::new().codec(args.codec);
    if let Some(secs) = args.timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    let (orders, hello) = match args.server {
        Some(server) => {
            info!("Calling {} directly", server);
            (
                OrderClient::from_rpc_client(builder.clone().endpoint(server.clone()).build()?),
                HelloClient::from_rpc_client(builder.endpoint(server).build()?),
            )
        }
        None => {
            info!("Looking up services in registry at {}", args.registry);
            let registry = RegistryClient::new(args.registry)?;
            (
                OrderClient::lookup(&registry, builder.clone()).await?,
                HelloClient::lookup(&registry, builder).await?,
            )
        }
    };

    let order = orders.get_order(args.order_id).await?;
    println!("getOrder({}) -> {:?}", args.order_id, order);

    let list = orders.get_orders(args.user_id).await?;
    println!("getOrders({}) ->", args.user_id);
    for order in &list.orders {
        println!("  {order:?}");
    }

    let greeting = hello.say_hello(&args.name).await?;
    println!("sayHello({:?}) -> {}", args.name, greeting);

    Ok(())
}
