//! NodeSocket Server Binary
//!
//! Accepts peers and services their calls as slave.

use clap::Parser;
use nodesocket::{Config, HandlerError, Node, NodeSocketError, Registry, Server, WireValue};
use tracing_subscriber::{fmt, EnvFilter};

/// NodeSocket Server
#[derive(Parser, Debug)]
#[command(name = "nodesocket-server")]
#[command(about = "Serve remote functions to NodeSocket peers")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum concurrent sessions
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Poll deadline for handshakes and frame reads (milliseconds)
    #[arg(short, long, default_value = "5000")]
    poll_timeout_ms: u64,

    /// Keep the master role when a peer requests it
    #[arg(long)]
    deny_master_request: bool,

    /// Enable TCP keep-alive on verified connections
    #[arg(long)]
    keep_alive: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nodesocket=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("NodeSocket Server v{}", nodesocket::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .poll_timeout_ms(args.poll_timeout_ms)
        .deny_master_request(args.deny_master_request)
        .keep_alive(args.keep_alive)
        .build();

    let server = match Server::bind_with_registry(config, demo_registry()) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Serving functions: {:?}", server.registry().identifiers());

    if let Err(e) = server.run(serve_session) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Functions every connected peer may call
fn demo_registry() -> Registry {
    let registry = Registry::new();

    registry.define("double", |call| {
        let value: i32 = call.arg(0)?;
        value
            .checked_mul(2)
            .map(|v| Some(WireValue::Int(v)))
            .ok_or_else(|| HandlerError::failed("overflow"))
    });

    registry.define("add", |call| {
        let a: i32 = call.arg(0)?;
        let b: i32 = call.arg(1)?;
        Ok(Some(WireValue::Int(a.wrapping_add(b))))
    });

    registry.define("echo", |call| Ok(call.args().first().cloned()));

    registry.define("ping", |_| Ok(None));

    registry.define("shutdown", |call| {
        call.stop_listening();
        Ok(None)
    });

    registry
}

/// Service one peer until it disconnects or asks to stop
fn serve_session(mut node: Node) {
    loop {
        match node.listen() {
            // The peer handed us the master role; give it straight back
            Ok(()) if node.is_master() => {
                if let Err(e) = node.request_slave() {
                    tracing::warn!("Could not return master role: {}", e);
                    break;
                }
            }
            Ok(()) => break,
            Err(NodeSocketError::Disconnected) => break,
            Err(e) => {
                tracing::warn!("Session error: {}", e);
                break;
            }
        }
    }
    node.close();
}
