//! NodeSocket CLI Client
//!
//! Command-line interface for calling functions on a NodeSocket peer.

use clap::{Parser, Subcommand};
use nodesocket::{AddressFamily, Config, Node, WireValue};
use tracing_subscriber::{fmt, EnvFilter};

/// NodeSocket CLI
#[derive(Parser, Debug)]
#[command(name = "nodesocket-cli")]
#[command(about = "CLI for NodeSocket peers")]
struct Args {
    /// Server host name or address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Only resolve IPv4 addresses
    #[arg(long)]
    ipv4: bool,

    /// Poll deadline for responses (milliseconds)
    #[arg(long, default_value = "5000")]
    poll_timeout_ms: u64,

    /// Claim the master role before every call
    #[arg(long)]
    bidirectional: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call a remote function
    Call {
        /// The function identifier
        identifier: String,

        /// Arguments as type:value (i8, u8, i16, u16, i32, u32, f32, f64, str, bool)
        args: Vec<String>,
    },

    /// Ping the peer
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .poll_timeout_ms(args.poll_timeout_ms)
        .bidirectional(args.bidirectional)
        .build();

    let families = [AddressFamily::Ipv4];
    let filter = if args.ipv4 { Some(&families[..]) } else { None };

    let mut node = Node::resolve(&args.host, args.port, filter, config)?;
    node.connect()?;

    let (identifier, call_args) = match args.command {
        Commands::Call { identifier, args } => {
            let parsed = args
                .iter()
                .map(|arg| parse_arg(arg))
                .collect::<Result<Vec<_>, _>>()?;
            (identifier, parsed)
        }
        Commands::Ping => ("ping".to_string(), Vec::new()),
    };

    let result: Option<WireValue> = node.remote_execute(&identifier, &call_args)?;
    match result {
        Some(value) => println!("{}", value),
        None => println!("(no result)"),
    }

    node.close();
    Ok(())
}

/// Parse `type:value`; a bare value is sent as a string
fn parse_arg(raw: &str) -> Result<WireValue, String> {
    let (kind, value) = match raw.split_once(':') {
        Some(parts) => parts,
        None => return Ok(WireValue::String(raw.to_string())),
    };

    let bad = |e: &dyn std::fmt::Display| format!("invalid {} argument '{}': {}", kind, value, e);

    let parsed = match kind {
        "i8" => WireValue::Byte(value.parse::<i8>().map_err(|e| bad(&e))?),
        "u8" => WireValue::UByte(value.parse::<u8>().map_err(|e| bad(&e))?),
        "i16" => WireValue::Short(value.parse::<i16>().map_err(|e| bad(&e))?),
        "u16" => WireValue::UShort(value.parse::<u16>().map_err(|e| bad(&e))?),
        "i32" => WireValue::Int(value.parse::<i32>().map_err(|e| bad(&e))?),
        "u32" => WireValue::UInt(value.parse::<u32>().map_err(|e| bad(&e))?),
        "f32" => WireValue::Float(value.parse::<f32>().map_err(|e| bad(&e))?),
        "f64" => WireValue::Double(value.parse::<f64>().map_err(|e| bad(&e))?),
        "bool" => WireValue::Boolean(value.parse::<bool>().map_err(|e| bad(&e))?),
        "str" => WireValue::String(value.to_string()),
        _ => WireValue::String(raw.to_string()),
    };

    Ok(parsed)
}
