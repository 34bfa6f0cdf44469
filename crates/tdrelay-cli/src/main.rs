//! tdrelay CLI - The `tdrelay` command.
//!
//! Listens for OSC on UDP and rebroadcasts every message to connected
//! browsers over WebSocket as a `td-data` event.
//!
//! # Architecture
//!
//! The binary wires the two library crates together on one single-threaded
//! tokio runtime:
//!
//! - **tdrelay-core**: Configuration, OSC decoding, UDP listener
//! - **tdrelay-http**: Broadcast gateway, WebSocket and status endpoints

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tdrelay_core::{OscListener, RelayConfig};
use tdrelay_http::{AppState, Gateway};

/// tdrelay - OSC to WebSocket relay
#[derive(Parser, Debug)]
#[command(name = "tdrelay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relay OSC messages from UDP to browsers over WebSocket", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// UDP port to receive OSC on
    #[arg(long, value_name = "PORT", global = true)]
    osc_port: Option<u16>,

    /// TCP port browsers connect to
    #[arg(long, value_name = "PORT", global = true)]
    http_port: Option<u16>,

    /// Full UDP bind address (port overridden by --osc-port)
    #[arg(long, value_name = "ADDR", global = true)]
    osc_bind: Option<SocketAddr>,

    /// Full HTTP bind address (port overridden by --http-port)
    #[arg(long, value_name = "ADDR", global = true)]
    http_bind: Option<SocketAddr>,

    /// Events a browser may fall behind before it starts missing them
    #[arg(long, value_name = "N", global = true)]
    broadcast_capacity: Option<usize>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Run the relay (default)
    Run,

    /// Print the effective configuration as TOML
    PrintConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_logger(args.verbose);
            let config = resolve_config(&args)?;
            run_relay(config)
        }
        Commands::PrintConfig => {
            let config = resolve_config(&args)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Merge defaults, the config file and command line flags, in that order.
fn resolve_config(args: &Args) -> Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RelayConfig::default(),
    };

    if let Some(addr) = args.osc_bind {
        config.osc.bind_addr = addr;
    }
    if let Some(addr) = args.http_bind {
        config.http.bind_addr = addr;
    }
    if let Some(port) = args.osc_port {
        config.osc.bind_addr.set_port(port);
    }
    if let Some(port) = args.http_port {
        config.http.bind_addr.set_port(port);
    }
    if let Some(capacity) = args.broadcast_capacity {
        config.http.broadcast_capacity = capacity;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_relay(config: RelayConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(relay(config))
}

async fn relay(config: RelayConfig) -> Result<()> {
    let gateway = Gateway::new(config.http.broadcast_capacity);

    let osc = OscListener::bind(config.osc.bind_addr)
        .await
        .with_context(|| format!("Failed to bind OSC socket on udp://{}", config.osc.bind_addr))?;
    let http = tdrelay_http::bind(config.http.bind_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", config.http.bind_addr))?;

    let state = AppState::with_listener_stats(gateway.clone(), osc.stats());

    log::info!("🚀 Relay starting (browsers: ws://{}/ws)", config.http.bind_addr);
    log::info!("📡 Listening for TD OSC on UDP {}", osc.local_addr()?);

    tokio::select! {
        result = osc.run(&gateway) => result.context("OSC listener failed")?,
        result = tdrelay_http::serve(http, state) => result.context("HTTP server failed")?,
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            log::info!("⚠️  Interrupted by user (Ctrl+C)");
        }
    }

    log::info!(
        "👋 Exiting... ({} event(s) broadcast, {} browser(s) connected)",
        gateway.broadcast_count(),
        gateway.client_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["tdrelay"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = parse(&[]);
        assert_eq!(args.command, None);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.osc.bind_addr.port(), 10000);
        assert_eq!(config.http.bind_addr.port(), 3000);
    }

    #[test]
    fn test_port_flags() {
        let config = resolve_config(&parse(&["--osc-port", "9001", "--http-port", "8080"])).unwrap();
        assert_eq!(config.osc.bind_addr, "0.0.0.0:9001".parse().unwrap());
        assert_eq!(config.http.bind_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn test_port_overrides_bind_port() {
        let config = resolve_config(&parse(&[
            "--osc-bind",
            "127.0.0.1:7000",
            "--osc-port",
            "7001",
        ]))
        .unwrap();
        assert_eq!(config.osc.bind_addr, "127.0.0.1:7001".parse().unwrap());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[osc]\nbind_addr = \"127.0.0.1:9000\"\n\n[http]\nbroadcast_capacity = 32"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = resolve_config(&parse(&["--config", path, "--osc-port", "9100"])).unwrap();
        assert_eq!(config.osc.bind_addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.http.broadcast_capacity, 32);
        assert_eq!(config.http.bind_addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(resolve_config(&parse(&["--broadcast-capacity", "0"])).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(resolve_config(&parse(&["--config", "/nonexistent/tdrelay.toml"])).is_err());
    }

    #[test]
    fn test_subcommands() {
        assert_eq!(parse(&["run"]).command, Some(Commands::Run));
        assert!(Args::try_parse_from(["tdrelay", "version"]).is_err());

        // Version output comes from clap's built-in flag.
        let err = Args::try_parse_from(["tdrelay", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);

        let args = parse(&["print-config", "--http-port", "4000"]);
        assert_eq!(args.command, Some(Commands::PrintConfig));
        assert_eq!(resolve_config(&args).unwrap().http.bind_addr.port(), 4000);
    }
}
