// src/main.rs

//! The main entry point for the Uniclip server and terminal client.

use anyhow::Result;
use std::env;
use std::path::Path;
use tracing::{error, info};
use uniclip::client::terminal::{self, DEFAULT_PING_INTERVAL, Mode, TerminalOptions};
use uniclip::config::Config;
use uniclip::server;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments to decide the execution mode.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("Uniclip version {VERSION}");
        return Ok(());
    }

    if let Some(client_index) = args.iter().position(|arg| arg == "--client") {
        // --- Terminal Client Mode ---
        let mode = match (
            args.get(client_index + 1).map(String::as_str),
            args.get(client_index + 2),
        ) {
            (Some("open"), _) => Mode::Open,
            (Some("join"), Some(code)) => Mode::Join(code.clone()),
            _ => {
                eprintln!("Usage: uniclip --client open|join <CODE> [--server <host[:port]>]");
                std::process::exit(1);
            }
        };
        let server = flag_value(&args, "--server").map(str::to_owned);

        // Keep stdout for payloads; only warnings and errors go to the log by default.
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .compact()
            .with_ansi(true)
            .init();

        let options = TerminalOptions {
            mode,
            server,
            ping_interval: DEFAULT_PING_INTERVAL,
        };
        if let Err(e) = terminal::run(options).await {
            error!("Client error: {:#}", e);
            return Err(e);
        }
        return Ok(());
    }

    // --- Server Mode ---

    // An explicit --config must load. Without one, config.toml is used if present,
    // otherwise the built-in defaults.
    let mut config = match flag_value(&args, "--config") {
        Some(path) => load_config_or_exit(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config_or_exit(DEFAULT_CONFIG_PATH),
        None => Config::default(),
    };

    // Override port if provided as a command-line argument
    if args.iter().any(|arg| arg == "--port") {
        match flag_value(&args, "--port").map(str::parse::<u16>) {
            Some(Ok(port)) if port != 0 => config.port = port,
            Some(_) => {
                eprintln!("Invalid port number.");
                std::process::exit(1);
            }
            None => {
                eprintln!("--port flag requires a value");
                std::process::exit(1);
            }
        }
        if let Err(e) = config.validate() {
            eprintln!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    }

    // Initial log level comes from the environment, falling back to the config.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact() // Use the compact, single-line format.
        .with_ansi(true) // Enable ANSI color codes for log levels.
        .init();

    info!("Uniclip v{VERSION} starting.");
    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Returns the argument following `flag`, if any.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Loads the configuration or exits, as the server cannot run without a valid one.
fn load_config_or_exit(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from \"{path}\": {e:#}");
            std::process::exit(1);
        }
    }
}
