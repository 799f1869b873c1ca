// src/main.rs

//! The main entry point for the bridge server application.

use anyhow::Result;
use bitbridge::config::Config;
use bitbridge::core::backend::SimulatedRuntime;
use bitbridge::server;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

const DEFAULT_CONFIG_PATH: &str = "bitbridge.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.iter().any(|arg| arg == "--version") {
        println!("bitbridge version {VERSION}");
        return Ok(());
    }

    // An explicit --config must exist; the default path is optional.
    let explicit_config = args
        .iter()
        .position(|arg| arg == "--config")
        .map(|i| match args.get(i + 1) {
            Some(path) => path.as_str(),
            None => {
                eprintln!("--config flag requires a value");
                std::process::exit(1);
            }
        });

    let loaded = match explicit_config {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH),
        None => Ok(Config::default()),
    };
    let mut config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Override port if provided as a command-line argument.
    let port = match args.iter().position(|arg| arg == "--port") {
        Some(port_index) => match args.get(port_index + 1).map(|s| s.parse::<u16>()) {
            Some(Ok(port)) => Some(port),
            Some(Err(_)) => {
                eprintln!("Invalid port number: {}", args[port_index + 1]);
                std::process::exit(1);
            }
            None => {
                eprintln!("--port flag requires a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    // The first positional argument selects the device instance.
    let instance = positional_args(&args).next();

    if let Err(e) = config.apply_overrides(port, instance) {
        eprintln!("Failed to load configuration: {e:#}");
        std::process::exit(1);
    }

    // Get the log level from the environment or the config.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true), // Enable ANSI color codes for log levels.
        )
        .init();

    info!("Starting bitbridge {}", VERSION);
    let connector = Arc::new(SimulatedRuntime::from_config(&config.simulation));

    if let Err(e) = server::run(config, connector).await {
        error!("Bridge runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Arguments that are neither flags nor flag values.
fn positional_args(args: &[String]) -> impl Iterator<Item = &str> {
    let mut skip_next = false;
    args.iter().skip(1).filter_map(move |arg| {
        if skip_next {
            skip_next = false;
            return None;
        }
        if arg == "--config" || arg == "--port" {
            skip_next = true;
            return None;
        }
        (!arg.starts_with("--")).then_some(arg.as_str())
    })
}
