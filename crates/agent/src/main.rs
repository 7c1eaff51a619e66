// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gantry Agent Daemon (gantryd)
//!
//! Long-running process that polls the coordinator for jobs and executes
//! them through the registered backends.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use gantry_agent::{Agent, AgentConfig, HttpCoordinator};
use gantry_engine::AdmissionGate;
use gantry_executors::{ExecutorRegistry, ShellExecutorProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "gantry.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("gantryd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("gantryd {}", env!("CARGO_PKG_VERSION"));
                println!("Gantry Agent Daemon - polls the coordinator and executes CI jobs");
                println!();
                println!("USAGE:");
                println!("    gantryd [CONFIG]");
                println!();
                println!("CONFIG defaults to ./{DEFAULT_CONFIG_PATH}. Each runner is one");
                println!("[[runners]] table with name, url, token and optionally executor,");
                println!("request_concurrency, limit and build_dir.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                eprintln!("error: unexpected argument '{flag}'");
                eprintln!("Usage: gantryd [CONFIG | --help | --version]");
                std::process::exit(1);
            }
            path => config_path = PathBuf::from(path),
        }
    }

    setup_logging();

    let config = AgentConfig::load(&config_path)?;
    info!(
        config = %config_path.display(),
        runners = config.runners.len(),
        "starting agent"
    );

    let mut registry = ExecutorRegistry::new();
    registry.register("shell", Arc::new(ShellExecutorProvider::new()));
    let registry = Arc::new(registry);

    let gate = Arc::new(AdmissionGate::new());
    let agent = Arc::new(
        Agent::new(HttpCoordinator::new(), gate.clone(), registry)
            .with_check_interval(config.check_interval()),
    );
    let shutdown = agent.shutdown_token();

    // Interrupt aborts in-flight builds and stops polling
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
            }
            shutdown.cancel();
        });
    }

    if let Some(address) = config.listen_address.clone() {
        let gate = gate.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = gantry_agent::debug_server::serve(&address, gate, shutdown).await {
                tracing::error!(error = %err, "debug listener failed");
            }
        });
    }

    agent.run(config.runners).await;
    info!("agent stopped");
    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
