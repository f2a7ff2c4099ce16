mod cli;
mod config;
mod credentials;
mod storage;

use std::io;

use crate::cli::{Command, ConfigCommand};
use clap::Parser;
use color_eyre::Result;
use credstore_core::CredentialRecord;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the credential store.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        Command::Save {
            container,
            access_key_id,
            location,
        } => {
            let container = credentials::resolve_container(&config, container)?;
            let secret = credentials::read_secret(
                std::env::var(credentials::SECRET_ENV).ok(),
                io::stdin().lock(),
            )?;
            let store = storage::store_from_config(&config, location.as_deref())?;
            let record = CredentialRecord::new(access_key_id, secret);
            credentials::save(&store, &container, &record)?
        }
        Command::Load {
            container,
            location,
            reveal,
        } => {
            let container = credentials::resolve_container(&config, container)?;
            let store = storage::store_from_config(&config, location.as_deref())?;
            credentials::load(&store, &container, reveal)?
        }
        Command::Health => run_health_check(&config)?,
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters; logs go to stderr so `load` output stays scriptable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("credstore {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick health check of the encrypted storage path.
fn run_health_check(config: &config::Config) -> Result<()> {
    let backend = storage::backend_from_config(config)?;
    credentials::run_store_health(&backend, storage::cipher_from_config(config))?;
    println!("Storage: ok");
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
