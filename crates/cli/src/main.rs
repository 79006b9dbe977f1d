//! starsearch command-line entry point.
//!
//! Fetches a gemini:// or gopher:// page and prints it, or manages the
//! trusted certificate ledger. Logging goes to stderr so page output on
//! stdout stays clean.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use starsearch_client::{FetchClient, FetchConfig};
use starsearch_core::{AppConfig, PageCache, TofuStore};
use tracing_subscriber::EnvFilter;

mod args;
mod browse;
mod certs;
mod render;

use args::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = AppConfig::load().context("loading configuration")?;
    let tofu = Arc::new(
        TofuStore::open(config.known_hosts_path(), Arc::new(config.trust_policy))
            .with_context(|| format!("opening {}", config.known_hosts_path().display()))?,
    );

    match cli.command {
        Some(Command::Certs { action }) => certs::run(&tofu, action),
        None => {
            let cache = Arc::new(PageCache::new(config.cache_max_bytes, config.cache_ttl()));
            let client = FetchClient::new(FetchConfig::from(&config), tofu, cache)?;
            browse::run(&client, &config, cli.browse).await
        }
    }
}
