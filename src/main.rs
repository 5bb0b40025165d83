//! upm CLI entrypoint

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use upm::cli::{Cli, Invocation};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Verbosity comes from the argument, so parse before installing the subscriber
    let default_level = match cli.invocation() {
        Ok(Invocation::Run { verbose: true }) => "debug",
        _ => "info",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    cli.execute().await
}
