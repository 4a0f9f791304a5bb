use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campctl=info,campctl_core=info,campctl_local_executor=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let settings = campctl_core::Settings::load_in(cli.config.as_deref(), cli.root.as_deref())?;

    tracing::debug!(root = %settings.root.display(), "Using project root");

    commands::execute(cli.command, settings, cli.json).await
}
