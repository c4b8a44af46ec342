use clap::Parser;

use shoptrend::cli::{Cli, Commands, handle_migrate, handle_run, handle_serve};
use shoptrend::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli.load_settings()?;
    init_logger(&settings.logger)?;

    tracing::info!(
        name = %settings.application.name,
        version = %settings.application.version,
        "Starting"
    );

    match cli.command {
        None | Some(Commands::Serve) => handle_serve(settings).await?,
        Some(Commands::Run { window_days }) => handle_run(settings, window_days).await?,
        Some(Commands::Migrate { dry_run, rollback }) => {
            handle_migrate(&settings, dry_run, rollback).await?
        }
    }

    Ok(())
}
