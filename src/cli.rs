//! Command line interface and command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{ConfigError, ConfigLoader, Settings};
use crate::db::{MIGRATIONS, establish_async_connection_pool};
use crate::error::{AppError, AppResult};
use crate::indexer::RedisIndexDispatcher;
use crate::jobs::tasks::TrendingAggregationTask;
use crate::jobs::{JobRegistry, JobScheduler};
use crate::trending::store::DieselTrendingStore;
use crate::trending::{RunOptions, run_trending_aggregation};

/// Trending score aggregation service
#[derive(Parser, Debug)]
#[command(name = "shoptrend")]
#[command(about = "Recomputes product and shop trending scores from order history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (single file, skips layered loading)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override environment detection
    #[arg(short, long, value_enum)]
    pub env: Option<EnvironmentArg>,

    /// Raise log output to debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Reduce log output to error level
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the job scheduler and run configured jobs (default)
    Serve,
    /// Run one trending aggregation immediately and print the result
    Run {
        /// Trailing days of order history; overrides the configured default
        #[arg(long, value_name = "DAYS")]
        window_days: Option<i64>,
    },
    /// Apply or roll back database schema migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to roll back
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run")]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EnvironmentArg {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

impl From<EnvironmentArg> for crate::config::Environment {
    fn from(env: EnvironmentArg) -> Self {
        match env {
            EnvironmentArg::Development => crate::config::Environment::Development,
            EnvironmentArg::Test => crate::config::Environment::Test,
            EnvironmentArg::Staging => crate::config::Environment::Staging,
            EnvironmentArg::Production => crate::config::Environment::Production,
        }
    }
}

impl Cli {
    /// Loads settings honoring `--config`, `--env` and the logging flags.
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        if let Some(env) = self.env {
            let env: crate::config::Environment = env.into();
            unsafe {
                std::env::set_var(crate::config::Environment::ENV_VAR, env.as_str());
            }
        }

        let loader = match &self.config {
            Some(path) => ConfigLoader::from_file(path.clone()),
            None => ConfigLoader::new()?,
        };
        let mut settings = loader.load()?;

        if self.verbose {
            settings.logger.level = "debug".to_string();
        } else if self.quiet {
            settings.logger.level = "error".to_string();
        }

        Ok(settings)
    }
}

/// Runs the scheduler until interrupted.
pub async fn handle_serve(settings: Settings) -> AppResult<()> {
    let pool = establish_async_connection_pool(&settings.database).await?;
    let dispatcher = Arc::new(RedisIndexDispatcher::connect(&settings.index).await?);

    let mut registry = JobRegistry::new();
    registry.register::<TrendingAggregationTask>();

    let scheduler = JobScheduler::new(pool, dispatcher, registry).await?;
    scheduler.start(&settings.jobs).await?;

    tracing::info!(
        jobs = settings.jobs.iter().filter(|j| j.enabled).count(),
        "Scheduler started, waiting for shutdown signal"
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

    tracing::info!("Shutdown signal received, stopping scheduler");
    scheduler.stop().await
}

/// Runs one aggregation and prints its result as JSON.
pub async fn handle_run(settings: Settings, window_days: Option<i64>) -> AppResult<()> {
    let pool = establish_async_connection_pool(&settings.database).await?;
    let dispatcher = Arc::new(RedisIndexDispatcher::connect(&settings.index).await?);
    let store = Arc::new(DieselTrendingStore::new(pool));

    let options = RunOptions {
        window_days: window_days.unwrap_or(RunOptions::default().window_days),
        dispatch_queue_capacity: settings.index.queue_capacity,
        ..RunOptions::default()
    };

    let result = run_trending_aggregation(
        store,
        dispatcher,
        &options,
        &tokio_util::sync::CancellationToken::new(),
    )
    .await?;

    let rendered = serde_json::to_string_pretty(&result).map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?;
    println!("{rendered}");

    Ok(())
}

/// Applies, previews, or rolls back migrations.
///
/// Diesel migrations are synchronous, so all of them run on a blocking task
/// with a plain `PgConnection`.
pub async fn handle_migrate(
    settings: &Settings,
    dry_run: bool,
    rollback: Option<u32>,
) -> AppResult<()> {
    if dry_run {
        return show_pending_migrations(settings).await;
    }

    if let Some(steps) = rollback {
        rollback_migrations(settings, steps).await
    } else {
        run_migrations(settings).await
    }
}

async fn show_pending_migrations(settings: &Settings) -> AppResult<()> {
    let database_url = settings.database.url.clone();
    let pending_count: usize = tokio::task::spawn_blocking(move || {
        use diesel::Connection;
        use diesel::pg::PgConnection;
        use diesel_migrations::MigrationHarness;

        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| AppError::data_access("establish connection for migration check", e))?;

        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::data_access("check pending migrations", anyhow::anyhow!(e)))?;

        Ok::<_, AppError>(pending.len())
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })??;

    if pending_count == 0 {
        println!("No pending migrations - database is up to date");
    } else {
        println!("Found {pending_count} pending migration(s)");
        println!("Run without --dry-run to apply them");
    }

    Ok(())
}

async fn run_migrations(settings: &Settings) -> AppResult<()> {
    let database_url = settings.database.url.clone();
    let applied: Vec<String> = tokio::task::spawn_blocking(move || {
        use diesel::Connection;
        use diesel::pg::PgConnection;
        use diesel_migrations::MigrationHarness;

        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| AppError::data_access("establish connection for migrations", e))?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| AppError::data_access("run pending migrations", anyhow::anyhow!(e)))?;

        Ok::<_, AppError>(applied.iter().map(|m| m.to_string()).collect())
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })??;

    if applied.is_empty() {
        println!("No migrations to apply - database is already up to date");
    } else {
        println!("Applied {} migration(s):", applied.len());
        for migration in &applied {
            println!("  - {migration}");
        }
    }

    Ok(())
}

async fn rollback_migrations(settings: &Settings, steps: u32) -> AppResult<()> {
    if steps == 0 {
        return Err(AppError::Validation {
            field: "rollback".to_string(),
            reason: "number of rollback steps must be greater than 0".to_string(),
        });
    }

    let database_url = settings.database.url.clone();
    let reverted: usize = tokio::task::spawn_blocking(move || {
        use diesel::Connection;
        use diesel::pg::PgConnection;
        use diesel_migrations::MigrationHarness;

        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| AppError::data_access("establish connection for rollback", e))?;

        let applied = conn
            .applied_migrations()
            .map_err(|e| AppError::data_access("get applied migrations", anyhow::anyhow!(e)))?;

        if applied.len() < steps as usize {
            return Err(AppError::Validation {
                field: "rollback".to_string(),
                reason: format!(
                    "cannot roll back {} migrations - only {} applied",
                    steps,
                    applied.len()
                ),
            });
        }

        let mut reverted = 0;
        for _ in 0..steps {
            conn.revert_last_migration(MIGRATIONS)
                .map_err(|e| AppError::data_access("revert migration", anyhow::anyhow!(e)))?;
            reverted += 1;
        }

        Ok::<_, AppError>(reverted)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })??;

    println!("Rolled back {reverted} migration(s)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_behavior_has_no_command() {
        let cli = Cli::try_parse_from(["shoptrend"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn run_accepts_window_override() {
        let cli = Cli::try_parse_from(["shoptrend", "run", "--window-days", "30"]).unwrap();
        match cli.command {
            Some(Commands::Run { window_days }) => assert_eq!(window_days, Some(30)),
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn migrate_dry_run_and_rollback_conflict() {
        let result =
            Cli::try_parse_from(["shoptrend", "migrate", "--dry-run", "--rollback", "2"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["shoptrend", "--verbose", "--quiet"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn environment_aliases_parse() {
        let cli = Cli::try_parse_from(["shoptrend", "--env", "prod"]).unwrap();
        assert!(matches!(cli.env, Some(EnvironmentArg::Production)));

        let cli = Cli::try_parse_from(["shoptrend", "--env", "dev"]).unwrap();
        assert!(matches!(cli.env, Some(EnvironmentArg::Development)));
    }
}
