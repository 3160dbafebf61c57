mod evaluate;
mod snapshots;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chanwatch_db::SqliteStore;
use chanwatch_engine::{EngineSettings, Evaluator};
use chanwatch_giphy::GiphyClient;

#[derive(Debug, Parser)]
#[command(name = "chanwatch-cli")]
#[command(about = "Classify channels as working, shadow banned, or banned")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate one channel and print the verdict
    Evaluate {
        /// Channel username or any channel/item URL
        channel: String,
        /// Print the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Refresh view counts and record today's snapshot for every tracked channel
    Refresh,
    /// Show summed daily views for a tracked channel
    History {
        /// Channel username or any channel/item URL
        channel: String,
        /// Number of days to show, ending today
        #[arg(long, default_value_t = chanwatch_engine::DEFAULT_HISTORY_DAYS)]
        days: u32,
        /// Print the history as JSON
        #[arg(long)]
        json: bool,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

pub(crate) type CliEvaluator = Evaluator<GiphyClient, SqliteStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("nothing to do; run `chanwatch-cli --help` for commands");
        return Ok(());
    };

    let config = chanwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Evaluate { channel, json } => {
            let evaluator = build_evaluator(&config).await?;
            evaluate::run_evaluate(&evaluator, &channel, json).await
        }
        Commands::Refresh => {
            let evaluator = build_evaluator(&config).await?;
            snapshots::run_refresh(&evaluator).await
        }
        Commands::History {
            channel,
            days,
            json,
        } => {
            let store = open_store(&config).await?;
            snapshots::run_history(&store, &channel, days, json).await
        }
        Commands::Db { command } => run_db(&config, &command).await,
    }
}

async fn open_store(config: &chanwatch_core::AppConfig) -> anyhow::Result<SqliteStore> {
    let pool_config = chanwatch_db::PoolConfig::from_app_config(config);
    let pool = chanwatch_db::connect_pool(&config.database_url, pool_config).await?;
    chanwatch_db::run_migrations(&pool).await?;
    Ok(SqliteStore::new(pool))
}

async fn build_evaluator(config: &chanwatch_core::AppConfig) -> anyhow::Result<CliEvaluator> {
    let store = open_store(config).await?;
    let client = GiphyClient::new(&config.source)?;
    Ok(Evaluator::new(
        client,
        store,
        EngineSettings::from_app_config(config),
    ))
}

async fn run_db(config: &chanwatch_core::AppConfig, command: &DbCommands) -> anyhow::Result<()> {
    let pool_config = chanwatch_db::PoolConfig::from_app_config(config);
    let pool = chanwatch_db::connect_pool(&config.database_url, pool_config).await?;
    match command {
        DbCommands::Ping => {
            chanwatch_db::health_check(&pool).await?;
            println!("database reachable at {}", config.database_url);
        }
        DbCommands::Migrate => {
            let applied = chanwatch_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

/// Resolves a username or URL into a channel id.
pub(crate) fn resolve_channel(input: &str) -> anyhow::Result<String> {
    chanwatch_core::parse_channel_ref(input)
        .ok_or_else(|| anyhow::anyhow!("could not read a channel name from '{input}'"))
}

#[cfg(test)]
mod tests;
