mod pipeline;
mod trigger;

use clap::{Parser, Subcommand};
use ingest::FetchMode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trends_core::config::trigger_secret_from_env;
use trends_core::series::{series_report, DEFAULT_WINDOW};
use trends_core::{AppConfig, Category, CoreError, Dataset, ErrorReporter};

use crate::pipeline::{Pipeline, TrendsPipeline};
use crate::trigger::{router, TriggerState};

const DEFAULT_LOG_FILTER: &str = "hiring_trends=info,ingest=info,hn_client=info,publisher=info";

#[derive(Parser)]
#[command(name = "hiring-trends", version, about = "HN hiring thread trends pipeline")]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the dataset and publish it once.
    Generate {
        /// Read thread bodies from the post cache instead of the network.
        #[arg(long)]
        use_cache: bool,
        /// Publish into this directory instead of the configured store.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Serve the trigger endpoint.
    Serve,
    /// Print a category's comment series from a published dataset.
    Series {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        category: Category,
        /// Comma separated terms; empty counts every comment.
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        ErrorReporter::new().report_error(&error);
        return Err(error.into());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            use_cache,
            output_dir,
        } => {
            let store = match output_dir {
                Some(dir) => publisher::store::local_store(&dir)?,
                None => publisher::build_store(&config.storage)?,
            };
            let pipeline =
                TrendsPipeline::from_config(&config, FetchMode::from_use_cache(use_cache), store)?;
            pipeline.run().await
        }
        Command::Serve => serve(&config).await,
        Command::Series {
            input,
            category,
            filter,
            window,
        } => {
            let content = tokio::fs::read_to_string(&input).await?;
            let dataset: Dataset = serde_json::from_str(&content)?;
            let report = series_report(&dataset, category, &filter, window);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

async fn serve(config: &AppConfig) -> Result<(), CoreError> {
    let secret = trigger_secret_from_env()?;
    let store = publisher::build_store(&config.storage)?;
    let pipeline = TrendsPipeline::from_config(config, FetchMode::Network, store)?;
    let app = router(TriggerState::new(Arc::new(pipeline), secret));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "Trigger endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}
