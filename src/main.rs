use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cofollow::graph::twitter::TwitterClient;
use cofollow::{checkpoint, Config, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cofollow")]
#[command(about = "Rank the accounts a seed account's followers co-follow", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the seed's followers, checkpoint the tally and write the report
    Run {
        /// Seed handle, overriding crawl.seed_handle
        #[arg(short, long)]
        seed: Option<String>,
    },
    /// Score a checkpointed tally and write the report
    Score {
        /// Checkpoint written by a previous run
        #[arg(long)]
        checkpoint: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cofollow=debug" } else { "cofollow=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let client = TwitterClient::new(&config.api, config.credentials.clone())
        .context("Failed to build API client")?;
    let pipeline = Pipeline::new(&client, &config);

    match cli.command {
        Command::Run { seed } => {
            let seed = seed
                .or_else(|| config.crawl.seed_handle.clone())
                .context("No seed handle: pass --seed or set crawl.seed_handle")?;

            let report = pipeline
                .run(&seed)
                .await
                .with_context(|| format!("Run for {} failed", seed))?;

            for failure in &report.crawl.outcome.failures {
                tracing::debug!(error = %failure, "seed failure");
            }
            tracing::info!(
                sampled = report.crawl.sampled,
                contributors = report.crawl.outcome.tally.contributors(),
                failed_seeds = report.crawl.outcome.failures.len(),
                rows = report.rows_written,
                report = %config.output.report_path.display(),
                "run complete"
            );
        }
        Command::Score { checkpoint: path } => {
            let tally = checkpoint::load(&path)
                .with_context(|| format!("Failed to load checkpoint {}", path.display()))?;

            let score = pipeline.rescore(&tally).await.context("Scoring failed")?;
            tracing::info!(
                rows = score.outcome.scored.len(),
                skipped = score.outcome.skipped,
                report = %config.output.report_path.display(),
                "scoring complete"
            );
        }
    }

    Ok(())
}
