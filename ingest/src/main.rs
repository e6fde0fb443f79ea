use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(
    about = "Correlate CS2 demo events into rounds, facts and player stats",
    long_about = None
)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// JSON file with engine tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process without storing anything
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Files processed concurrently
    #[arg(long, default_value_t = 4)]
    jobs: usize,

    /// Demo files (.dem) or decoded record streams (.jsonl)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target().contains("ingest") || meta.target().contains("analysis")
        }));
    if let Err(e) = tracing::subscriber::set_global_default(registry) {
        eprintln!("Setting up logging: {:?}", e);
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            tracing::error!("{} file(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<usize, ingest::Error> {
    let config = ingest::config::load(cli.config.as_deref())?;

    let database_url = match (cli.dry_run, cli.database_url) {
        (true, _) => None,
        (false, Some(url)) => Some(Arc::new(url)),
        (false, None) => {
            tracing::error!("'DATABASE_URL' must be set unless running with --dry-run");
            return Ok(cli.files.len());
        }
    };

    if let Some(url) = database_url.as_ref() {
        tracing::info!("Applying Migrations");
        let mut connection = ingest::storage::connect(url).await?;
        ingest::storage::run_migrations(&mut connection).await?;
        tracing::info!("Completed Migrations");
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Cancelling, the rounds in progress are dropped");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let permits = Arc::new(tokio::sync::Semaphore::new(cli.jobs.max(1)));
    let mut tasks = tokio::task::JoinSet::new();

    for path in cli.files {
        let config = config.clone();
        let cancel = cancel.clone();
        let permits = permits.clone();
        let database_url = database_url.clone();

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = match database_url {
                Some(url) => ingest::ingest(&path, config, &url, cancel).await,
                None => ingest::dry_run(&path, config, cancel).await,
            };
            (path, result)
        });
    }

    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        let (path, result) = joined?;
        match result {
            Ok(summary) => {
                tracing::info!(
                    ?path,
                    rounds = summary.rounds,
                    facts = summary.facts,
                    unresolved = summary.unresolved_references,
                    inferred = summary.inferred_closes,
                    finished = summary.match_finished,
                    "Done"
                );
            }
            Err(e) => {
                failed += 1;
                tracing::error!(?path, "Failed: {:?}", e);
            }
        }
    }

    Ok(failed)
}
