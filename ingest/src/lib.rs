pub mod config;
pub mod input;
pub mod models;
pub mod schema;
pub mod storage;

mod error;
pub use error::Error;

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use analysis::{EngineConfig, MemorySink, Session, Summary};
use common::{DemoFile, DemoFileId};

fn demo_file(input: &input::Input) -> DemoFile {
    DemoFile {
        id: DemoFileId::generate(),
        file_name: input.file_name(),
        map: None,
        server_name: None,
        source: None,
        tick_rate: 0,
        total_ticks: 0,
    }
}

/// Runs one file through the engine and stores it via its own connection.
#[tracing::instrument(skip(config, database_url, cancel))]
pub async fn ingest(
    path: &Path,
    config: EngineConfig,
    database_url: &str,
    cancel: Arc<AtomicBool>,
) -> Result<Summary, Error> {
    let input = input::Input::open(path)?;
    let demo = demo_file(&input);
    tracing::info!(demo = %demo.id, format = ?input.format, "Processing");

    let mut connection = storage::connect(database_url).await?;
    let (sink, rx) = storage::channel(4);

    let engine = tokio::task::spawn_blocking(move || {
        Session::new(demo, config)
            .run(input.records(), sink, &cancel)
            .map_err(Error::from)
    });

    storage::run_writer(&mut connection, rx).await;
    engine.await?
}

/// Runs one file through the engine without storing anything.
#[tracing::instrument(skip(config, cancel))]
pub async fn dry_run(
    path: &Path,
    config: EngineConfig,
    cancel: Arc<AtomicBool>,
) -> Result<Summary, Error> {
    let input = input::Input::open(path)?;
    let demo = demo_file(&input);

    tokio::task::spawn_blocking(move || {
        let mut sink = MemorySink::new();
        let summary = Session::new(demo, config)
            .run(input.records(), &mut sink, &cancel)
            .map_err(Error::from)?;

        tracing::debug!(
            round_batches = sink.rounds.len(),
            match_batches = sink.matches.len(),
            "Dry run done"
        );
        Ok(summary)
    })
    .await?
}
