//! Persisting batches. The engine runs on a blocking thread and hands every batch
//! over a channel to an async writer that owns the database connection; each
//! batch is written in a single transaction before the engine continues.

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tokio::sync::{mpsc, oneshot};

use common::{DemoFile, MatchBatch, RoundBatch};

use crate::models;
use crate::Error;

const CHUNK_SIZE: usize = 1000;

pub const MIGRATIONS: diesel_async_migrations::EmbeddedMigrations =
    diesel_async_migrations::embed_migrations!("./migrations/");

pub async fn connect(database_url: &str) -> Result<diesel_async::AsyncPgConnection, Error> {
    Ok(diesel_async::AsyncPgConnection::establish(database_url).await?)
}

pub async fn run_migrations(connection: &mut diesel_async::AsyncPgConnection) -> Result<(), Error> {
    MIGRATIONS
        .run_pending_migrations(connection)
        .await
        .map_err(|e| Error::Migration(format!("{:?}", e)))
}

#[derive(Debug)]
pub enum Message {
    Begin(DemoFile),
    Round(RoundBatch),
    Match(MatchBatch),
}

#[derive(Debug)]
pub struct Request {
    pub message: Message,
    pub reply: oneshot::Sender<Result<(), Error>>,
}

/// Sink side of the channel. Must only be used from a blocking thread.
pub struct ChannelSink {
    tx: mpsc::Sender<Request>,
}

pub fn channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<Request>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSink { tx }, rx)
}

impl ChannelSink {
    fn send(&self, message: Message) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(Request { message, reply })
            .map_err(|_| Error::WriterClosed)?;
        rx.blocking_recv().map_err(|_| Error::WriterClosed)?
    }
}

impl analysis::Sink for ChannelSink {
    type Error = Error;

    fn begin(&mut self, demo: &DemoFile) -> Result<(), Self::Error> {
        self.send(Message::Begin(demo.clone()))
    }

    fn write_round(&mut self, batch: RoundBatch) -> Result<(), Self::Error> {
        self.send(Message::Round(batch))
    }

    fn write_match(&mut self, batch: MatchBatch) -> Result<(), Self::Error> {
        self.send(Message::Match(batch))
    }
}

/// Writes every request until the sink side is dropped. A failed write is
/// reported back to the engine, which stops the file.
#[tracing::instrument(skip_all)]
pub async fn run_writer(
    connection: &mut diesel_async::AsyncPgConnection,
    mut rx: mpsc::Receiver<Request>,
) {
    while let Some(request) = rx.recv().await {
        let result = write(connection, request.message).await;
        if let Err(e) = result.as_ref() {
            tracing::error!("Writing batch: {:?}", e);
        }

        if request.reply.send(result).is_err() {
            tracing::warn!("Engine went away before the write completed");
            break;
        }
    }
}

pub async fn write(
    connection: &mut diesel_async::AsyncPgConnection,
    message: Message,
) -> Result<(), Error> {
    match message {
        Message::Begin(demo) => store_demo(connection, &demo).await,
        Message::Round(batch) => store_round(connection, batch).await,
        Message::Match(batch) => store_match(connection, batch).await,
    }
}

async fn store_demo(
    connection: &mut diesel_async::AsyncPgConnection,
    demo: &DemoFile,
) -> Result<(), Error> {
    let row = models::demo_file(demo);

    let query = diesel::dsl::insert_into(crate::schema::demo_files::dsl::demo_files)
        .values(&row)
        .on_conflict(crate::schema::demo_files::dsl::demo_id)
        .do_update()
        .set(&row);
    tracing::trace!(demo = %demo.id, "Store demo file");

    query.execute(connection).await?;
    Ok(())
}

#[tracing::instrument(skip_all, fields(round = ?batch.round.as_ref().map(|r| r.round_number)))]
async fn store_round(
    connection: &mut diesel_async::AsyncPgConnection,
    batch: RoundBatch,
) -> Result<(), Error> {
    let match_row = batch.match_row.as_ref().map(models::match_row).transpose()?;
    let round_row = batch.round.as_ref().map(models::round_row).transpose()?;
    let players = batch
        .players
        .iter()
        .map(models::player_row)
        .collect::<Result<Vec<_>, _>>()?;
    let facts = models::fact_rows(&batch.facts)?;
    let aggregates = models::round_aggregate_rows(&batch)?;

    tracing::debug!(
        players = players.len(),
        facts = facts.len(),
        aggregates = aggregates.len(),
        "Storing round batch"
    );

    connection
        .build_transaction()
        .run::<_, diesel::result::Error, _>(move |conn| {
            Box::pin(async move {
                if let Some(row) = match_row {
                    upsert_match(conn, &row).await?;
                }

                if let Some(row) = round_row {
                    diesel::dsl::insert_into(crate::schema::rounds::dsl::rounds)
                        .values(&row)
                        .on_conflict((
                            crate::schema::rounds::dsl::demo_id,
                            crate::schema::rounds::dsl::round_id,
                        ))
                        .do_update()
                        .set(&row)
                        .execute(conn)
                        .await?;
                }

                upsert_players(conn, &players).await?;

                for chunk in facts.chunks(CHUNK_SIZE) {
                    diesel::dsl::insert_into(crate::schema::facts::dsl::facts)
                        .values(chunk)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }

                for chunk in aggregates.chunks(CHUNK_SIZE) {
                    diesel::dsl::insert_into(crate::schema::round_aggregates::dsl::round_aggregates)
                        .values(chunk)
                        .on_conflict((
                            crate::schema::round_aggregates::dsl::demo_id,
                            crate::schema::round_aggregates::dsl::round_id,
                            crate::schema::round_aggregates::dsl::kind,
                            crate::schema::round_aggregates::dsl::ordinal,
                        ))
                        .do_update()
                        .set((
                            crate::schema::round_aggregates::dsl::player
                                .eq(excluded(crate::schema::round_aggregates::dsl::player)),
                            crate::schema::round_aggregates::dsl::team
                                .eq(excluded(crate::schema::round_aggregates::dsl::team)),
                            crate::schema::round_aggregates::dsl::data
                                .eq(excluded(crate::schema::round_aggregates::dsl::data)),
                        ))
                        .execute(conn)
                        .await?;
                }

                Ok(())
            })
        })
        .await?;

    Ok(())
}

#[tracing::instrument(skip_all, fields(demo = %batch.demo_file.id))]
async fn store_match(
    connection: &mut diesel_async::AsyncPgConnection,
    batch: MatchBatch,
) -> Result<(), Error> {
    let demo_row = models::demo_file(&batch.demo_file);
    let match_row = batch.match_row.as_ref().map(models::match_row).transpose()?;
    let players = batch
        .players
        .iter()
        .map(models::player_row)
        .collect::<Result<Vec<_>, _>>()?;
    let aggregates = models::match_aggregate_rows(&batch)?;

    tracing::debug!(players = players.len(), aggregates = aggregates.len(), "Storing match batch");

    connection
        .build_transaction()
        .run::<_, diesel::result::Error, _>(move |conn| {
            Box::pin(async move {
                diesel::dsl::insert_into(crate::schema::demo_files::dsl::demo_files)
                    .values(&demo_row)
                    .on_conflict(crate::schema::demo_files::dsl::demo_id)
                    .do_update()
                    .set(&demo_row)
                    .execute(conn)
                    .await?;

                if let Some(row) = match_row {
                    upsert_match(conn, &row).await?;
                }

                upsert_players(conn, &players).await?;

                for chunk in aggregates.chunks(CHUNK_SIZE) {
                    diesel::dsl::insert_into(crate::schema::match_aggregates::dsl::match_aggregates)
                        .values(chunk)
                        .on_conflict((
                            crate::schema::match_aggregates::dsl::demo_id,
                            crate::schema::match_aggregates::dsl::match_id,
                            crate::schema::match_aggregates::dsl::kind,
                            crate::schema::match_aggregates::dsl::player,
                        ))
                        .do_update()
                        .set((
                            crate::schema::match_aggregates::dsl::rating
                                .eq(excluded(crate::schema::match_aggregates::dsl::rating)),
                            crate::schema::match_aggregates::dsl::data
                                .eq(excluded(crate::schema::match_aggregates::dsl::data)),
                        ))
                        .execute(conn)
                        .await?;
                }

                Ok(())
            })
        })
        .await?;

    Ok(())
}

async fn upsert_match(
    conn: &mut diesel_async::AsyncPgConnection,
    row: &models::MatchRow,
) -> Result<(), diesel::result::Error> {
    diesel::dsl::insert_into(crate::schema::matches::dsl::matches)
        .values(row)
        .on_conflict((
            crate::schema::matches::dsl::demo_id,
            crate::schema::matches::dsl::match_id,
        ))
        .do_update()
        .set(row)
        .execute(conn)
        .await?;
    Ok(())
}

/// Players are re-sent with every batch that references them; the latest state wins.
async fn upsert_players(
    conn: &mut diesel_async::AsyncPgConnection,
    players: &[models::PlayerRow],
) -> Result<(), diesel::result::Error> {
    use crate::schema::players::dsl;

    for chunk in players.chunks(CHUNK_SIZE) {
        diesel::dsl::insert_into(dsl::players)
            .values(chunk)
            .on_conflict((dsl::demo_id, dsl::player_key))
            .do_update()
            .set((
                dsl::steam_id.eq(excluded(dsl::steam_id)),
                dsl::name.eq(excluded(dsl::name)),
                dsl::team.eq(excluded(dsl::team)),
                dsl::is_connected.eq(excluded(dsl::is_connected)),
                dsl::data.eq(excluded(dsl::data)),
            ))
            .execute(conn)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicBool;

    use analysis::{EngineConfig, Record, RecordKind, Session};
    use common::DemoFileId;
    use pretty_assertions::assert_eq;

    fn demo() -> DemoFile {
        DemoFile {
            id: DemoFileId(uuid::Uuid::from_u128(42)),
            file_name: "channel.jsonl".to_owned(),
            map: None,
            server_name: None,
            source: None,
            tick_rate: 64,
            total_ticks: 0,
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new(0, RecordKind::RoundStart),
            Record::new(10, RecordKind::FreezeEnd),
            Record::new(
                200,
                RecordKind::RoundEnd {
                    winner: Some(common::Team::Terrorist),
                    reason: Some(9),
                    message: None,
                },
            ),
            Record::new(250, RecordKind::RoundOfficiallyEnded),
        ]
    }

    fn label(message: &Message) -> &'static str {
        match message {
            Message::Begin(_) => "begin",
            Message::Round(_) => "round",
            Message::Match(_) => "match",
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn batches_arrive_in_order() {
        let (sink, mut rx) = channel(1);

        let writer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(request) = rx.recv().await {
                seen.push(label(&request.message));
                request.reply.send(Ok(())).unwrap();
            }
            seen
        });

        let summary = tokio::task::spawn_blocking(move || {
            let cancel = AtomicBool::new(false);
            let records = records().into_iter().map(Ok::<_, analysis::DecodeError>);
            Session::new(demo(), EngineConfig::default()).run(records, sink, &cancel)
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(1, summary.rounds);
        assert_eq!(vec!["begin", "round", "match"], writer.await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn write_failures_stop_the_engine() {
        let (sink, mut rx) = channel(1);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let result = match request.message {
                    Message::Round(_) => Err(Error::Migration("rejected".to_owned())),
                    _ => Ok(()),
                };
                request.reply.send(result).unwrap();
            }
        });

        let result = tokio::task::spawn_blocking(move || {
            let cancel = AtomicBool::new(false);
            let records = records().into_iter().map(Ok::<_, analysis::DecodeError>);
            Session::new(demo(), EngineConfig::default()).run(records, sink, &cancel)
        })
        .await
        .unwrap();

        let err = Error::from(result.unwrap_err());
        assert!(matches!(err, Error::Migration(_)), "{:?}", err);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_writer() {
        let (sink, rx) = channel(1);
        drop(rx);

        let result = tokio::task::spawn_blocking(move || {
            let cancel = AtomicBool::new(false);
            let records = records().into_iter().map(Ok::<_, analysis::DecodeError>);
            Session::new(demo(), EngineConfig::default()).run(records, sink, &cancel)
        })
        .await
        .unwrap();

        assert!(matches!(Error::from(result.unwrap_err()), Error::WriterClosed));
    }
}
