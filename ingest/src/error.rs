use std::path::PathBuf;

use analysis::{DecodeError, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading config {path:?}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("opening {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no decoder for {0:?}")]
    UnsupportedInput(PathBuf),
    #[error("connecting to the database")]
    Connection(#[from] diesel::ConnectionError),
    #[error("running migrations: {0}")]
    Migration(String),
    #[error("database")]
    Database(#[from] diesel::result::Error),
    #[error("serializing row data")]
    Serialize(#[from] serde_json::Error),
    #[error("decoding failed after tick {last_tick}")]
    Decode {
        last_tick: u32,
        #[source]
        source: DecodeError,
    },
    #[error("the writer task is gone")]
    WriterClosed,
    #[error("cancelled after tick {0}")]
    Cancelled(u32),
    #[error("joining task")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SessionError<Error>> for Error {
    fn from(value: SessionError<Error>) -> Self {
        match value {
            SessionError::Decode { last_tick, source } => Self::Decode { last_tick, source },
            SessionError::Cancelled { last_tick } => Self::Cancelled(last_tick),
            SessionError::Sink(e) => e,
        }
    }
}

impl From<SessionError<std::convert::Infallible>> for Error {
    fn from(value: SessionError<std::convert::Infallible>) -> Self {
        match value {
            SessionError::Decode { last_tick, source } => Self::Decode { last_tick, source },
            SessionError::Cancelled { last_tick } => Self::Cancelled(last_tick),
            SessionError::Sink(e) => match e {},
        }
    }
}
