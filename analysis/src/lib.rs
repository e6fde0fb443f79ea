pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod identity;
pub mod input;
pub mod segmenter;
pub mod session;
pub mod sink;
pub mod tables;

#[cfg(feature = "csdemo")]
pub mod demo;

pub use config::EngineConfig;
pub use input::{DecodeError, Record, RecordKind};
pub use session::{Session, SessionError, Summary};
pub use sink::{MemorySink, Sink};
