//! Where finalized batches go.

use common::{DemoFile, MatchBatch, RoundBatch};

/// Receives batches in parent-before-child order. Every call is a storage
/// transaction boundary; the session never retries.
pub trait Sink {
    type Error;

    fn begin(&mut self, demo: &DemoFile) -> Result<(), Self::Error>;

    fn write_round(&mut self, batch: RoundBatch) -> Result<(), Self::Error>;

    fn write_match(&mut self, batch: MatchBatch) -> Result<(), Self::Error>;
}

impl<S> Sink for &mut S
where
    S: Sink + ?Sized,
{
    type Error = S::Error;

    fn begin(&mut self, demo: &DemoFile) -> Result<(), Self::Error> {
        (**self).begin(demo)
    }

    fn write_round(&mut self, batch: RoundBatch) -> Result<(), Self::Error> {
        (**self).write_round(batch)
    }

    fn write_match(&mut self, batch: MatchBatch) -> Result<(), Self::Error> {
        (**self).write_match(batch)
    }
}

/// Keeps everything in memory, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub demo: Option<DemoFile>,
    pub rounds: Vec<RoundBatch>,
    pub matches: Vec<MatchBatch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches that carry a round, in flush order.
    pub fn round_rows(&self) -> impl Iterator<Item = &common::Round> + '_ {
        self.rounds.iter().filter_map(|b| b.round.as_ref())
    }

    pub fn kills(&self) -> impl Iterator<Item = &common::Kill> + '_ {
        self.rounds.iter().flat_map(|b| b.facts.kills.iter())
    }
}

impl Sink for MemorySink {
    type Error = std::convert::Infallible;

    fn begin(&mut self, demo: &DemoFile) -> Result<(), Self::Error> {
        self.demo = Some(demo.clone());
        Ok(())
    }

    fn write_round(&mut self, batch: RoundBatch) -> Result<(), Self::Error> {
        self.rounds.push(batch);
        Ok(())
    }

    fn write_match(&mut self, batch: MatchBatch) -> Result<(), Self::Error> {
        self.matches.push(batch);
        Ok(())
    }
}
