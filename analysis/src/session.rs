//! One demo file from the first record to the last, threading all per-file state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{DemoFile, FactContext, Facts, MatchBatch, Round, RoundBatch, RoundType, Team};

use crate::aggregate::{
    self, EconomyInput, Holdings, MatchAccumulator, Streak, ROUND_END, ROUND_START,
};
use crate::classifier::{self, RoundTracker};
use crate::config::EngineConfig;
use crate::identity::{Connect, PawnDelta, Resolver};
use crate::input::{DecodeError, Record, RecordKind};
use crate::segmenter::{ClosedRound, IllegalTransition, Segmenter};
use crate::sink::Sink;
use crate::tables;

/// What happened while processing a file, warnings included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub rounds: u32,
    pub competitive_rounds: u32,
    pub facts: u64,
    pub unresolved_references: u64,
    pub inferred_closes: u32,
    pub illegal_transitions: u32,
    pub partial_aggregates: u32,
    pub last_tick: u32,
    pub match_finished: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E> {
    #[error("decoding failed after tick {last_tick}")]
    Decode {
        last_tick: u32,
        #[source]
        source: DecodeError,
    },
    #[error("cancelled after tick {last_tick}")]
    Cancelled { last_tick: u32 },
    #[error("writing to the sink: {0}")]
    Sink(E),
}

pub struct Session {
    demo: DemoFile,
    config: EngineConfig,
    resolver: Resolver,
    segmenter: Segmenter,
    tracker: Option<RoundTracker>,
    orphans: Facts,
    accumulator: MatchAccumulator,
    streaks: HashMap<Team, Streak>,
    sides_swapped: Option<bool>,
    summary: Summary,
    seq: u64,
    begun: bool,
    match_written: bool,
}

impl Session {
    pub fn new(mut demo: DemoFile, config: EngineConfig) -> Self {
        if demo.tick_rate == 0 {
            demo.tick_rate = config.default_tick_rate.max(1);
        }

        Self {
            resolver: Resolver::new(demo.id),
            segmenter: Segmenter::new(demo.id, config.rounds.clone()),
            demo,
            config,
            tracker: None,
            orphans: Facts::default(),
            accumulator: MatchAccumulator::new(),
            streaks: HashMap::new(),
            sides_swapped: None,
            summary: Summary::default(),
            seq: 0,
            begun: false,
            match_written: false,
        }
    }

    /// Consumes the records in order and hands every finalized batch to `sink`.
    ///
    /// `cancel` is polled before every record; a cancelled run drops the round in
    /// progress without writing it.
    #[tracing::instrument(skip_all, fields(demo = %self.demo.id, file = %self.demo.file_name))]
    pub fn run<I, S>(
        mut self,
        records: I,
        mut sink: S,
        cancel: &AtomicBool,
    ) -> Result<Summary, SessionError<S::Error>>
    where
        I: IntoIterator<Item = Result<Record, DecodeError>>,
        S: Sink,
    {
        for record in records {
            if cancel.load(Ordering::Relaxed) {
                let last_tick = self.summary.last_tick;
                if let Some(tracker) = self.tracker.take() {
                    tracing::warn!(
                        round = ?tracker.round,
                        facts = tracker.facts.len(),
                        "Discarding round in progress"
                    );
                }
                self.segmenter.discard_open();
                return Err(SessionError::Cancelled { last_tick });
            }

            let record = match record {
                Ok(r) => r,
                Err(source) => {
                    let last_tick = self.summary.last_tick;
                    tracing::error!(last_tick, %source, "Decoding failed");
                    return Err(SessionError::Decode { last_tick, source });
                }
            };

            self.handle(record, &mut sink)?;
        }

        self.finish(&mut sink)
    }

    fn tick_rate(&self) -> u32 {
        self.demo.tick_rate.max(1)
    }

    fn handle<S: Sink>(
        &mut self,
        record: Record,
        sink: &mut S,
    ) -> Result<(), SessionError<S::Error>> {
        let tick = record.tick;
        let game_time = record
            .game_time
            .unwrap_or_else(|| tick as f32 / self.tick_rate() as f32);
        self.summary.last_tick = self.summary.last_tick.max(tick);

        tracing::trace!(tick, kind = ?record.kind, "Record");

        match &record.kind {
            RecordKind::Header {
                map,
                tick_rate,
                server_name,
                source,
                max_rounds,
            } => {
                if map.is_some() {
                    self.demo.map = map.clone();
                    self.segmenter.set_map(map.clone());
                }
                if let Some(rate) = tick_rate.filter(|r| *r > 0) {
                    self.demo.tick_rate = rate;
                }
                if server_name.is_some() {
                    self.demo.server_name = server_name.clone();
                }
                if source.is_some() {
                    self.demo.source = source.clone();
                }
                if let Some(max) = max_rounds.filter(|m| *m > 0) {
                    self.segmenter.set_max_rounds(max);
                    self.config.rounds.max_rounds = max;
                }
            }

            RecordKind::PlayerConnect {
                slot,
                user_id,
                steam_id,
                name,
                is_bot,
                is_hltv,
            } => {
                self.resolver.connect(
                    Connect {
                        slot: *slot,
                        user_id: *user_id,
                        steam_id: *steam_id,
                        name: name.clone(),
                        is_bot: *is_bot,
                        is_hltv: *is_hltv,
                    },
                    tick,
                );
            }
            RecordKind::PlayerInfo { slot, steam_id, name } => {
                if self.resolver.update_info(*slot, *steam_id, name.clone(), tick).is_none() {
                    tracing::warn!(slot = slot.0, tick, "Player info for unknown slot");
                }
            }
            RecordKind::PlayerDisconnect { slot, reason } => {
                if let Some(key) = self.resolver.disconnect(*slot, reason.clone(), tick) {
                    if let Some(tracker) = self.tracker.as_mut() {
                        tracker.leave(key, tick);
                    }
                }
            }
            RecordKind::PlayerTeam { slot, team } => {
                if self.resolver.set_team(*slot, *team).is_none() {
                    tracing::warn!(slot = slot.0, tick, "Team change for unknown slot");
                }
            }
            RecordKind::PlayerName { slot, name } => {
                self.resolver.rename(*slot, name.clone());
            }
            RecordKind::PlayerSpawn { slot, pawn } => {
                if let Some(pawn) = pawn {
                    self.resolver.assign_pawn(*slot, *pawn);
                }
                let spawned = self
                    .resolver
                    .resolve_slot(*slot)
                    .and_then(|key| self.resolver.team_of(key).map(|team| (key, team)));
                match (spawned, self.tracker.as_mut()) {
                    (Some((key, team)), Some(tracker)) => tracker.spawn(key, team),
                    (None, _) => tracing::warn!(slot = slot.0, tick, "Spawn of unknown slot"),
                    _ => {}
                }
            }
            RecordKind::PlayerSnapshot {
                pawn,
                money,
                equipment_value,
                health,
                armor,
                has_helmet,
                has_defuser,
                position,
            } => {
                let delta = PawnDelta {
                    money: *money,
                    equipment_value: *equipment_value,
                    health: *health,
                    armor: *armor,
                    has_helmet: *has_helmet,
                    has_defuser: *has_defuser,
                    position: *position,
                };
                if self.resolver.apply_snapshot(*pawn, delta).is_none() {
                    tracing::trace!(pawn = pawn.0, "Snapshot of unknown pawn");
                }
            }

            RecordKind::WarmupStart => {
                let result = self.segmenter.warmup_start();
                self.transition(result);
            }
            RecordKind::WarmupEnd => {
                let result = self.segmenter.warmup_end();
                self.transition(result);
            }
            RecordKind::MatchStart => match self.segmenter.match_start() {
                Ok(true) => {
                    tracing::info!(tick, "Match start");
                    self.streaks.clear();
                    self.sides_swapped = None;
                }
                Ok(false) => {
                    tracing::warn!(
                        tick,
                        rounds = self.segmenter.competitive_rounds(),
                        "Match start after competitive rounds, ignored"
                    );
                }
                Err(e) => self.transition(Err(e)),
            },
            RecordKind::RoundStart => {
                if let Some(open) = self.segmenter.open_round() {
                    if !open.has_ended() {
                        tracing::warn!(
                            round = ?open.id,
                            tick,
                            "Round start without round end, closing"
                        );
                        self.segmenter.close_inferred(tick.saturating_sub(1));
                        self.summary.inferred_closes += 1;
                    }
                    self.finalize_round(sink)?;
                }

                let opened = self
                    .segmenter
                    .round_start(tick)
                    .map(|open| (open.id, open.expected_number, open.is_warmup, open.is_pistol));
                match opened {
                    Ok((id, expected_number, is_warmup, is_pistol)) => {
                        self.tracker = Some(RoundTracker::open(id, tick, &self.resolver));

                        if !is_warmup {
                            let swapped = self.segmenter.sides_swapped(expected_number);
                            if is_pistol || self.sides_swapped != Some(swapped) {
                                self.streaks.clear();
                            }
                            self.sides_swapped = Some(swapped);
                        }
                    }
                    Err(e) => self.transition(Err(e)),
                }
            }
            RecordKind::FreezeEnd => match self.segmenter.freeze_end(tick) {
                Ok(()) => {
                    if let Some(tracker) = self.tracker.as_mut() {
                        tracker.freeze_end(tick, game_time);
                    }
                    self.capture_economy(tick, ROUND_START);
                }
                Err(e) => self.transition(Err(e)),
            },
            RecordKind::RoundEnd { winner, reason, message } => {
                let reason = reason.and_then(|code| {
                    let parsed = tables::round_end_reason(code);
                    if parsed.is_none() {
                        tracing::warn!(code, ?message, "Unknown round end reason");
                    }
                    parsed
                });

                match self.segmenter.round_end(tick, *winner, reason) {
                    Ok(()) => {
                        if self
                            .tracker
                            .as_ref()
                            .map(|t| t.round_types.is_empty())
                            .unwrap_or(false)
                        {
                            self.capture_economy(tick, ROUND_START);
                        }
                        self.capture_economy(tick, ROUND_END);
                        if let Some(tracker) = self.tracker.as_mut() {
                            tracker.ended = true;
                        }
                    }
                    Err(e) => self.transition(Err(e)),
                }
            }
            RecordKind::RoundOfficiallyEnded => match self.segmenter.round_officially_ended() {
                Ok(()) => self.finalize_round(sink)?,
                Err(e) => self.transition(Err(e)),
            },
            RecordKind::MatchEnd => {
                if let Some(open) = self.segmenter.open_round() {
                    if !open.has_ended() {
                        tracing::warn!(round = ?open.id, tick, "Match end inside a round, closing");
                        self.segmenter.close_inferred(tick);
                        self.summary.inferred_closes += 1;
                    }
                    self.finalize_round(sink)?;
                }

                match self.segmenter.match_end(tick) {
                    Ok(()) => {
                        tracing::info!(tick, "Match end");
                        self.write_match(sink)?;
                    }
                    Err(e) => self.transition(Err(e)),
                }
            }

            kind => {
                let ctx = FactContext {
                    demo_file: self.demo.id,
                    match_id: self.segmenter.match_id(),
                    round: self.tracker.as_ref().map(|t| t.round),
                    seq: self.seq,
                    tick,
                    game_time,
                    unresolved: false,
                };

                let fact = classifier::classify(
                    kind,
                    ctx,
                    &self.resolver,
                    &self.config,
                    self.tracker.as_mut(),
                );
                if let Some(fact) = fact {
                    self.seq += 1;
                    if fact.context().unresolved {
                        self.summary.unresolved_references += 1;
                        tracing::warn!(
                            tick,
                            seq = fact.context().seq,
                            "Unresolved player reference"
                        );
                    }

                    match self.tracker.as_mut() {
                        Some(tracker) => fact.store(&mut tracker.facts),
                        None => fact.store(&mut self.orphans),
                    }
                }
            }
        }

        Ok(())
    }

    fn transition(&mut self, result: Result<(), IllegalTransition>) {
        if let Err(e) = result {
            self.summary.illegal_transitions += 1;
            tracing::warn!(
                phase = ?e.phase,
                event = ?e.event,
                tick = self.summary.last_tick,
                "{}",
                e
            );
        }
    }

    /// Economy state of both teams, taken from the latest pawn snapshots.
    fn capture_economy(&mut self, tick: u32, phase: &'static str) {
        let (Some(tracker), Some(open)) = (self.tracker.as_mut(), self.segmenter.open_round())
        else {
            return;
        };

        let input = EconomyInput {
            demo_file: self.demo.id,
            round: tracker.round,
            tick,
            phase,
            is_warmup: open.is_warmup,
            is_pistol: open.is_pistol,
        };

        let mut states = Vec::with_capacity(2);
        for team in [Team::Terrorist, Team::CounterTerrorist] {
            let members: Vec<_> = tracker
                .participants
                .iter()
                .filter(|(_, t)| **t == team)
                .map(|(key, _)| *key)
                .collect();

            let holdings: Vec<Holdings> = members
                .iter()
                .map(|key| {
                    let state = self.resolver.pawn_state(*key)?;
                    Some((state.money?, state.equipment_value.unwrap_or(0)))
                })
                .collect();

            if phase == ROUND_START {
                for (key, holding) in members.iter().zip(holdings.iter()) {
                    if let Some(holding) = holding {
                        tracker.start_economy.insert(*key, *holding);
                    }
                }
            }

            let streak = self.streaks.get(&team).copied().unwrap_or_default();
            states.push(aggregate::economy_state(
                &input,
                team,
                &holdings,
                streak,
                &self.config.economy,
            ));
        }
        aggregate::settle_anti_eco(&mut states);

        if phase == ROUND_START {
            for state in states.iter() {
                tracker.round_types.insert(state.team, state.round_type);
            }
        }

        tracing::debug!(round = ?tracker.round, phase, "Economy captured");
        tracker.economy_states.extend(states);
    }

    fn ensure_begun<S: Sink>(&mut self, sink: &mut S) -> Result<(), SessionError<S::Error>> {
        if !self.begun {
            sink.begin(&self.demo).map_err(SessionError::Sink)?;
            self.begun = true;
        }
        Ok(())
    }

    fn flush_orphans<S: Sink>(&mut self, sink: &mut S) -> Result<(), SessionError<S::Error>> {
        if self.orphans.is_empty() {
            return Ok(());
        }

        let facts = std::mem::take(&mut self.orphans);
        tracing::debug!(facts = facts.len(), "Flushing facts outside of rounds");
        self.summary.facts += facts.len() as u64;

        let batch = RoundBatch {
            demo_file: self.demo.id,
            match_row: self.segmenter.match_row().cloned(),
            round: None,
            players: self.resolver.players().to_vec(),
            facts,
            economy_states: Vec::new(),
            grenade_trajectories: Vec::new(),
            player_round_stats: Vec::new(),
            round_impacts: Vec::new(),
        };

        self.ensure_begun(sink)?;
        sink.write_round(batch).map_err(SessionError::Sink)
    }

    /// Aggregates the open round and writes it out.
    fn finalize_round<S: Sink>(&mut self, sink: &mut S) -> Result<(), SessionError<S::Error>> {
        let Some(open) = self.segmenter.open_round() else {
            return Ok(());
        };
        let end_tick = open.end_tick.unwrap_or(self.summary.last_tick);
        let is_warmup = open.is_warmup;

        if let Some(tracker) = self.tracker.as_ref() {
            let has_start = !tracker.round_types.is_empty();
            let has_end = tracker.economy_states.iter().any(|s| s.phase == ROUND_END);
            if !has_start {
                self.capture_economy(end_tick, ROUND_START);
            }
            if !has_end {
                self.capture_economy(end_tick, ROUND_END);
            }
        }

        let is_knife = !is_warmup
            && self.segmenter.competitive_rounds() == 0
            && self
                .tracker
                .as_ref()
                .map(|t| t.is_knife_only(self.config.knife.min_knife_events))
                .unwrap_or(false);

        let Some(closed) = self.segmenter.finalize(is_knife) else {
            return Ok(());
        };
        let mut tracker = match self.tracker.take() {
            Some(tracker) => tracker,
            None => RoundTracker::open(closed.round.id, closed.round.start_tick, &self.resolver),
        };
        tracker.ended = true;
        if closed.is_knife {
            // Opened as the first competitive round, so the economy read as a pistol
            for round_type in tracker.round_types.values_mut() {
                *round_type = RoundType::Knife;
            }
            for state in tracker.economy_states.iter_mut() {
                state.round_type = RoundType::Knife;
                state.is_anti_eco = false;
            }
        }

        let round = self.round_row(&closed, &tracker);
        let _span =
            tracing::debug_span!("round", id = round.id.0, number = round.round_number).entered();

        let (stats, impacts) = if round.is_competitive() {
            let stats = aggregate::player_round_stats(
                &round,
                &tracker,
                &self.resolver,
                &self.config.rating,
            );
            let impacts = aggregate::round_impacts(&round, &stats, &tracker.facts);
            (stats, impacts)
        } else {
            (Vec::new(), Vec::new())
        };

        self.accumulator.add_round(&round, &stats, &impacts);

        if round.is_competitive() {
            self.summary.competitive_rounds += 1;
            if let Some(winner) = round.winner {
                for team in [Team::Terrorist, Team::CounterTerrorist] {
                    self.streaks.entry(team).or_default().record(team == winner);
                }
            }
        }

        let partial = stats.iter().filter(|s| s.partial).count()
            + tracker.economy_states.iter().filter(|s| s.partial).count();
        if partial > 0 {
            tracing::warn!(partial, "Aggregates computed from incomplete data");
        }
        self.summary.partial_aggregates += partial as u32;

        self.flush_orphans(sink)?;

        let grenade_trajectories = tracker.take_trajectories();
        let facts = std::mem::take(&mut tracker.facts);
        self.summary.rounds += 1;
        self.summary.facts += facts.len() as u64;

        tracing::info!(
            winner = ?round.winner,
            reason = ?round.end_reason,
            ct_score = round.ct_score,
            t_score = round.t_score,
            facts = facts.len(),
            "Round finalized"
        );

        let batch = RoundBatch {
            demo_file: self.demo.id,
            match_row: self.segmenter.match_row().cloned(),
            round: Some(round),
            players: self.resolver.players().to_vec(),
            facts,
            economy_states: std::mem::take(&mut tracker.economy_states),
            grenade_trajectories,
            player_round_stats: stats,
            round_impacts: impacts,
        };

        self.ensure_begun(sink)?;
        sink.write_round(batch).map_err(SessionError::Sink)
    }

    fn round_row(&self, closed: &ClosedRound, tracker: &RoundTracker) -> Round {
        let start_state = |team: Team| {
            tracker
                .economy_states
                .iter()
                .find(|s| s.phase == ROUND_START && s.team == team)
        };
        let ct = start_state(Team::CounterTerrorist);
        let t = start_state(Team::Terrorist);
        let ct_round_type = tracker.round_types.get(&Team::CounterTerrorist).copied();
        let t_round_type = tracker.round_types.get(&Team::Terrorist).copied();
        let any_type = |wanted: RoundType| {
            ct_round_type == Some(wanted) || t_round_type == Some(wanted)
        };
        let competitive = closed.round_number > 0;

        Round {
            id: closed.round.id,
            match_id: closed.match_id,
            demo_file: self.demo.id,
            round_number: closed.round_number,
            start_tick: closed.round.start_tick,
            freeze_end_tick: closed.round.freeze_end_tick,
            end_tick: closed.round.end_tick,
            winner: closed.round.winner,
            end_reason: closed.round.end_reason.clone(),
            ct_score: closed.ct_score,
            t_score: closed.t_score,
            ct_live_players: tracker
                .live_at_start
                .get(&Team::CounterTerrorist)
                .copied()
                .unwrap_or(0),
            t_live_players: tracker.live_at_start.get(&Team::Terrorist).copied().unwrap_or(0),
            ct_start_money: ct.map(|s| s.total_money).unwrap_or(0),
            t_start_money: t.map(|s| s.total_money).unwrap_or(0),
            ct_equipment_value: ct.map(|s| s.total_equipment_value).unwrap_or(0),
            t_equipment_value: t.map(|s| s.total_equipment_value).unwrap_or(0),
            ct_round_type,
            t_round_type,
            bomb_planted: tracker.bomb_planted,
            bomb_defused: tracker.bomb_defused,
            bomb_exploded: tracker.bomb_exploded,
            bomb_site: tracker.bomb_site.clone(),
            is_warmup: closed.round.is_warmup,
            is_knife: closed.is_knife,
            is_pistol: competitive && closed.round.is_pistol,
            is_overtime: competitive && closed.round.is_overtime,
            is_eco_round: any_type(RoundType::Eco),
            is_force_buy_round: any_type(RoundType::Force),
            is_anti_eco_round: ct.map(|s| s.is_anti_eco).unwrap_or(false)
                || t.map(|s| s.is_anti_eco).unwrap_or(false),
            inferred: closed.round.inferred,
        }
    }

    fn write_match<S: Sink>(&mut self, sink: &mut S) -> Result<(), SessionError<S::Error>> {
        if self.match_written {
            return Ok(());
        }
        self.flush_orphans(sink)?;

        self.demo.total_ticks = self.summary.last_tick;
        let match_row = self.segmenter.match_row().cloned();
        let (player_match_stats, advanced_player_stats) = match match_row.as_ref() {
            Some(m) => self.accumulator.finish(self.demo.id, m.id, &self.config.rating),
            None => (Vec::new(), Vec::new()),
        };

        tracing::info!(
            players = player_match_stats.len(),
            finished = match_row.as_ref().map(|m| m.is_finished).unwrap_or(false),
            "Writing match"
        );

        let batch = MatchBatch {
            demo_file: self.demo.clone(),
            match_row,
            players: self.resolver.players().to_vec(),
            player_match_stats,
            advanced_player_stats,
        };

        self.ensure_begun(sink)?;
        sink.write_match(batch).map_err(SessionError::Sink)?;
        self.match_written = true;
        Ok(())
    }

    fn finish<S: Sink>(mut self, sink: &mut S) -> Result<Summary, SessionError<S::Error>> {
        if let Some(open) = self.segmenter.open_round() {
            if !open.has_ended() {
                tracing::warn!(
                    round = ?open.id,
                    last_tick = self.summary.last_tick,
                    "Stream ended inside a round"
                );
                self.segmenter.close_incomplete(self.summary.last_tick);
            }
            self.finalize_round(sink)?;
        }

        self.write_match(sink)?;
        self.flush_orphans(sink)?;

        self.summary.match_finished = self
            .segmenter
            .match_row()
            .map(|m| m.is_finished)
            .unwrap_or(false);
        tracing::info!(
            rounds = self.summary.rounds,
            facts = self.summary.facts,
            unresolved = self.summary.unresolved_references,
            illegal = self.summary.illegal_transitions,
            explicit_end = self.segmenter.match_ended(),
            "Demo processed"
        );

        Ok(self.summary)
    }
}
