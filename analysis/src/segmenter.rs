//! Phase state machine turning phase records into rounds.

use common::{DemoFileId, Match, MatchId, RoundEndReason, RoundId, Team};

use crate::config::RoundRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Warmup,
    Freezetime,
    Live,
    RoundEnd,
    MatchEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    WarmupStart,
    WarmupEnd,
    MatchStart,
    RoundStart,
    FreezeEnd,
    RoundEnd,
    RoundOfficiallyEnded,
    MatchEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition: {event:?} while in {phase:?}")]
pub struct IllegalTransition {
    pub phase: Phase,
    pub event: PhaseEvent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenRound {
    pub id: RoundId,
    pub start_tick: u32,
    pub freeze_end_tick: Option<u32>,
    pub end_tick: Option<u32>,
    pub winner: Option<Team>,
    pub end_reason: Option<RoundEndReason>,
    pub is_warmup: bool,
    /// Number this round gets if it turns out to be competitive.
    pub expected_number: u32,
    pub is_pistol: bool,
    pub is_overtime: bool,
    pub inferred: bool,
}

impl OpenRound {
    pub fn has_ended(&self) -> bool {
        self.end_tick.is_some()
    }
}

/// A round taken out of the segmenter, scores applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedRound {
    pub round: OpenRound,
    pub match_id: MatchId,
    pub round_number: u32,
    pub is_knife: bool,
    pub ct_score: u32,
    pub t_score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Score {
    start_ct: u32,
    start_t: u32,
}

pub struct Segmenter {
    rules: RoundRules,
    demo_file: DemoFileId,
    phase: Phase,
    warmup: bool,
    match_ended: bool,
    next_round_id: u32,
    open: Option<OpenRound>,
    competitive_rounds: u32,
    score: Score,
    first_half: Score,
    second_half: Score,
    overtime: Score,
    map: Option<String>,
    match_row: Option<Match>,
}

impl Segmenter {
    pub fn new(demo_file: DemoFileId, rules: RoundRules) -> Self {
        Self {
            rules,
            demo_file,
            phase: Phase::Warmup,
            warmup: false,
            match_ended: false,
            next_round_id: 0,
            open: None,
            competitive_rounds: 0,
            score: Score::default(),
            first_half: Score::default(),
            second_half: Score::default(),
            overtime: Score::default(),
            map: None,
            match_row: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// An explicit match end was seen.
    pub fn match_ended(&self) -> bool {
        self.match_ended
    }

    pub fn open_round(&self) -> Option<&OpenRound> {
        self.open.as_ref()
    }

    pub fn match_row(&self) -> Option<&Match> {
        self.match_row.as_ref()
    }

    pub fn match_id(&self) -> Option<MatchId> {
        self.match_row.as_ref().map(|m| m.id)
    }

    pub fn competitive_rounds(&self) -> u32 {
        self.competitive_rounds
    }

    pub fn set_map(&mut self, map: Option<String>) {
        if let Some(m) = self.match_row.as_mut() {
            m.map = map.clone();
        }
        self.map = map;
    }

    pub fn set_max_rounds(&mut self, max_rounds: u32) {
        self.rules.max_rounds = max_rounds;
        if let Some(m) = self.match_row.as_mut() {
            m.max_rounds = max_rounds;
        }
    }

    fn illegal(&self, event: PhaseEvent) -> IllegalTransition {
        IllegalTransition {
            phase: self.phase,
            event,
        }
    }

    pub fn warmup_start(&mut self) -> Result<(), IllegalTransition> {
        if matches!(self.phase, Phase::MatchEnd | Phase::Live) {
            return Err(self.illegal(PhaseEvent::WarmupStart));
        }
        self.warmup = true;
        self.phase = Phase::Warmup;
        Ok(())
    }

    pub fn warmup_end(&mut self) -> Result<(), IllegalTransition> {
        if self.phase == Phase::MatchEnd {
            return Err(self.illegal(PhaseEvent::WarmupEnd));
        }
        self.warmup = false;
        Ok(())
    }

    /// The first live round is announced. Resets scores unless competitive rounds
    /// were already committed.
    pub fn match_start(&mut self) -> Result<bool, IllegalTransition> {
        if self.phase == Phase::MatchEnd {
            return Err(self.illegal(PhaseEvent::MatchStart));
        }
        self.warmup = false;

        if self.competitive_rounds > 0 {
            return Ok(false);
        }

        self.score = Score::default();
        self.first_half = Score::default();
        self.second_half = Score::default();
        self.overtime = Score::default();
        if let Some(open) = self.open.as_mut() {
            open.is_warmup = false;
            open.expected_number = 1;
            open.is_pistol = true;
            open.is_overtime = false;
        }
        Ok(true)
    }

    /// Opens a new round. Any previous round must have been finalized.
    pub fn round_start(&mut self, tick: u32) -> Result<&OpenRound, IllegalTransition> {
        if self.phase == Phase::MatchEnd || self.open.is_some() {
            return Err(self.illegal(PhaseEvent::RoundStart));
        }

        if let Some(m) = self.match_row.as_mut().filter(|m| m.is_finished) {
            tracing::warn!(
                match_id = ?m.id,
                "Round started after the score decided the match, reopening"
            );
            m.is_finished = false;
            m.winner = None;
            m.win_condition = None;
        }

        let match_id = self.ensure_match(tick);
        let id = RoundId(self.next_round_id);
        self.next_round_id += 1;

        let expected_number = self.competitive_rounds + 1;
        let is_warmup = self.warmup;
        let round = OpenRound {
            id,
            start_tick: tick,
            freeze_end_tick: None,
            end_tick: None,
            winner: None,
            end_reason: None,
            is_warmup,
            expected_number,
            is_pistol: !is_warmup && self.is_pistol_number(expected_number),
            is_overtime: !is_warmup && expected_number > self.rules.max_rounds,
            inferred: false,
        };

        tracing::debug!(?match_id, ?id, expected_number, is_warmup, "Round start");

        self.phase = Phase::Freezetime;
        Ok(self.open.insert(round))
    }

    pub fn freeze_end(&mut self, tick: u32) -> Result<(), IllegalTransition> {
        match (self.phase, self.open.as_mut()) {
            (Phase::Freezetime, Some(open)) => {
                open.freeze_end_tick = Some(tick);
                self.phase = Phase::Live;
                Ok(())
            }
            _ => Err(self.illegal(PhaseEvent::FreezeEnd)),
        }
    }

    pub fn round_end(
        &mut self,
        tick: u32,
        winner: Option<Team>,
        reason: Option<RoundEndReason>,
    ) -> Result<(), IllegalTransition> {
        match (self.phase, self.open.as_mut()) {
            (Phase::Freezetime | Phase::Live, Some(open)) => {
                open.end_tick = Some(tick);
                open.winner = winner
                    .filter(|w| w.is_playing())
                    .or_else(|| reason.as_ref().and_then(|r| r.implied_winner()));
                open.end_reason = reason;
                self.phase = Phase::RoundEnd;
                Ok(())
            }
            _ => Err(self.illegal(PhaseEvent::RoundEnd)),
        }
    }

    /// Closes the open round at `end_tick` because its end marker never came.
    pub fn close_inferred(&mut self, end_tick: u32) {
        if let Some(open) = self.open.as_mut().filter(|o| !o.has_ended()) {
            open.end_tick = Some(end_tick.max(open.start_tick));
            open.inferred = true;
            self.phase = Phase::RoundEnd;
        }
    }

    /// Closes the open round because the stream ended.
    pub fn close_incomplete(&mut self, last_tick: u32) {
        if let Some(open) = self.open.as_mut().filter(|o| !o.has_ended()) {
            open.end_tick = Some(last_tick.max(open.start_tick));
            open.end_reason = Some(RoundEndReason::Incomplete);
            self.phase = Phase::RoundEnd;
        }
    }

    pub fn round_officially_ended(&self) -> Result<(), IllegalTransition> {
        match self.phase {
            Phase::RoundEnd => Ok(()),
            _ => Err(self.illegal(PhaseEvent::RoundOfficiallyEnded)),
        }
    }

    pub fn match_end(&mut self, tick: u32) -> Result<(), IllegalTransition> {
        if self.match_ended {
            return Err(self.illegal(PhaseEvent::MatchEnd));
        }
        self.match_ended = true;
        if let Some(m) = self.match_row.as_mut() {
            m.end_tick = Some(tick);
            m.is_finished = true;
            if m.win_condition.is_none() {
                m.win_condition = Some("match_end".to_owned());
            }
        }
        self.phase = Phase::MatchEnd;
        Ok(())
    }

    /// Drops the open round without scoring it.
    pub fn discard_open(&mut self) -> Option<OpenRound> {
        self.open.take()
    }

    /// Takes the open round out, numbers it and applies its result to the score.
    pub fn finalize(&mut self, is_knife: bool) -> Option<ClosedRound> {
        let round = self.open.take()?;
        let match_id = self.ensure_match(round.start_tick);

        let competitive = !round.is_warmup && !is_knife;
        let round_number = if competitive {
            self.competitive_rounds += 1;
            self.competitive_rounds
        } else {
            0
        };

        let swapped = competitive && self.sides_swapped(round_number);
        if let (true, Some(winner)) = (competitive, round.winner) {
            let start_ct_won = (winner == Team::CounterTerrorist) != swapped;
            let max = self.rules.max_rounds;
            let bucket = if round_number <= max / 2 {
                &mut self.first_half
            } else if round_number <= max {
                &mut self.second_half
            } else {
                &mut self.overtime
            };

            if start_ct_won {
                self.score.start_ct += 1;
                bucket.start_ct += 1;
            } else {
                self.score.start_t += 1;
                bucket.start_t += 1;
            }
        }

        let (ct_score, t_score) = if swapped {
            (self.score.start_t, self.score.start_ct)
        } else {
            (self.score.start_ct, self.score.start_t)
        };

        let surrender = round.end_reason.as_ref().map(|r| r.is_surrender()).unwrap_or(false);
        let decided = competitive && self.decided_winner().is_some();

        let max_rounds = self.rules.max_rounds;
        let (score, first_half, second_half, overtime) =
            (self.score, self.first_half, self.second_half, self.overtime);
        if let Some(m) = self.match_row.as_mut() {
            m.total_rounds = self.competitive_rounds;
            m.start_ct_score = score.start_ct;
            m.start_t_score = score.start_t;
            m.start_ct_first_half = first_half.start_ct;
            m.start_t_first_half = first_half.start_t;
            m.start_ct_second_half = second_half.start_ct;
            m.start_t_second_half = second_half.start_t;
            if round_number > max_rounds {
                m.is_overtime = true;
                m.start_ct_overtime = Some(overtime.start_ct);
                m.start_t_overtime = Some(overtime.start_t);
            }
            m.end_tick = round.end_tick;

            if competitive && (decided || surrender) {
                m.is_finished = true;
                m.winner = round.winner;
                m.win_condition = Some(if surrender { "surrender" } else { "score" }.to_owned());
                tracing::info!(match_id = ?m.id, ct_score, t_score, "Match decided");
            }
        }

        if surrender && competitive {
            self.phase = Phase::MatchEnd;
        } else if self.phase != Phase::MatchEnd {
            self.phase = Phase::RoundEnd;
        }

        Some(ClosedRound {
            round,
            match_id,
            round_number,
            is_knife,
            ct_score,
            t_score,
        })
    }

    fn ensure_match(&mut self, tick: u32) -> MatchId {
        let demo_file = self.demo_file;
        let map = self.map.clone();
        let max_rounds = self.rules.max_rounds;
        self.match_row
            .get_or_insert_with(|| {
                tracing::info!(?map, "Match created");
                Match {
                    id: MatchId(0),
                    demo_file,
                    map,
                    start_tick: tick,
                    end_tick: None,
                    total_rounds: 0,
                    start_ct_score: 0,
                    start_t_score: 0,
                    start_ct_first_half: 0,
                    start_t_first_half: 0,
                    start_ct_second_half: 0,
                    start_t_second_half: 0,
                    start_ct_overtime: None,
                    start_t_overtime: None,
                    is_overtime: false,
                    is_finished: false,
                    winner: None,
                    win_condition: None,
                    max_rounds,
                }
            })
            .id
    }

    fn is_pistol_number(&self, number: u32) -> bool {
        let half = self.rules.max_rounds / 2;
        number == 1 || (half > 0 && number == half + 1)
    }

    /// Whether the team that started CT plays T in round `number`.
    pub fn sides_swapped(&self, number: u32) -> bool {
        sides_swapped(&self.rules, number)
    }

    fn decided_winner(&self) -> Option<Team> {
        decided_winner(&self.rules, self.score.start_ct, self.score.start_t)
    }
}

pub fn sides_swapped(rules: &RoundRules, number: u32) -> bool {
    let max = rules.max_rounds;
    if number == 0 || max == 0 {
        return false;
    }
    if number <= max {
        return number > max / 2;
    }

    // Overtime keeps the sides of the second half, then switches at every overtime half.
    let ot_half = (rules.overtime_max_rounds / 2).max(1);
    let halves_played = (number - max - 1) / ot_half;
    (1 + halves_played) % 2 == 1
}

/// Winner by score, as the starting side of the winning team.
pub fn decided_winner(rules: &RoundRules, start_ct: u32, start_t: u32) -> Option<Team> {
    let half = rules.max_rounds / 2;
    if rules.max_rounds == 0 {
        return None;
    }

    let (high, low) = (start_ct.max(start_t), start_ct.min(start_t));
    let needed = if high + low <= rules.max_rounds || low < half {
        half + 1
    } else {
        let ot_half = (rules.overtime_max_rounds / 2).max(1);
        let base = half + ((low - half) / ot_half) * ot_half;
        base + ot_half + 1
    };

    if high < needed || high == low {
        return None;
    }

    Some(if start_ct > start_t {
        Team::CounterTerrorist
    } else {
        Team::Terrorist
    })
}
