//! Round and match rollups computed from finalized fact rows.

use std::collections::{BTreeMap, HashMap};

use common::{
    AdvancedPlayerStats, ClutchRecord, DemoFileId, EconomyEventKind, EconomyState, Facts, MatchId,
    PlayerKey, PlayerMatchStats, PlayerRoundStats, Round, RoundImpact, RoundType, Team,
};

use crate::classifier::RoundTracker;
use crate::config::{EconomyThresholds, RatingWeights};
use crate::identity::Resolver;

pub const ROUND_START: &str = "round_start";
pub const ROUND_END: &str = "round_end";

/// Money and equipment of one team member, `None` when no snapshot was seen.
pub type Holdings = Option<(u32, u32)>;

pub fn loss_bonus(consecutive_losses: u32) -> u32 {
    (1400 + 500 * consecutive_losses).min(3400)
}

pub fn classify_round_type(
    average_spend_capacity: u32,
    thresholds: &EconomyThresholds,
) -> RoundType {
    if average_spend_capacity < thresholds.eco_threshold {
        RoundType::Eco
    } else if average_spend_capacity < thresholds.full_buy_threshold {
        RoundType::Force
    } else {
        RoundType::FullBuy
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streak {
    pub losses: u32,
    pub wins: u32,
}

impl Streak {
    pub fn record(&mut self, won: bool) {
        if won {
            self.wins += 1;
            self.losses = 0;
        } else {
            self.losses += 1;
            self.wins = 0;
        }
    }
}

pub struct EconomyInput<'a> {
    pub demo_file: DemoFileId,
    pub round: common::RoundId,
    pub tick: u32,
    pub phase: &'a str,
    pub is_warmup: bool,
    pub is_pistol: bool,
}

/// Builds one team's economy state. The anti-eco flag is settled afterwards by
/// [`settle_anti_eco`] once both sides are known.
pub fn economy_state(
    input: &EconomyInput<'_>,
    team: Team,
    members: &[Holdings],
    streak: Streak,
    thresholds: &EconomyThresholds,
) -> EconomyState {
    let known: Vec<(u32, u32)> = members.iter().flatten().copied().collect();
    let players = members.len() as u32;

    let total_money: u32 = known.iter().map(|(m, _)| m).sum();
    let total_equipment_value: u32 = known.iter().map(|(_, e)| e).sum();
    let divisor = (known.len() as u32).max(1);
    let average_money = total_money / divisor;
    let average_spend_capacity = (total_money + total_equipment_value) / divisor;

    let round_type = if input.is_warmup {
        RoundType::Warmup
    } else if input.is_pistol {
        RoundType::Pistol
    } else {
        classify_round_type(average_spend_capacity, thresholds)
    };

    EconomyState {
        demo_file: input.demo_file,
        round: input.round,
        tick: input.tick,
        team,
        phase: input.phase.to_owned(),
        players,
        total_money,
        average_money,
        min_money: known.iter().map(|(m, _)| *m).min().unwrap_or(0),
        max_money: known.iter().map(|(m, _)| *m).max().unwrap_or(0),
        total_equipment_value,
        average_spend_capacity,
        round_type,
        is_anti_eco: false,
        players_can_full_buy: known
            .iter()
            .filter(|(m, _)| *m >= thresholds.full_buy_player_money)
            .count() as u32,
        players_on_eco: known.iter().filter(|(m, _)| *m < thresholds.eco_threshold).count() as u32,
        consecutive_losses: streak.losses,
        consecutive_wins: streak.wins,
        loss_bonus: loss_bonus(streak.losses),
        partial: known.len() != members.len() || members.is_empty(),
    }
}

/// A full buy facing an eco.
pub fn settle_anti_eco(states: &mut [EconomyState]) {
    let eco_teams: Vec<(Team, u32)> = states
        .iter()
        .filter(|s| s.round_type == RoundType::Eco)
        .map(|s| (s.team, s.tick))
        .collect();

    for state in states.iter_mut() {
        let opponent = state.team.opponent();
        state.is_anti_eco = state.round_type == RoundType::FullBuy
            && eco_teams
                .iter()
                .any(|(team, tick)| Some(*team) == opponent && *tick == state.tick);
    }
}

/// Rating from per-round rates. Baselines of zero switch their term off.
pub fn rating(
    weights: &RatingWeights,
    kast_rate: f32,
    kills_per_round: f32,
    adr: f32,
    survival_rate: f32,
) -> f32 {
    fn term(weight: f32, value: f32, baseline: f32) -> f32 {
        if baseline > 0.0 {
            weight * value / baseline
        } else {
            0.0
        }
    }

    term(weights.kast, kast_rate, weights.kast_baseline)
        + term(weights.kill, kills_per_round, weights.kills_per_round_baseline)
        + term(weights.damage, adr, weights.adr_baseline)
        + term(weights.survival, survival_rate, weights.survival_baseline)
}

/// `((K/D) + KPR) / 2`, deaths of zero count as one.
pub fn rating_one(kills: u32, deaths: u32, rounds: u32) -> f32 {
    if rounds == 0 {
        return 0.0;
    }
    let kd = kills as f32 / deaths.max(1) as f32;
    let kpr = kills as f32 / rounds as f32;
    (kd + kpr) / 2.0
}

fn ratio(a: u32, b: u32) -> f32 {
    if b == 0 {
        0.0
    } else {
        a as f32 / b as f32
    }
}

fn percentage(a: u32, b: u32) -> f32 {
    ratio(a, b) * 100.0
}

/// Per player rollup of one finalized round.
pub fn player_round_stats(
    round: &Round,
    tracker: &RoundTracker,
    resolver: &Resolver,
    weights: &RatingWeights,
) -> Vec<PlayerRoundStats> {
    let facts = &tracker.facts;
    let mut stats: BTreeMap<PlayerKey, PlayerRoundStats> = BTreeMap::new();

    for (player, team) in tracker.participants.iter() {
        let counts = resolver
            .player(*player)
            .map(|p| p.counts_for_stats())
            .unwrap_or(false);
        if !counts {
            continue;
        }

        let start = tracker.start_economy.get(player).copied();
        let end_money = resolver
            .pawn_state(*player)
            .and_then(|s| s.money)
            .unwrap_or(0);

        stats.insert(
            *player,
            PlayerRoundStats {
                demo_file: round.demo_file,
                round: round.id,
                player: *player,
                team: *team,
                kills: 0,
                deaths: 0,
                assists: 0,
                headshot_kills: 0,
                damage: 0,
                utility_damage: 0,
                damage_taken: 0,
                first_kill: false,
                first_death: false,
                trade_kills: 0,
                traded: false,
                survived: tracker.is_alive(*player),
                kast: false,
                start_money: start.map(|(m, _)| m).unwrap_or(0),
                equipment_value: start.map(|(_, e)| e).unwrap_or(0),
                end_money,
                money_spent: 0,
                shots_fired: 0,
                shots_hit: 0,
                flash_assists: 0,
                enemies_flashed: 0,
                teammates_flashed: 0,
                flash_duration: 0.0,
                bomb_planted: false,
                bomb_defused: false,
                is_clutch: false,
                clutch_size: 0,
                clutch_won: false,
                won_round: round.winner == Some(*team),
                rating: 0.0,
                partial: start.is_none(),
            },
        );
    }

    for kill in facts.kills.iter() {
        if let Some(s) = kill.victim.and_then(|v| stats.get_mut(&v)) {
            s.deaths += 1;
            s.first_death |= kill.is_first_kill;
        }

        if !kill.is_suicide && !kill.is_team_kill {
            if let Some(s) = kill.killer.and_then(|k| stats.get_mut(&k)) {
                s.kills += 1;
                s.first_kill |= kill.is_first_kill;
                if kill.is_headshot {
                    s.headshot_kills += 1;
                }
                if kill.is_trade_kill {
                    s.trade_kills += 1;
                }
            }

            if let Some(s) = kill.assister.and_then(|a| stats.get_mut(&a)) {
                s.assists += 1;
                if kill.is_flash_assist {
                    s.flash_assists += 1;
                }
            }
        }

        if let Some(s) = kill.traded_player.and_then(|t| stats.get_mut(&t)) {
            s.traded = true;
        }
    }

    // Damage counts up to the health the victim had left.
    let mut health: HashMap<PlayerKey, u32> = HashMap::new();
    for damage in facts.damages.iter() {
        let effective = match damage.victim {
            Some(victim) => {
                let remaining = health.entry(victim).or_insert(100);
                let effective = damage.damage_health.min(*remaining);
                *remaining = damage.health;
                effective
            }
            None => damage.damage_health,
        };

        if let Some(s) = damage.victim.and_then(|v| stats.get_mut(&v)) {
            s.damage_taken += effective;
        }

        if damage.is_team_damage || damage.is_self_damage {
            continue;
        }
        if let Some(s) = damage.attacker.and_then(|a| stats.get_mut(&a)) {
            s.damage += effective;
            if damage.weapon_class.is_utility() {
                s.utility_damage += effective;
            }
            if damage.weapon_class.is_firearm() {
                s.shots_hit += 1;
            }
        }
    }

    for fire in facts.weapon_fires.iter() {
        if !fire.weapon_class.is_firearm() {
            continue;
        }
        if let Some(s) = fire.player.and_then(|p| stats.get_mut(&p)) {
            s.shots_fired += 1;
        }
    }

    for flash in facts.flash_events.iter() {
        if flash.is_self_flash {
            continue;
        }
        if let Some(s) = flash.flasher.and_then(|p| stats.get_mut(&p)) {
            if flash.is_team_flash {
                s.teammates_flashed += 1;
            } else {
                s.enemies_flashed += 1;
                s.flash_duration += flash.duration;
            }
        }
    }

    for bomb in facts.bomb_events.iter() {
        if let Some(s) = bomb.player.and_then(|p| stats.get_mut(&p)) {
            match bomb.event {
                common::BombEventKind::Planted => s.bomb_planted = true,
                common::BombEventKind::Defused => s.bomb_defused = true,
                _ => {}
            }
        }
    }

    for purchase in facts
        .economy_events
        .iter()
        .filter(|e| e.event == EconomyEventKind::Purchase)
    {
        if let Some(s) = purchase.player.and_then(|p| stats.get_mut(&p)) {
            s.money_spent += purchase.item_cost.unwrap_or(0);
        }
    }

    for clutch in tracker.clutches.values() {
        if let Some(s) = stats.get_mut(&clutch.player) {
            s.is_clutch = true;
            s.clutch_size = clutch.size;
            s.clutch_won = s.won_round;
        }
    }

    stats
        .into_values()
        .map(|mut s| {
            s.kast = s.kills > 0 || s.assists > 0 || s.survived || s.traded;
            s.rating = rating(
                weights,
                if s.kast { 1.0 } else { 0.0 },
                s.kills as f32,
                s.damage as f32,
                if s.survived { 1.0 } else { 0.0 },
            );
            s
        })
        .collect()
}

/// The fixed weight table of the round impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactEvent {
    Kill,
    HeadshotKill,
    EntryKill,
    TradeKill,
    CriticalTrade,
    Assist,
    FlashAssist,
    /// Per 100 damage dealt.
    Damage,
    /// Per 100 grenade damage dealt.
    UtilityDamage,
    EnemyFlashed,
    TeamFlash,
    MultiKill(u32),
    ClutchAttempt,
    /// Per opponent faced.
    ClutchWin,
    BombPlant,
    BombDefuse,
    Death,
    EntryDeath,
    TradedDeath,
}

impl ImpactEvent {
    pub fn weight(&self) -> f32 {
        match self {
            Self::Kill => 1.0,
            Self::HeadshotKill => 0.1,
            Self::EntryKill => 0.5,
            Self::TradeKill => 0.3,
            Self::CriticalTrade => 0.4,
            Self::Assist => 0.3,
            Self::FlashAssist => 0.2,
            Self::Damage => 0.4,
            Self::UtilityDamage => 0.2,
            Self::EnemyFlashed => 0.1,
            Self::TeamFlash => -0.15,
            Self::MultiKill(2) => 0.3,
            Self::MultiKill(3) => 0.7,
            Self::MultiKill(4) => 1.2,
            Self::MultiKill(n) if *n >= 5 => 2.0,
            Self::MultiKill(_) => 0.0,
            Self::ClutchAttempt => 0.2,
            Self::ClutchWin => 0.6,
            Self::BombPlant => 0.5,
            Self::BombDefuse => 0.8,
            Self::Death => -0.7,
            Self::EntryDeath => -0.5,
            Self::TradedDeath => 0.3,
        }
    }
}

#[derive(Clone, Copy)]
enum Bucket {
    Fragging,
    Utility,
    Objective,
}

#[derive(Default)]
struct ImpactSums {
    positive: f32,
    negative: f32,
    fragging: f32,
    utility: f32,
    objective: f32,
}

impl ImpactSums {
    fn add(&mut self, event: ImpactEvent, times: f32, bucket: Bucket) {
        let value = event.weight() * times;
        if value >= 0.0 {
            self.positive += value;
        } else {
            self.negative += -value;
        }
        match bucket {
            Bucket::Fragging => self.fragging += value,
            Bucket::Utility => self.utility += value,
            Bucket::Objective => self.objective += value,
        }
    }
}

/// Scores every player of the round and splits the result between them.
pub fn round_impacts(round: &Round, stats: &[PlayerRoundStats], facts: &Facts) -> Vec<RoundImpact> {
    let mut critical_trades: HashMap<PlayerKey, u32> = HashMap::new();
    for kill in facts.kills.iter().filter(|k| k.is_critical_trade) {
        if let Some(killer) = kill.killer {
            *critical_trades.entry(killer).or_default() += 1;
        }
    }

    let mut impacts: Vec<RoundImpact> = stats
        .iter()
        .map(|s| {
            let mut sums = ImpactSums::default();
            let (fragging, utility, objective) =
                (Bucket::Fragging, Bucket::Utility, Bucket::Objective);

            let criticals = critical_trades.get(&s.player).copied().unwrap_or(0);

            sums.add(ImpactEvent::Kill, s.kills as f32, fragging);
            sums.add(ImpactEvent::HeadshotKill, s.headshot_kills as f32, fragging);
            if s.first_kill {
                sums.add(ImpactEvent::EntryKill, 1.0, fragging);
            }
            sums.add(ImpactEvent::TradeKill, s.trade_kills as f32, fragging);
            sums.add(ImpactEvent::CriticalTrade, criticals as f32, fragging);
            sums.add(ImpactEvent::Assist, s.assists as f32, fragging);
            sums.add(ImpactEvent::Damage, s.damage as f32 / 100.0, fragging);
            if s.kills >= 2 {
                sums.add(ImpactEvent::MultiKill(s.kills), 1.0, fragging);
            }
            sums.add(ImpactEvent::Death, s.deaths as f32, fragging);
            if s.first_death {
                sums.add(ImpactEvent::EntryDeath, 1.0, fragging);
            }
            if s.traded {
                sums.add(ImpactEvent::TradedDeath, 1.0, fragging);
            }

            sums.add(ImpactEvent::FlashAssist, s.flash_assists as f32, utility);
            sums.add(ImpactEvent::UtilityDamage, s.utility_damage as f32 / 100.0, utility);
            sums.add(ImpactEvent::EnemyFlashed, s.enemies_flashed as f32, utility);
            sums.add(ImpactEvent::TeamFlash, s.teammates_flashed as f32, utility);

            if s.bomb_planted {
                sums.add(ImpactEvent::BombPlant, 1.0, objective);
            }
            if s.bomb_defused {
                sums.add(ImpactEvent::BombDefuse, 1.0, objective);
            }
            if s.is_clutch {
                sums.add(ImpactEvent::ClutchAttempt, 1.0, objective);
                if s.clutch_won {
                    sums.add(ImpactEvent::ClutchWin, s.clutch_size as f32, objective);
                }
            }

            let round_type = round.classification(s.team);

            RoundImpact {
                demo_file: round.demo_file,
                round: round.id,
                player: s.player,
                round_number: round.round_number,
                positive_impact: sums.positive,
                negative_impact: sums.negative,
                net_impact: sums.positive - sums.negative,
                fragging_impact: sums.fragging,
                utility_impact: sums.utility,
                objective_impact: sums.objective,
                has_entry_frag: s.first_kill,
                has_clutch_attempt: s.is_clutch,
                has_clutch_win: s.is_clutch && s.clutch_won,
                has_multi_kill: s.kills >= 2,
                has_critical_trade: criticals > 0,
                win_contribution: 0.0,
                loss_share: 0.0,
                round_type,
            }
        })
        .collect();

    apportion(round, stats, &mut impacts);
    impacts
}

/// Winners share the win by positive net impact, losers share the loss by
/// negative impact. Equal split when nobody stands out.
fn apportion(round: &Round, stats: &[PlayerRoundStats], impacts: &mut [RoundImpact]) {
    let Some(winner) = round.winner else {
        return;
    };

    let won: Vec<bool> = stats.iter().map(|s| s.team == winner).collect();

    let winners = won.iter().filter(|w| **w).count();
    let win_total: f32 = impacts
        .iter()
        .zip(won.iter())
        .filter(|(_, w)| **w)
        .map(|(i, _)| i.net_impact.max(0.0))
        .sum();

    let losers = stats
        .iter()
        .zip(won.iter())
        .filter(|(s, w)| !**w && s.team.is_playing())
        .count();
    let loss_total: f32 = impacts
        .iter()
        .zip(stats.iter().zip(won.iter()))
        .filter(|(_, (s, w))| !**w && s.team.is_playing())
        .map(|(i, _)| i.negative_impact)
        .sum();

    for (impact, (s, w)) in impacts.iter_mut().zip(stats.iter().zip(won.iter())) {
        if *w {
            impact.win_contribution = if win_total > 0.0 {
                impact.net_impact.max(0.0) / win_total
            } else {
                1.0 / winners as f32
            };
        } else if s.team.is_playing() {
            impact.loss_share = if loss_total > 0.0 {
                impact.negative_impact / loss_total
            } else {
                1.0 / losers as f32
            };
        }
    }
}

#[derive(Debug, Clone, Default)]
struct PlayerTotals {
    kills: u32,
    deaths: u32,
    assists: u32,
    headshot_kills: u32,
    damage: u32,
    damage_taken: u32,
    utility_damage: u32,
    first_kills: u32,
    first_deaths: u32,
    trade_kills: u32,
    trade_deaths: u32,
    rounds_played: u32,
    rounds_won: u32,
    kast_rounds: u32,
    survived_rounds: u32,
    clutches: ClutchRecord,
    multi_kill_rounds: [u32; 4],
    flash_assists: u32,
    enemies_flashed: u32,
    teammates_flashed: u32,
    flash_duration: f32,
    bomb_plants: u32,
    bomb_defuses: u32,
    money_spent: u32,
    shots_fired: u32,
    shots_hit: u32,
    impact: f32,
    eco_round_kills: u32,
    force_round_kills: u32,
    full_buy_round_kills: u32,
    partial: bool,
}

/// Running per player totals over the competitive rounds of a match.
#[derive(Debug, Default)]
pub struct MatchAccumulator {
    players: BTreeMap<PlayerKey, PlayerTotals>,
}

impl MatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_round(
        &mut self,
        round: &Round,
        stats: &[PlayerRoundStats],
        impacts: &[RoundImpact],
    ) {
        if !round.is_competitive() {
            return;
        }

        for s in stats {
            let totals = self.players.entry(s.player).or_default();
            totals.kills += s.kills;
            totals.deaths += s.deaths;
            totals.assists += s.assists;
            totals.headshot_kills += s.headshot_kills;
            totals.damage += s.damage;
            totals.damage_taken += s.damage_taken;
            totals.utility_damage += s.utility_damage;
            totals.first_kills += s.first_kill as u32;
            totals.first_deaths += s.first_death as u32;
            totals.trade_kills += s.trade_kills;
            totals.trade_deaths += s.traded as u32;
            totals.rounds_played += 1;
            totals.rounds_won += s.won_round as u32;
            totals.kast_rounds += s.kast as u32;
            totals.survived_rounds += s.survived as u32;
            if s.is_clutch {
                totals.clutches.record(s.clutch_size, s.clutch_won);
            }
            if s.kills >= 2 {
                totals.multi_kill_rounds[(s.kills.min(5) - 2) as usize] += 1;
            }
            totals.flash_assists += s.flash_assists;
            totals.enemies_flashed += s.enemies_flashed;
            totals.teammates_flashed += s.teammates_flashed;
            totals.flash_duration += s.flash_duration;
            totals.bomb_plants += s.bomb_planted as u32;
            totals.bomb_defuses += s.bomb_defused as u32;
            totals.money_spent += s.money_spent;
            totals.shots_fired += s.shots_fired;
            totals.shots_hit += s.shots_hit;
            totals.partial |= s.partial;

            match round.classification(s.team) {
                Some(RoundType::Eco) => totals.eco_round_kills += s.kills,
                Some(RoundType::Force) => totals.force_round_kills += s.kills,
                Some(RoundType::FullBuy | RoundType::AntiEco) => {
                    totals.full_buy_round_kills += s.kills
                }
                _ => {}
            }
        }

        for impact in impacts {
            if let Some(totals) = self.players.get_mut(&impact.player) {
                totals.impact += impact.net_impact;
            }
        }
    }

    pub fn finish(
        &self,
        demo_file: DemoFileId,
        match_id: MatchId,
        weights: &RatingWeights,
    ) -> (Vec<PlayerMatchStats>, Vec<AdvancedPlayerStats>) {
        let mut match_stats = Vec::with_capacity(self.players.len());
        let mut advanced = Vec::with_capacity(self.players.len());

        for (player, t) in self.players.iter() {
            let rounds = t.rounds_played;
            let per_round = |v: u32| ratio(v, rounds);
            let adr = per_round(t.damage);
            let kast_rate = per_round(t.kast_rounds);
            let survival_rate = per_round(t.survived_rounds);
            let kills_per_round = per_round(t.kills);
            let rating = rating(weights, kast_rate, kills_per_round, adr, survival_rate);

            match_stats.push(PlayerMatchStats {
                demo_file,
                match_id,
                player: *player,
                kills: t.kills,
                deaths: t.deaths,
                assists: t.assists,
                headshot_kills: t.headshot_kills,
                headshot_percentage: percentage(t.headshot_kills, t.kills),
                damage: t.damage,
                damage_taken: t.damage_taken,
                utility_damage: t.utility_damage,
                adr,
                kd_ratio: if t.deaths == 0 {
                    t.kills as f32
                } else {
                    ratio(t.kills, t.deaths)
                },
                first_kills: t.first_kills,
                first_deaths: t.first_deaths,
                trade_kills: t.trade_kills,
                trade_deaths: t.trade_deaths,
                rounds_played: rounds,
                rounds_won: t.rounds_won,
                kast_percentage: kast_rate * 100.0,
                rating,
                clutches: t.clutches.clone(),
                multi_kill_rounds: t.multi_kill_rounds,
                flash_assists: t.flash_assists,
                enemies_flashed: t.enemies_flashed,
                teammates_flashed: t.teammates_flashed,
                flash_duration: t.flash_duration,
                bomb_plants: t.bomb_plants,
                bomb_defuses: t.bomb_defuses,
                money_spent: t.money_spent,
                shots_fired: t.shots_fired,
                shots_hit: t.shots_hit,
                accuracy: percentage(t.shots_hit, t.shots_fired),
                partial: t.partial,
            });

            advanced.push(AdvancedPlayerStats {
                demo_file,
                match_id,
                player: *player,
                sample_size: rounds,
                rating,
                rating_one: rating_one(t.kills, t.deaths, rounds),
                impact_rating: if rounds == 0 { 0.0 } else { t.impact / rounds as f32 },
                kast_percentage: kast_rate * 100.0,
                kills_per_round,
                deaths_per_round: per_round(t.deaths),
                assists_per_round: per_round(t.assists),
                average_damage_per_round: adr,
                survival_rate,
                first_kills_per_round: per_round(t.first_kills),
                first_deaths_per_round: per_round(t.first_deaths),
                opening_duel_success_rate: percentage(
                    t.first_kills,
                    t.first_kills + t.first_deaths,
                ),
                trade_kill_percentage: percentage(t.trade_kills, t.kills),
                headshot_percentage: percentage(t.headshot_kills, t.kills),
                utility_damage_per_round: per_round(t.utility_damage),
                flash_assists_per_round: per_round(t.flash_assists),
                clutch_success_rate: percentage(
                    t.clutches.total_wins(),
                    t.clutches.total_attempts(),
                ),
                multi_kills_per_round: per_round(t.multi_kill_rounds.iter().sum()),
                eco_round_kills: t.eco_round_kills,
                force_round_kills: t.force_round_kills,
                full_buy_round_kills: t.full_buy_round_kills,
            });
        }

        (match_stats, advanced)
    }
}
