//! Table rows and the mapping from the engine's batches onto them.
//!
//! Every table keeps a handful of queryable columns and stores the full typed
//! record in `data`.

use diesel::prelude::*;
use serde::Serialize;

use common::{DemoFile, Facts, Match, MatchBatch, Player, Round, RoundBatch};

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::demo_files)]
#[diesel(primary_key(demo_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DemoFileRow {
    pub demo_id: uuid::Uuid,
    pub file_name: String,
    pub map: Option<String>,
    pub server_name: Option<String>,
    pub source: Option<String>,
    pub tick_rate: i32,
    pub total_ticks: i32,
    pub processed_at: chrono::NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::matches)]
#[diesel(primary_key(demo_id, match_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct MatchRow {
    pub demo_id: uuid::Uuid,
    pub match_id: i32,
    pub map: Option<String>,
    pub start_tick: i32,
    pub end_tick: Option<i32>,
    pub total_rounds: i32,
    pub start_ct_score: i32,
    pub start_t_score: i32,
    pub is_overtime: bool,
    pub is_finished: bool,
    pub winner: Option<i16>,
    pub win_condition: Option<String>,
    pub max_rounds: i32,
    pub data: serde_json::Value,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::rounds)]
#[diesel(primary_key(demo_id, round_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RoundRow {
    pub demo_id: uuid::Uuid,
    pub round_id: i32,
    pub match_id: i32,
    pub round_number: i32,
    pub start_tick: i32,
    pub end_tick: Option<i32>,
    pub winner: Option<i16>,
    pub end_reason: Option<String>,
    pub ct_score: i32,
    pub t_score: i32,
    pub is_warmup: bool,
    pub is_knife: bool,
    pub data: serde_json::Value,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::players)]
#[diesel(primary_key(demo_id, player_key))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct PlayerRow {
    pub demo_id: uuid::Uuid,
    pub player_key: i32,
    pub steam_id: Option<i64>,
    pub name: String,
    pub team: i16,
    pub is_bot: bool,
    pub is_hltv: bool,
    pub is_connected: bool,
    pub data: serde_json::Value,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::facts)]
#[diesel(primary_key(demo_id, seq))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FactRow {
    pub demo_id: uuid::Uuid,
    pub seq: i64,
    pub kind: String,
    pub match_id: Option<i32>,
    pub round_id: Option<i32>,
    pub tick: i32,
    pub game_time: f32,
    pub player: Option<i32>,
    pub other_player: Option<i32>,
    pub unresolved: bool,
    pub data: serde_json::Value,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::round_aggregates)]
#[diesel(primary_key(demo_id, round_id, kind, ordinal))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct RoundAggregateRow {
    pub demo_id: uuid::Uuid,
    pub round_id: i32,
    pub kind: String,
    pub ordinal: i32,
    pub player: Option<i32>,
    pub team: Option<i16>,
    pub data: serde_json::Value,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::match_aggregates)]
#[diesel(primary_key(demo_id, match_id, kind, player))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MatchAggregateRow {
    pub demo_id: uuid::Uuid,
    pub match_id: i32,
    pub kind: String,
    pub player: i32,
    pub rating: f32,
    pub data: serde_json::Value,
}

fn int(value: u32) -> i32 {
    value.min(i32::MAX as u32) as i32
}

pub fn demo_file(demo: &DemoFile) -> DemoFileRow {
    DemoFileRow {
        demo_id: demo.id.0,
        file_name: demo.file_name.clone(),
        map: demo.map.clone(),
        server_name: demo.server_name.clone(),
        source: demo.source.clone(),
        tick_rate: int(demo.tick_rate),
        total_ticks: int(demo.total_ticks),
        processed_at: chrono::Utc::now().naive_utc(),
    }
}

pub fn match_row(row: &Match) -> Result<MatchRow, serde_json::Error> {
    Ok(MatchRow {
        demo_id: row.demo_file.0,
        match_id: int(row.id.0),
        map: row.map.clone(),
        start_tick: int(row.start_tick),
        end_tick: row.end_tick.map(int),
        total_rounds: int(row.total_rounds),
        start_ct_score: int(row.start_ct_score),
        start_t_score: int(row.start_t_score),
        is_overtime: row.is_overtime,
        is_finished: row.is_finished,
        winner: row.winner.map(|t| t.number()),
        win_condition: row.win_condition.clone(),
        max_rounds: int(row.max_rounds),
        data: serde_json::to_value(row)?,
    })
}

pub fn round_row(round: &Round) -> Result<RoundRow, serde_json::Error> {
    Ok(RoundRow {
        demo_id: round.demo_file.0,
        round_id: int(round.id.0),
        match_id: int(round.match_id.0),
        round_number: int(round.round_number),
        start_tick: int(round.start_tick),
        end_tick: round.end_tick.map(int),
        winner: round.winner.map(|t| t.number()),
        end_reason: round.end_reason.as_ref().map(|r| r.as_str().to_owned()),
        ct_score: int(round.ct_score),
        t_score: int(round.t_score),
        is_warmup: round.is_warmup,
        is_knife: round.is_knife,
        data: serde_json::to_value(round)?,
    })
}

pub fn player_row(player: &Player) -> Result<PlayerRow, serde_json::Error> {
    Ok(PlayerRow {
        demo_id: player.demo_file.0,
        player_key: int(player.key.0),
        steam_id: player.steam_id.map(|s| s as i64),
        name: player.name.clone(),
        team: player.team.number(),
        is_bot: player.is_bot,
        is_hltv: player.is_hltv,
        is_connected: player.is_connected,
        data: serde_json::to_value(player)?,
    })
}

fn fact<T: Serialize>(
    kind: &str,
    ctx: &common::FactContext,
    player: Option<common::PlayerKey>,
    other_player: Option<common::PlayerKey>,
    value: &T,
) -> Result<FactRow, serde_json::Error> {
    Ok(FactRow {
        demo_id: ctx.demo_file.0,
        seq: ctx.seq as i64,
        kind: kind.to_owned(),
        match_id: ctx.match_id.map(|m| int(m.0)),
        round_id: ctx.round.map(|r| int(r.0)),
        tick: int(ctx.tick),
        game_time: ctx.game_time,
        player: player.map(|p| int(p.0)),
        other_player: other_player.map(|p| int(p.0)),
        unresolved: ctx.unresolved,
        data: serde_json::to_value(value)?,
    })
}

/// One row per fact, ordered by arrival.
pub fn fact_rows(facts: &Facts) -> Result<Vec<FactRow>, serde_json::Error> {
    let mut rows = Vec::with_capacity(facts.len());

    for kill in facts.kills.iter() {
        rows.push(fact("kill", &kill.ctx, kill.killer, kill.victim, kill)?);
    }
    for damage in facts.damages.iter() {
        rows.push(fact("damage", &damage.ctx, damage.attacker, damage.victim, damage)?);
    }
    for fire in facts.weapon_fires.iter() {
        rows.push(fact("weapon_fire", &fire.ctx, fire.player, None, fire)?);
    }
    for grenade in facts.grenade_events.iter() {
        rows.push(fact("grenade", &grenade.ctx, grenade.player, None, grenade)?);
    }
    for bomb in facts.bomb_events.iter() {
        rows.push(fact("bomb", &bomb.ctx, bomb.player, None, bomb)?);
    }
    for flash in facts.flash_events.iter() {
        rows.push(fact("flash", &flash.ctx, flash.flasher, flash.flashed, flash)?);
    }
    for economy in facts.economy_events.iter() {
        rows.push(fact("economy", &economy.ctx, economy.player, None, economy)?);
    }
    for sample in facts.position_samples.iter() {
        rows.push(fact("position", &sample.ctx, sample.player, None, sample)?);
    }
    for zone in facts.zone_events.iter() {
        rows.push(fact("zone", &zone.ctx, zone.player, None, zone)?);
    }
    for hostage in facts.hostage_events.iter() {
        rows.push(fact("hostage", &hostage.ctx, hostage.player, None, hostage)?);
    }
    for area in facts.area_effects.iter() {
        rows.push(fact("area", &area.ctx, area.player, None, area)?);
    }

    rows.sort_by_key(|r| r.seq);
    Ok(rows)
}

/// Derived per round rows of a batch. Empty for batches without a round.
pub fn round_aggregate_rows(
    batch: &RoundBatch,
) -> Result<Vec<RoundAggregateRow>, serde_json::Error> {
    let round = match batch.round.as_ref() {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };
    let demo_id = batch.demo_file.0;
    let round_id = int(round.id.0);

    let mut rows = Vec::new();
    for (ordinal, state) in batch.economy_states.iter().enumerate() {
        rows.push(RoundAggregateRow {
            demo_id,
            round_id,
            kind: "economy_state".to_owned(),
            ordinal: ordinal as i32,
            player: None,
            team: Some(state.team.number()),
            data: serde_json::to_value(state)?,
        });
    }
    for (ordinal, trajectory) in batch.grenade_trajectories.iter().enumerate() {
        rows.push(RoundAggregateRow {
            demo_id,
            round_id,
            kind: "grenade_trajectory".to_owned(),
            ordinal: ordinal as i32,
            player: trajectory.player.map(|p| int(p.0)),
            team: trajectory.team.map(|t| t.number()),
            data: serde_json::to_value(trajectory)?,
        });
    }
    for (ordinal, stats) in batch.player_round_stats.iter().enumerate() {
        rows.push(RoundAggregateRow {
            demo_id,
            round_id,
            kind: "player_round_stats".to_owned(),
            ordinal: ordinal as i32,
            player: Some(int(stats.player.0)),
            team: Some(stats.team.number()),
            data: serde_json::to_value(stats)?,
        });
    }
    for (ordinal, impact) in batch.round_impacts.iter().enumerate() {
        rows.push(RoundAggregateRow {
            demo_id,
            round_id,
            kind: "round_impact".to_owned(),
            ordinal: ordinal as i32,
            player: Some(int(impact.player.0)),
            team: None,
            data: serde_json::to_value(impact)?,
        });
    }

    Ok(rows)
}

pub fn match_aggregate_rows(
    batch: &MatchBatch,
) -> Result<Vec<MatchAggregateRow>, serde_json::Error> {
    let mut rows = Vec::with_capacity(
        batch.player_match_stats.len() + batch.advanced_player_stats.len(),
    );

    for stats in batch.player_match_stats.iter() {
        rows.push(MatchAggregateRow {
            demo_id: stats.demo_file.0,
            match_id: int(stats.match_id.0),
            kind: "player_match_stats".to_owned(),
            player: int(stats.player.0),
            rating: stats.rating,
            data: serde_json::to_value(stats)?,
        });
    }
    for stats in batch.advanced_player_stats.iter() {
        rows.push(MatchAggregateRow {
            demo_id: stats.demo_file.0,
            match_id: int(stats.match_id.0),
            kind: "advanced_player_stats".to_owned(),
            player: int(stats.player.0),
            rating: stats.rating,
            data: serde_json::to_value(stats)?,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    use common::{
        AreaEffect, AreaKind, DemoFileId, FactContext, MatchId, PlayerKey, RoundId, Team,
        WeaponClass, WeaponFire, ZoneEvent, ZoneKind,
    };
    use pretty_assertions::assert_eq;

    fn ctx(seq: u64) -> FactContext {
        FactContext {
            demo_file: DemoFileId(uuid::Uuid::from_u128(7)),
            match_id: Some(MatchId(1)),
            round: Some(RoundId(3)),
            seq,
            tick: 1200,
            game_time: 18.75,
            unresolved: false,
        }
    }

    fn fire(seq: u64, player: Option<PlayerKey>) -> WeaponFire {
        WeaponFire {
            ctx: ctx(seq),
            player,
            team: Some(Team::Terrorist),
            weapon: Some("weapon_ak47".to_owned()),
            weapon_class: WeaponClass::Rifle,
            is_silenced: false,
            position: None,
        }
    }

    #[test]
    fn facts_keep_arrival_order() {
        let mut facts = Facts::default();
        facts.weapon_fires.push(fire(5, Some(PlayerKey(2))));
        facts.weapon_fires.push(fire(2, None));

        let rows = fact_rows(&facts).unwrap();

        assert_eq!(vec![2, 5], rows.iter().map(|r| r.seq).collect::<Vec<_>>());
        assert_eq!("weapon_fire", rows[0].kind);
        assert_eq!(None, rows[0].player);
        assert_eq!(Some(2), rows[1].player);
        assert_eq!(Some(3), rows[1].round_id);
        assert_eq!(Some(1), rows[1].match_id);
        assert_eq!(
            Some("weapon_ak47"),
            rows[1].data.get("weapon").and_then(|w| w.as_str())
        );
    }

    #[test]
    fn zone_and_area_rows() {
        let mut facts = Facts::default();
        facts.area_effects.push(AreaEffect {
            ctx: ctx(9),
            player: None,
            team: None,
            kind: AreaKind::Inferno,
            entity: 312,
            started: false,
            duration: Some(7.0),
            position: None,
        });
        facts.zone_events.push(ZoneEvent {
            ctx: ctx(4),
            player: Some(PlayerKey(1)),
            team: Some(Team::CounterTerrorist),
            zone: ZoneKind::BombZone,
            entered: false,
            has_bomb: false,
            time_in_zone: Some(2.5),
            position: None,
        });

        let rows = fact_rows(&facts).unwrap();

        assert_eq!(
            vec!["zone", "area"],
            rows.iter().map(|r| r.kind.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(Some(1), rows[0].player);
        assert_eq!(
            Some("bomb_zone"),
            rows[0].data.get("zone").and_then(|z| z.as_str())
        );
        assert_eq!(None, rows[1].player);
        assert_eq!(
            Some("inferno"),
            rows[1].data.get("kind").and_then(|k| k.as_str())
        );
    }

    #[test]
    fn players_map_steam_ids_and_teams() {
        let player = Player {
            key: PlayerKey(4),
            demo_file: DemoFileId(uuid::Uuid::from_u128(7)),
            slot: 3,
            user_id: Some(11),
            steam_id: Some(76561198000000001),
            name: "someone".to_owned(),
            team: Team::CounterTerrorist,
            is_bot: false,
            is_hltv: false,
            is_connected: true,
            connected_tick: 0,
            disconnected_tick: None,
            disconnect_reason: None,
        };

        let row = player_row(&player).unwrap();

        assert_eq!(4, row.player_key);
        assert_eq!(Some(76561198000000001), row.steam_id);
        assert_eq!(3, row.team);
        assert_eq!(Some(3), row.data.get("slot").and_then(|s| s.as_i64()));
    }

    #[test]
    fn orphan_batches_have_no_round_aggregates() {
        let batch = RoundBatch {
            demo_file: DemoFileId(uuid::Uuid::from_u128(7)),
            match_row: None,
            round: None,
            players: Vec::new(),
            facts: Facts::default(),
            economy_states: Vec::new(),
            grenade_trajectories: Vec::new(),
            player_round_stats: Vec::new(),
            round_impacts: Vec::new(),
        };

        assert!(round_aggregate_rows(&batch).unwrap().is_empty());
    }

    #[test]
    fn oversized_values_saturate() {
        assert_eq!(i32::MAX, int(u32::MAX));
        assert_eq!(17, int(17));
    }
}
