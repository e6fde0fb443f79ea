//! Turns a parsed CS2 demo into input records.
//!
//! Covers what the parser exposes: players, round boundaries and win reasons from
//! the game rules entity, deaths, damage, spawns, pawn positions and bomb
//! plants/defuses. Zone, hostage and area records only come from decoded
//! record streams.

use crate::input::{BombAction, DecodeError, EntityIndex, Record, RecordKind, Slot};

// Ordering of records sharing a tick.
const BEFORE_EVENTS: u8 = 0;
const EVENTS: u8 = 1;
const AFTER_EVENTS: u8 = 2;

const CELL_SIZE: f32 = (1 << 9) as f32;

fn slot(id: &csdemo::UserId) -> Slot {
    Slot(id.0 as i32)
}

fn raw_i32(value: &csdemo::RawValue) -> Option<i32> {
    match value {
        csdemo::RawValue::I32(v) => Some(*v),
        csdemo::RawValue::F32(v) => Some(*v as i32),
        csdemo::RawValue::U64(v) => Some(*v as i32),
        _ => None,
    }
}

pub fn parse(buf: &[u8]) -> Result<Vec<Record>, DecodeError> {
    let tmp = csdemo::Container::parse(buf)
        .map_err(|_| DecodeError::new("invalid demo container"))?;
    let output = csdemo::parser::parse(
        csdemo::FrameIterator::parse(tmp.inner),
        csdemo::parser::EntityFilter::all(),
    )
    .map_err(|_| DecodeError::new("malformed demo frames"))?;

    let mut records: Vec<(u32, u8, RecordKind)> = Vec::new();

    records.push((
        0,
        BEFORE_EVENTS,
        RecordKind::Header {
            map: Some(output.header.map_name().to_owned()),
            tick_rate: None,
            server_name: None,
            source: None,
            max_rounds: None,
        },
    ));

    let mut players: Vec<_> = output.player_info.iter().collect();
    players.sort_unstable_by_key(|(id, _)| id.0);
    for (id, player) in players {
        records.push((
            0,
            BEFORE_EVENTS,
            RecordKind::PlayerConnect {
                slot: slot(id),
                user_id: Some(id.0 as i32),
                steam_id: Some(player.xuid).filter(|x| *x != 0),
                name: player.name.clone(),
                is_bot: player.xuid == 0,
                is_hltv: false,
            },
        ));
        records.push((
            0,
            BEFORE_EVENTS,
            RecordKind::PlayerTeam {
                slot: slot(id),
                team: common::Team::from_number(player.team),
            },
        ));
    }

    let mut round_starts = 0;
    let mut round_ends = 0;
    for tick in output.entity_states.ticks.iter() {
        for state in tick.states.iter() {
            if let Some(count) = state
                .get_prop("CCSGameRulesProxy.CCSGameRules.m_nRoundStartCount")
                .and_then(|v| v.value.as_u32())
            {
                if count > round_starts {
                    round_starts = count;
                    records.push((tick.tick, BEFORE_EVENTS, RecordKind::RoundStart));
                }
            }

            if let Some(count) = state
                .get_prop("CCSGameRulesProxy.CCSGameRules.m_nRoundEndCount")
                .and_then(|v| v.value.as_u32())
            {
                if count > round_ends {
                    round_ends = count;
                    let reason = state
                        .get_prop("CCSGameRulesProxy.CCSGameRules.m_eRoundWinReason")
                        .and_then(|p| p.value.as_i32());
                    records.push((
                        tick.tick,
                        AFTER_EVENTS,
                        RecordKind::RoundEnd {
                            winner: None,
                            reason,
                            message: None,
                        },
                    ));
                }
            }

            if state.class.as_ref() != "CCSPlayerPawn" {
                continue;
            }

            let Some(pawn) = state
                .get_prop("CCSPlayerPawn.m_nEntityId")
                .and_then(|p| p.value.as_u32())
            else {
                continue;
            };

            let cell = |name: &str| state.get_prop(name).and_then(|p| p.value.as_u32());
            let offset = |name: &str| state.get_prop(name).and_then(|p| p.value.as_f32());
            let position = match (
                cell("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellX"),
                cell("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellY"),
                cell("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_cellZ"),
                offset("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecX"),
                offset("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecY"),
                offset("CCSPlayerPawn.CBodyComponentBaseAnimGraph.m_vecZ"),
            ) {
                (Some(cx), Some(cy), Some(cz), Some(x), Some(y), Some(z)) => common::Position {
                    x: cx as f32 * CELL_SIZE + x,
                    y: cy as f32 * CELL_SIZE + y,
                    z: cz as f32 * CELL_SIZE + z,
                },
                _ => continue,
            };

            records.push((
                tick.tick,
                BEFORE_EVENTS,
                RecordKind::PlayerSnapshot {
                    pawn: EntityIndex(pawn as i32),
                    money: None,
                    equipment_value: None,
                    health: None,
                    armor: None,
                    has_helmet: None,
                    has_defuser: None,
                    position: Some(position),
                },
            ));
            records.push((
                tick.tick,
                BEFORE_EVENTS,
                RecordKind::PlayerPosition {
                    pawn: EntityIndex(pawn as i32),
                    position,
                    yaw: None,
                    pitch: None,
                    velocity: None,
                    active_weapon: None,
                    is_scoped: false,
                    is_crouching: false,
                },
            ));
        }
    }

    let mut health = std::collections::HashMap::<csdemo::UserId, u32>::new();
    let mut current_tick = 0;
    for event in output.events.iter() {
        let ge = match event {
            csdemo::DemoEvent::Tick(tick) => {
                current_tick = tick.tick();
                continue;
            }
            csdemo::DemoEvent::GameEvent(ge) => ge,
            _ => continue,
        };

        let kind = match ge.as_ref() {
            csdemo::game_event::GameEvent::RoundAnnounceMatchStart(_) => RecordKind::MatchStart,
            csdemo::game_event::GameEvent::RoundOfficiallyEnded(_) => {
                RecordKind::RoundOfficiallyEnded
            }
            csdemo::game_event::GameEvent::WinPanelMatch(_) => RecordKind::MatchEnd,
            csdemo::game_event::GameEvent::BombPlanted(_) => RecordKind::Bomb {
                slot: None,
                action: BombAction::Planted,
                site: None,
                has_kit: false,
                position: None,
            },
            csdemo::game_event::GameEvent::BombDefused(_) => RecordKind::Bomb {
                slot: None,
                action: BombAction::Defused,
                site: None,
                has_kit: false,
                position: None,
            },
            csdemo::game_event::GameEvent::PlayerSpawn(spawn) => {
                let Some(user) = spawn.userid else {
                    continue;
                };
                health.insert(user, 100);
                RecordKind::PlayerSpawn {
                    slot: slot(&user),
                    pawn: spawn.userid_pawn.as_ref().and_then(raw_i32).map(EntityIndex),
                }
            }
            csdemo::game_event::GameEvent::PlayerDeath(death) => RecordKind::PlayerDeath {
                victim: death.userid.as_ref().map(slot),
                attacker: death.attacker.as_ref().map(slot),
                assister: death.assister.as_ref().map(slot),
                weapon: None,
                headshot: false,
                penetrated: 0,
                noscope: false,
                thrusmoke: false,
                attackerblind: false,
                assistedflash: false,
                attacker_position: None,
                victim_position: None,
            },
            csdemo::game_event::GameEvent::PlayerHurt(hurt) => {
                let remaining = hurt
                    .health
                    .as_ref()
                    .and_then(raw_i32)
                    .map(|h| h.max(0) as u32)
                    .unwrap_or(0);
                let previous = hurt
                    .userid
                    .and_then(|u| health.insert(u, remaining))
                    .unwrap_or(100);

                RecordKind::PlayerHurt {
                    victim: hurt.userid.as_ref().map(slot),
                    attacker: hurt.attacker.as_ref().map(slot),
                    weapon: None,
                    dmg_health: previous.saturating_sub(remaining),
                    dmg_armor: 0,
                    health: remaining,
                    armor: 0,
                    hitgroup: None,
                    attacker_position: None,
                    victim_position: None,
                }
            }
            _ => continue,
        };

        records.push((current_tick, EVENTS, kind));
    }

    records.sort_by_key(|(tick, order, _)| (*tick, *order));
    tracing::debug!(records = records.len(), "Demo converted");

    Ok(records
        .into_iter()
        .map(|(tick, _, kind)| Record::new(tick, kind))
        .collect())
}
