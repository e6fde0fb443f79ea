//! The typed records handed over by the demo codec, in stream order.

use common::{AreaKind, HostageEventKind, Position, Team, ZoneKind};

/// Connection slot of a player. Reused after disconnects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Slot(pub i32);

/// Entity index of a player pawn or grenade projectile. Reused freely by the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct EntityIndex(pub i32);

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub tick: u32,
    /// Seconds of game time, derived from the tick when absent.
    #[serde(default)]
    pub game_time: Option<f32>,
    pub kind: RecordKind,
}

impl Record {
    pub fn new(tick: u32, kind: RecordKind) -> Self {
        Self {
            tick,
            game_time: None,
            kind,
        }
    }

    pub fn at(tick: u32, game_time: f32, kind: RecordKind) -> Self {
        Self {
            tick,
            game_time: Some(game_time),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    Header {
        map: Option<String>,
        tick_rate: Option<u32>,
        server_name: Option<String>,
        source: Option<String>,
        /// `mp_maxrounds` when the codec knows it.
        #[serde(default)]
        max_rounds: Option<u32>,
    },

    PlayerConnect {
        slot: Slot,
        user_id: Option<i32>,
        steam_id: Option<u64>,
        name: String,
        #[serde(default)]
        is_bot: bool,
        #[serde(default)]
        is_hltv: bool,
    },
    /// Late announcement of a slot's identity.
    PlayerInfo {
        slot: Slot,
        steam_id: Option<u64>,
        name: Option<String>,
    },
    PlayerDisconnect {
        slot: Slot,
        reason: Option<String>,
    },
    PlayerTeam {
        slot: Slot,
        team: Team,
    },
    PlayerName {
        slot: Slot,
        name: String,
    },
    PlayerSpawn {
        slot: Slot,
        pawn: Option<EntityIndex>,
    },
    /// Entity snapshot delta of a player pawn; absent fields are unchanged.
    PlayerSnapshot {
        pawn: EntityIndex,
        money: Option<u32>,
        equipment_value: Option<u32>,
        health: Option<u32>,
        armor: Option<u32>,
        has_helmet: Option<bool>,
        has_defuser: Option<bool>,
        position: Option<Position>,
    },
    /// Sampled pawn state. Only every `position_sample_interval`-th tick is kept.
    PlayerPosition {
        pawn: EntityIndex,
        position: Position,
        yaw: Option<f32>,
        pitch: Option<f32>,
        velocity: Option<Position>,
        active_weapon: Option<String>,
        #[serde(default)]
        is_scoped: bool,
        #[serde(default)]
        is_crouching: bool,
    },

    WarmupStart,
    WarmupEnd,
    MatchStart,
    RoundStart,
    FreezeEnd,
    RoundEnd {
        winner: Option<Team>,
        /// Raw engine win-reason code.
        reason: Option<i32>,
        message: Option<String>,
    },
    RoundOfficiallyEnded,
    MatchEnd,

    PlayerDeath {
        victim: Option<Slot>,
        attacker: Option<Slot>,
        assister: Option<Slot>,
        weapon: Option<String>,
        #[serde(default)]
        headshot: bool,
        #[serde(default)]
        penetrated: u32,
        #[serde(default)]
        noscope: bool,
        #[serde(default)]
        thrusmoke: bool,
        #[serde(default)]
        attackerblind: bool,
        #[serde(default)]
        assistedflash: bool,
        attacker_position: Option<Position>,
        victim_position: Option<Position>,
    },
    PlayerHurt {
        victim: Option<Slot>,
        attacker: Option<Slot>,
        weapon: Option<String>,
        dmg_health: u32,
        #[serde(default)]
        dmg_armor: u32,
        health: u32,
        #[serde(default)]
        armor: u32,
        hitgroup: Option<u8>,
        attacker_position: Option<Position>,
        victim_position: Option<Position>,
    },
    WeaponFire {
        slot: Option<Slot>,
        weapon: Option<String>,
        #[serde(default)]
        silenced: bool,
        position: Option<Position>,
    },

    GrenadeThrown {
        slot: Option<Slot>,
        entity: Option<EntityIndex>,
        weapon: String,
        position: Option<Position>,
    },
    GrenadeBounce {
        entity: EntityIndex,
        position: Option<Position>,
    },
    GrenadeDetonate {
        slot: Option<Slot>,
        entity: Option<EntityIndex>,
        weapon: String,
        position: Option<Position>,
    },
    GrenadeExpired {
        entity: Option<EntityIndex>,
        weapon: String,
        position: Option<Position>,
    },
    PlayerBlind {
        victim: Option<Slot>,
        attacker: Option<Slot>,
        entity: Option<EntityIndex>,
        duration: f32,
    },

    Bomb {
        slot: Option<Slot>,
        action: BombAction,
        site: Option<String>,
        #[serde(default)]
        has_kit: bool,
        position: Option<Position>,
    },

    ItemPurchase {
        slot: Option<Slot>,
        item: String,
        cost: Option<u32>,
    },
    ItemPickup {
        slot: Option<Slot>,
        item: String,
    },
    ItemDrop {
        slot: Option<Slot>,
        item: String,
    },

    ZoneEnter {
        slot: Option<Slot>,
        zone: ZoneKind,
        #[serde(default)]
        has_bomb: bool,
        position: Option<Position>,
    },
    ZoneExit {
        slot: Option<Slot>,
        zone: ZoneKind,
        position: Option<Position>,
    },

    Hostage {
        slot: Option<Slot>,
        hostage: EntityIndex,
        action: HostageEventKind,
        position: Option<Position>,
    },

    /// A smoke cloud or fire area appeared. `entity` is the projectile for smokes
    /// and the inferno entity for fires.
    AreaStart {
        kind: AreaKind,
        entity: EntityIndex,
        slot: Option<Slot>,
        position: Option<Position>,
    },
    AreaEnd {
        kind: AreaKind,
        entity: EntityIndex,
        position: Option<Position>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BombAction {
    BeginPlant,
    AbortPlant,
    Planted,
    BeginDefuse,
    AbortDefuse,
    Defused,
    Exploded,
    Dropped,
    Pickup,
}

/// The codec could not produce the next record; the file is unusable from here on.
#[derive(Debug, thiserror::Error)]
#[error("decoding demo: {message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
