use crate::{DemoFileId, MatchId, PlayerKey, Position, RoundId, Team, WeaponClass};

/// Columns shared by every fact row.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FactContext {
    pub demo_file: DemoFileId,
    pub match_id: Option<MatchId>,
    pub round: Option<RoundId>,
    /// Arrival order within the demo file, unique across all fact kinds.
    pub seq: u64,
    pub tick: u32,
    pub game_time: f32,
    /// At least one player reference could not be resolved.
    pub unresolved: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Kill {
    pub ctx: FactContext,
    pub killer: Option<PlayerKey>,
    pub victim: Option<PlayerKey>,
    pub assister: Option<PlayerKey>,
    pub killer_team: Option<Team>,
    pub victim_team: Option<Team>,
    pub weapon: Option<String>,
    pub weapon_class: WeaponClass,
    pub is_headshot: bool,
    pub is_wallbang: bool,
    pub penetration: u32,
    pub is_noscope: bool,
    pub through_smoke: bool,
    pub attacker_blind: bool,
    pub is_flash_assist: bool,
    pub is_team_kill: bool,
    pub is_suicide: bool,
    pub is_first_kill: bool,
    pub is_trade_kill: bool,
    /// The teammate whose death this kill avenged.
    pub traded_player: Option<PlayerKey>,
    pub is_critical_trade: bool,
    pub is_clutch: bool,
    pub clutch_size: u8,
    /// Alive counts right after the kill.
    pub killer_team_alive: u8,
    pub victim_team_alive: u8,
    pub distance: Option<f32>,
    pub killer_position: Option<Position>,
    pub victim_position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Damage {
    pub ctx: FactContext,
    pub attacker: Option<PlayerKey>,
    pub victim: Option<PlayerKey>,
    pub attacker_team: Option<Team>,
    pub victim_team: Option<Team>,
    pub weapon: Option<String>,
    pub weapon_class: WeaponClass,
    pub hitgroup: Option<u8>,
    pub damage_health: u32,
    pub damage_armor: u32,
    pub health: u32,
    pub armor: u32,
    pub is_headshot: bool,
    pub is_team_damage: bool,
    pub is_self_damage: bool,
    pub is_fatal: bool,
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WeaponFire {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub weapon: Option<String>,
    pub weapon_class: WeaponClass,
    pub is_silenced: bool,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GrenadeKind {
    HighExplosive,
    Flashbang,
    Smoke,
    Molotov,
    Decoy,
    Unknown,
}

impl GrenadeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighExplosive => "hegrenade",
            Self::Flashbang => "flashbang",
            Self::Smoke => "smokegrenade",
            Self::Molotov => "molotov",
            Self::Decoy => "decoy",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_weapon(weapon: &str) -> Self {
        match weapon.trim_start_matches("weapon_") {
            "hegrenade" => Self::HighExplosive,
            "flashbang" => Self::Flashbang,
            "smokegrenade" => Self::Smoke,
            "molotov" | "incgrenade" | "inferno" => Self::Molotov,
            "decoy" => Self::Decoy,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GrenadeEventKind {
    Thrown,
    Bounce,
    Detonate,
    Expired,
}

impl GrenadeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thrown => "thrown",
            Self::Bounce => "bounce",
            Self::Detonate => "detonate",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrenadeEvent {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub entity: Option<i32>,
    pub grenade: GrenadeKind,
    pub event: GrenadeEventKind,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BombEventKind {
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

impl BombEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeginPlant => "begin_plant",
            Self::AbortPlant => "abort_plant",
            Self::Planted => "planted",
            Self::BeginDefuse => "begin_defuse",
            Self::AbortDefuse => "abort_defuse",
            Self::Defused => "defused",
            Self::Exploded => "exploded",
            Self::Dropped => "dropped",
            Self::Pickup => "pickup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BombEvent {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub event: BombEventKind,
    pub site: Option<String>,
    pub has_kit: bool,
    pub is_clutch: bool,
    pub clutch_size: u8,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlashEvent {
    pub ctx: FactContext,
    pub flashed: Option<PlayerKey>,
    pub flasher: Option<PlayerKey>,
    pub flashed_team: Option<Team>,
    pub flasher_team: Option<Team>,
    pub grenade_entity: Option<i32>,
    pub duration: f32,
    pub is_team_flash: bool,
    pub is_self_flash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EconomyEventKind {
    Purchase,
    Pickup,
    Drop,
}

impl EconomyEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Pickup => "pickup",
            Self::Drop => "drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EconomyEvent {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub event: EconomyEventKind,
    pub item: String,
    pub item_class: WeaponClass,
    pub item_cost: Option<u32>,
    pub money_before: Option<u32>,
    pub money_after: Option<u32>,
    pub is_buy_time: bool,
}

/// Periodic sample of a player's pawn.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PositionSample {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub position: Position,
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
    /// Horizontal speed in units per second.
    pub speed: Option<f32>,
    pub is_alive: bool,
    pub health: Option<u32>,
    pub armor: Option<u32>,
    pub has_helmet: bool,
    pub has_defuser: bool,
    pub money: Option<u32>,
    pub active_weapon: Option<String>,
    pub is_scoped: bool,
    pub is_crouching: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    BuyZone,
    BombZone,
    RescueZone,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BuyZone => "buy_zone",
            Self::BombZone => "bomb_zone",
            Self::RescueZone => "rescue_zone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoneEvent {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub zone: ZoneKind,
    /// Entered when true, left otherwise.
    pub entered: bool,
    pub has_bomb: bool,
    /// Seconds since the matching enter, on exits inside the same round.
    pub time_in_zone: Option<f32>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostageEventKind {
    Follows,
    StopsFollowing,
    Hurt,
    Killed,
    Rescued,
    CallForHelp,
}

impl HostageEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follows => "follows",
            Self::StopsFollowing => "stops_following",
            Self::Hurt => "hurt",
            Self::Killed => "killed",
            Self::Rescued => "rescued",
            Self::CallForHelp => "call_for_help",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HostageEvent {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub hostage: i32,
    pub event: HostageEventKind,
    /// How long the hostage had been following, once it stops, dies or is rescued.
    pub follow_duration: Option<f32>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    Smoke,
    Inferno,
}

impl AreaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smoke => "smoke",
            Self::Inferno => "inferno",
        }
    }
}

/// Start or end of a smoke cloud or a fire area.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AreaEffect {
    pub ctx: FactContext,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub kind: AreaKind,
    pub entity: i32,
    pub started: bool,
    /// Seconds the area lasted, on ends whose start was seen.
    pub duration: Option<f32>,
    pub position: Option<Position>,
}
