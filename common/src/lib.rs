pub mod aggregates;
pub mod batch;
pub mod entities;
pub mod facts;

pub use aggregates::*;
pub use batch::{Facts, MatchBatch, RoundBatch};
pub use entities::*;
pub use facts::*;

/// Identifies one parsed demo file. Every persisted row carries it.
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
pub struct DemoFileId(pub uuid::Uuid);

impl DemoFileId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7())
    }
}

impl core::fmt::Display for DemoFileId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

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
pub struct MatchId(pub u32);

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
pub struct RoundId(pub u32);

/// Stable surrogate for a player within one demo file. Never a slot or entity index.
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
pub struct PlayerKey(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Team {
    Unassigned,
    Spectator,
    Terrorist,
    CounterTerrorist,
}

impl Team {
    /// Maps the engine's team number (0..=3).
    pub fn from_number(number: i32) -> Self {
        match number {
            1 => Self::Spectator,
            2 => Self::Terrorist,
            3 => Self::CounterTerrorist,
            _ => Self::Unassigned,
        }
    }

    pub fn number(&self) -> i16 {
        match self {
            Self::Unassigned => 0,
            Self::Spectator => 1,
            Self::Terrorist => 2,
            Self::CounterTerrorist => 3,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Terrorist | Self::CounterTerrorist)
    }

    pub fn opponent(&self) -> Option<Self> {
        match self {
            Self::Terrorist => Some(Self::CounterTerrorist),
            Self::CounterTerrorist => Some(Self::Terrorist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Spectator => "spectator",
            Self::Terrorist => "T",
            Self::CounterTerrorist => "CT",
        }
    }
}

impl Default for Team {
    fn default() -> Self {
        Self::Unassigned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WeaponClass {
    Knife,
    Pistol,
    Smg,
    Rifle,
    Sniper,
    Shotgun,
    MachineGun,
    Grenade,
    Equipment,
    World,
    Unknown,
}

impl WeaponClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knife => "knife",
            Self::Pistol => "pistol",
            Self::Smg => "smg",
            Self::Rifle => "rifle",
            Self::Sniper => "sniper",
            Self::Shotgun => "shotgun",
            Self::MachineGun => "machine_gun",
            Self::Grenade => "grenade",
            Self::Equipment => "equipment",
            Self::World => "world",
            Self::Unknown => "unknown",
        }
    }

    /// Anything that is not fired as a bullet.
    pub fn is_utility(&self) -> bool {
        matches!(self, Self::Grenade)
    }

    pub fn is_firearm(&self) -> bool {
        matches!(
            self,
            Self::Pistol | Self::Smg | Self::Rifle | Self::Sniper | Self::Shotgun | Self::MachineGun
        )
    }
}
