use crate::{DemoFileId, MatchId, PlayerKey, RoundId, Team};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DemoFile {
    pub id: DemoFileId,
    pub file_name: String,
    pub map: Option<String>,
    pub server_name: Option<String>,
    /// Where the demo came from, e.g. "faceit", "esea", "valve".
    pub source: Option<String>,
    pub tick_rate: u32,
    pub total_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub demo_file: DemoFileId,
    pub map: Option<String>,
    pub start_tick: u32,
    pub end_tick: Option<u32>,
    pub total_rounds: u32,
    /// Score of the team that started on the CT side.
    pub start_ct_score: u32,
    /// Score of the team that started on the T side.
    pub start_t_score: u32,
    pub start_ct_first_half: u32,
    pub start_t_first_half: u32,
    pub start_ct_second_half: u32,
    pub start_t_second_half: u32,
    pub start_ct_overtime: Option<u32>,
    pub start_t_overtime: Option<u32>,
    pub is_overtime: bool,
    pub is_finished: bool,
    /// Side the winning team played on in the final round.
    pub winner: Option<Team>,
    pub win_condition: Option<String>,
    pub max_rounds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RoundEndReason {
    StillInProgress,
    BombExploded,
    VipEscaped,
    VipKilled,
    TSaved,
    CtStoppedEscape,
    RoundEndReasonTerroristsStopped,
    BombDefused,
    TKilled,
    CTKilled,
    Draw,
    HostageRescued,
    TimeRanOut,
    RoundEndReasonHostagesNotRescued,
    TerroristsNotEscaped,
    VipNotEscaped,
    GameStart,
    TSurrender,
    CTSurrender,
    TPlanted,
    CTReachedHostage,
    /// The stream ended before the round did.
    Incomplete,
}

impl RoundEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StillInProgress => "still_in_progress",
            Self::BombExploded => "bomb_exploded",
            Self::VipEscaped => "vip_escaped",
            Self::VipKilled => "vip_killed",
            Self::TSaved => "t_saved",
            Self::CtStoppedEscape => "ct_stopped_escape",
            Self::RoundEndReasonTerroristsStopped => "terrorists_stopped",
            Self::BombDefused => "bomb_defused",
            Self::TKilled => "t_killed",
            Self::CTKilled => "ct_killed",
            Self::Draw => "draw",
            Self::HostageRescued => "hostage_rescued",
            Self::TimeRanOut => "time_ran_out",
            Self::RoundEndReasonHostagesNotRescued => "hostages_not_rescued",
            Self::TerroristsNotEscaped => "terrorists_not_escaped",
            Self::VipNotEscaped => "vip_not_escaped",
            Self::GameStart => "game_start",
            Self::TSurrender => "t_surrender",
            Self::CTSurrender => "ct_surrender",
            Self::TPlanted => "t_planted",
            Self::CTReachedHostage => "ct_reached_hostage",
            Self::Incomplete => "incomplete",
        }
    }

    /// The side a reason awards the round to, when it implies one.
    pub fn implied_winner(&self) -> Option<Team> {
        match self {
            Self::BombExploded
            | Self::CTKilled
            | Self::CTSurrender
            | Self::TPlanted
            | Self::VipKilled => {
                Some(Team::Terrorist)
            }
            Self::BombDefused
            | Self::TKilled
            | Self::TSurrender
            | Self::TimeRanOut
            | Self::TSaved
            | Self::HostageRescued
            | Self::CTReachedHostage
            | Self::VipEscaped => Some(Team::CounterTerrorist),
            _ => None,
        }
    }

    pub fn is_surrender(&self) -> bool {
        matches!(self, Self::TSurrender | Self::CTSurrender)
    }
}

/// Team economy posture at round start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RoundType {
    Warmup,
    Knife,
    Pistol,
    Eco,
    Force,
    FullBuy,
    /// A full buy facing an eco.
    AntiEco,
}

impl RoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Knife => "knife",
            Self::Pistol => "pistol",
            Self::Eco => "eco",
            Self::Force => "force",
            Self::FullBuy => "full_buy",
            Self::AntiEco => "anti_eco",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub match_id: MatchId,
    pub demo_file: DemoFileId,
    /// Contiguous from 1 for competitive rounds, 0 for warmup and knife rounds.
    pub round_number: u32,
    pub start_tick: u32,
    pub freeze_end_tick: Option<u32>,
    pub end_tick: Option<u32>,
    pub winner: Option<Team>,
    pub end_reason: Option<RoundEndReason>,
    /// Side scores after this round.
    pub ct_score: u32,
    pub t_score: u32,
    pub ct_live_players: u32,
    pub t_live_players: u32,
    pub ct_start_money: u32,
    pub t_start_money: u32,
    pub ct_equipment_value: u32,
    pub t_equipment_value: u32,
    pub ct_round_type: Option<RoundType>,
    pub t_round_type: Option<RoundType>,
    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub bomb_exploded: bool,
    pub bomb_site: Option<String>,
    pub is_warmup: bool,
    pub is_knife: bool,
    pub is_pistol: bool,
    pub is_overtime: bool,
    pub is_eco_round: bool,
    pub is_force_buy_round: bool,
    pub is_anti_eco_round: bool,
    /// The end tick was inferred because no end marker was seen.
    pub inferred: bool,
}

impl Round {
    pub fn is_competitive(&self) -> bool {
        !self.is_warmup && !self.is_knife
    }

    /// The team's round type, where a full buy against an eco reads as anti-eco.
    /// The stored per team types stay as classified at round start.
    pub fn classification(&self, team: Team) -> Option<RoundType> {
        let (own, other) = match team {
            Team::CounterTerrorist => (self.ct_round_type, self.t_round_type),
            Team::Terrorist => (self.t_round_type, self.ct_round_type),
            _ => return None,
        };

        match (own, other) {
            (Some(RoundType::FullBuy), Some(RoundType::Eco)) if self.is_anti_eco_round => {
                Some(RoundType::AntiEco)
            }
            _ => own,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Player {
    pub key: PlayerKey,
    pub demo_file: DemoFileId,
    pub slot: i32,
    pub user_id: Option<i32>,
    pub steam_id: Option<u64>,
    pub name: String,
    pub team: Team,
    pub is_bot: bool,
    pub is_hltv: bool,
    pub is_connected: bool,
    pub connected_tick: u32,
    pub disconnected_tick: Option<u32>,
    pub disconnect_reason: Option<String>,
}

impl Player {
    /// Spectator pseudo players never show up in per-player aggregates.
    pub fn counts_for_stats(&self) -> bool {
        !self.is_hltv
    }
}
