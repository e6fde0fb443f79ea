use crate::{DemoFileId, GrenadeKind, MatchId, PlayerKey, Position, RoundId, RoundType, Team};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EconomyState {
    pub demo_file: DemoFileId,
    pub round: RoundId,
    pub tick: u32,
    pub team: Team,
    /// "round_start" or "round_end".
    pub phase: String,
    pub players: u32,
    pub total_money: u32,
    pub average_money: u32,
    pub min_money: u32,
    pub max_money: u32,
    pub total_equipment_value: u32,
    /// Average of money plus equipment value over the team.
    pub average_spend_capacity: u32,
    pub round_type: RoundType,
    /// Full buy against an opponent on eco.
    pub is_anti_eco: bool,
    pub players_can_full_buy: u32,
    pub players_on_eco: u32,
    pub consecutive_losses: u32,
    pub consecutive_wins: u32,
    pub loss_bonus: u32,
    /// No snapshot was available for at least one team member.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GrenadeTrajectory {
    pub demo_file: DemoFileId,
    pub round: RoundId,
    pub entity: i32,
    pub player: Option<PlayerKey>,
    pub team: Option<Team>,
    pub grenade: GrenadeKind,
    pub throw_tick: u32,
    pub throw_time: f32,
    pub detonate_tick: Option<u32>,
    pub detonate_time: Option<f32>,
    pub flight_time: Option<f32>,
    pub bounce_count: u32,
    pub throw_position: Option<Position>,
    pub detonate_position: Option<Position>,
    pub players_affected: u32,
    pub enemies_affected: u32,
    pub teammates_affected: u32,
    pub total_flash_duration: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRoundStats {
    pub demo_file: DemoFileId,
    pub round: RoundId,
    pub player: PlayerKey,
    pub team: Team,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshot_kills: u32,
    pub damage: u32,
    pub utility_damage: u32,
    pub damage_taken: u32,
    pub first_kill: bool,
    pub first_death: bool,
    pub trade_kills: u32,
    /// This player's death was avenged in time.
    pub traded: bool,
    pub survived: bool,
    pub kast: bool,
    pub start_money: u32,
    pub equipment_value: u32,
    pub end_money: u32,
    pub money_spent: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub flash_assists: u32,
    pub enemies_flashed: u32,
    pub teammates_flashed: u32,
    pub flash_duration: f32,
    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub is_clutch: bool,
    pub clutch_size: u8,
    pub clutch_won: bool,
    pub won_round: bool,
    pub rating: f32,
    /// Round-start economy data was missing; money fields are defaulted.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundImpact {
    pub demo_file: DemoFileId,
    pub round: RoundId,
    pub player: PlayerKey,
    pub round_number: u32,
    pub positive_impact: f32,
    pub negative_impact: f32,
    pub net_impact: f32,
    pub fragging_impact: f32,
    pub utility_impact: f32,
    pub objective_impact: f32,
    pub has_entry_frag: bool,
    pub has_clutch_attempt: bool,
    pub has_clutch_win: bool,
    pub has_multi_kill: bool,
    pub has_critical_trade: bool,
    /// Share of the round win credited to this player, zero on a loss.
    pub win_contribution: f32,
    /// Share of the round loss blamed on this player, zero on a win.
    pub loss_share: f32,
    pub round_type: Option<RoundType>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClutchRecord {
    /// Index 0 holds 1v1, index 4 holds 1v5.
    pub attempts: [u32; 5],
    pub wins: [u32; 5],
}

impl ClutchRecord {
    pub fn record(&mut self, size: u8, won: bool) {
        let index = (size.clamp(1, 5) - 1) as usize;
        self.attempts[index] += 1;
        if won {
            self.wins[index] += 1;
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.attempts.iter().sum()
    }

    pub fn total_wins(&self) -> u32 {
        self.wins.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlayerMatchStats {
    pub demo_file: DemoFileId,
    pub match_id: MatchId,
    pub player: PlayerKey,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshot_kills: u32,
    pub headshot_percentage: f32,
    pub damage: u32,
    pub damage_taken: u32,
    pub utility_damage: u32,
    pub adr: f32,
    pub kd_ratio: f32,
    pub first_kills: u32,
    pub first_deaths: u32,
    pub trade_kills: u32,
    pub trade_deaths: u32,
    pub rounds_played: u32,
    pub rounds_won: u32,
    pub kast_percentage: f32,
    pub rating: f32,
    pub clutches: ClutchRecord,
    pub multi_kill_rounds: [u32; 4],
    pub flash_assists: u32,
    pub enemies_flashed: u32,
    pub teammates_flashed: u32,
    pub flash_duration: f32,
    pub bomb_plants: u32,
    pub bomb_defuses: u32,
    pub money_spent: u32,
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub accuracy: f32,
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AdvancedPlayerStats {
    pub demo_file: DemoFileId,
    pub match_id: MatchId,
    pub player: PlayerKey,
    pub sample_size: u32,
    pub rating: f32,
    pub rating_one: f32,
    pub impact_rating: f32,
    pub kast_percentage: f32,
    pub kills_per_round: f32,
    pub deaths_per_round: f32,
    pub assists_per_round: f32,
    pub average_damage_per_round: f32,
    pub survival_rate: f32,
    pub first_kills_per_round: f32,
    pub first_deaths_per_round: f32,
    pub opening_duel_success_rate: f32,
    pub trade_kill_percentage: f32,
    pub headshot_percentage: f32,
    pub utility_damage_per_round: f32,
    pub flash_assists_per_round: f32,
    pub clutch_success_rate: f32,
    pub multi_kills_per_round: f32,
    pub eco_round_kills: u32,
    pub force_round_kills: u32,
    pub full_buy_round_kills: u32,
}
