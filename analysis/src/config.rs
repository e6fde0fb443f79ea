//! Tunables consumed by the engine. Loading them is the caller's business.

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Game-time window in which a kill on the previous killer counts as a trade.
    pub trade_window_secs: f32,
    /// Seconds after freeze end during which purchases count as buy time.
    pub buy_time_secs: f32,
    /// Used to derive game time when a record carries none and no header was seen.
    pub default_tick_rate: u32,
    /// Position samples are kept on ticks divisible by this, 0 drops them all.
    pub position_sample_interval: u32,
    pub economy: EconomyThresholds,
    pub rating: RatingWeights,
    pub rounds: RoundRules,
    pub knife: KnifeDetection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trade_window_secs: 5.0,
            buy_time_secs: 20.0,
            default_tick_rate: 64,
            position_sample_interval: 16,
            economy: EconomyThresholds::default(),
            rating: RatingWeights::default(),
            rounds: RoundRules::default(),
            knife: KnifeDetection::default(),
        }
    }
}

/// Average spend capacity (money plus equipment value) per player.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EconomyThresholds {
    /// Below this a team is on an eco.
    pub eco_threshold: u32,
    /// At or above this a team is on a full buy, in between it is a force buy.
    pub full_buy_threshold: u32,
    /// Per player money needed to count as able to full buy.
    pub full_buy_player_money: u32,
}

impl Default for EconomyThresholds {
    fn default() -> Self {
        Self {
            eco_threshold: 2000,
            full_buy_threshold: 3500,
            full_buy_player_money: 4000,
        }
    }
}

/// Coefficients of the rating:
///
/// `kast * (kast_rate / kast_baseline) + kill * (kpr / kpr_baseline)
///  + damage * (adr / adr_baseline) + survival * (survival_rate / survival_baseline)`
///
/// With the defaults an average player lands on 1.0.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RatingWeights {
    pub kast: f32,
    pub kill: f32,
    pub damage: f32,
    pub survival: f32,
    pub kast_baseline: f32,
    pub kills_per_round_baseline: f32,
    pub adr_baseline: f32,
    pub survival_baseline: f32,
}

impl Default for RatingWeights {
    fn default() -> Self {
        Self {
            kast: 0.25,
            kill: 0.35,
            damage: 0.25,
            survival: 0.15,
            kast_baseline: 0.72,
            kills_per_round_baseline: 0.679,
            adr_baseline: 76.0,
            survival_baseline: 0.317,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// Regulation length; a team wins on `max_rounds / 2 + 1`.
    pub max_rounds: u32,
    /// Length of one overtime block.
    pub overtime_max_rounds: u32,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            max_rounds: 24,
            overtime_max_rounds: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KnifeDetection {
    /// Kills and shots needed before a knife-only round is tagged as knife round.
    pub min_knife_events: u32,
}

impl Default for KnifeDetection {
    fn default() -> Self {
        Self { min_knife_events: 1 }
    }
}
