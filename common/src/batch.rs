use crate::*;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Facts {
    pub kills: Vec<Kill>,
    pub damages: Vec<Damage>,
    pub weapon_fires: Vec<WeaponFire>,
    pub grenade_events: Vec<GrenadeEvent>,
    pub bomb_events: Vec<BombEvent>,
    pub flash_events: Vec<FlashEvent>,
    pub economy_events: Vec<EconomyEvent>,
    pub position_samples: Vec<PositionSample>,
    pub zone_events: Vec<ZoneEvent>,
    pub hostage_events: Vec<HostageEvent>,
    pub area_effects: Vec<AreaEffect>,
}

impl Facts {
    pub fn len(&self) -> usize {
        self.kills.len()
            + self.damages.len()
            + self.weapon_fires.len()
            + self.grenade_events.len()
            + self.bomb_events.len()
            + self.flash_events.len()
            + self.economy_events.len()
            + self.position_samples.len()
            + self.zone_events.len()
            + self.hostage_events.len()
            + self.area_effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contexts(&self) -> impl Iterator<Item = &FactContext> + '_ {
        self.kills
            .iter()
            .map(|k| &k.ctx)
            .chain(self.damages.iter().map(|d| &d.ctx))
            .chain(self.weapon_fires.iter().map(|w| &w.ctx))
            .chain(self.grenade_events.iter().map(|g| &g.ctx))
            .chain(self.bomb_events.iter().map(|b| &b.ctx))
            .chain(self.flash_events.iter().map(|f| &f.ctx))
            .chain(self.economy_events.iter().map(|e| &e.ctx))
            .chain(self.position_samples.iter().map(|p| &p.ctx))
            .chain(self.zone_events.iter().map(|z| &z.ctx))
            .chain(self.hostage_events.iter().map(|h| &h.ctx))
            .chain(self.area_effects.iter().map(|a| &a.ctx))
    }
}

/// Everything finalized for one round, in the order it has to be stored:
/// match, round, players, facts, aggregates.
///
/// A batch without a round carries facts observed outside of any round.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundBatch {
    pub demo_file: DemoFileId,
    pub match_row: Option<Match>,
    pub round: Option<Round>,
    pub players: Vec<Player>,
    pub facts: Facts,
    pub economy_states: Vec<EconomyState>,
    pub grenade_trajectories: Vec<GrenadeTrajectory>,
    pub player_round_stats: Vec<PlayerRoundStats>,
    pub round_impacts: Vec<RoundImpact>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MatchBatch {
    pub demo_file: DemoFile,
    pub match_row: Option<Match>,
    pub players: Vec<Player>,
    pub player_match_stats: Vec<PlayerMatchStats>,
    pub advanced_player_stats: Vec<AdvancedPlayerStats>,
}
