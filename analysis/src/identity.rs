//! Maps volatile slots and pawn entity indices onto stable player keys.

use std::collections::HashMap;

use common::{DemoFileId, Player, PlayerKey, Position, Team};

use crate::input::{EntityIndex, Slot};

/// Latest known pawn state of a player, folded from snapshot deltas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PawnState {
    pub money: Option<u32>,
    pub equipment_value: Option<u32>,
    pub health: Option<u32>,
    pub armor: Option<u32>,
    pub has_helmet: bool,
    pub has_defuser: bool,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default)]
pub struct PawnDelta {
    pub money: Option<u32>,
    pub equipment_value: Option<u32>,
    pub health: Option<u32>,
    pub armor: Option<u32>,
    pub has_helmet: Option<bool>,
    pub has_defuser: Option<bool>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone)]
pub struct Connect {
    pub slot: Slot,
    pub user_id: Option<i32>,
    pub steam_id: Option<u64>,
    pub name: String,
    pub is_bot: bool,
    pub is_hltv: bool,
}

pub struct Resolver {
    demo_file: DemoFileId,
    players: Vec<Player>,
    by_steam_id: HashMap<u64, PlayerKey>,
    by_slot: HashMap<Slot, PlayerKey>,
    bot_slots: HashMap<Slot, PlayerKey>,
    pawn_to_slot: HashMap<EntityIndex, Slot>,
    pawn_states: HashMap<PlayerKey, PawnState>,
}

impl Resolver {
    pub fn new(demo_file: DemoFileId) -> Self {
        Self {
            demo_file,
            players: Vec::new(),
            by_steam_id: HashMap::new(),
            by_slot: HashMap::new(),
            bot_slots: HashMap::new(),
            pawn_to_slot: HashMap::new(),
            pawn_states: HashMap::new(),
        }
    }

    fn create(&mut self, connect: &Connect, steam_id: Option<u64>, tick: u32) -> PlayerKey {
        let key = PlayerKey(self.players.len() as u32);
        self.players.push(Player {
            key,
            demo_file: self.demo_file,
            slot: connect.slot.0,
            user_id: connect.user_id,
            steam_id,
            name: connect.name.clone(),
            team: Team::Unassigned,
            is_bot: connect.is_bot,
            is_hltv: connect.is_hltv,
            is_connected: true,
            connected_tick: tick,
            disconnected_tick: None,
            disconnect_reason: None,
        });

        tracing::debug!(?key, slot = connect.slot.0, ?steam_id, name = %connect.name, "New player");

        key
    }

    /// Returns the stable key for a connecting player, creating it the first time
    /// its persistent identity is seen.
    pub fn connect(&mut self, connect: Connect, tick: u32) -> PlayerKey {
        let steam_id = connect.steam_id.filter(|id| *id != 0);

        let key = if connect.is_bot {
            match self.bot_slots.get(&connect.slot) {
                Some(key) => *key,
                None => {
                    let key = self.create(&connect, None, tick);
                    self.bot_slots.insert(connect.slot, key);
                    key
                }
            }
        } else if let Some(steam_id) = steam_id {
            match self.by_steam_id.get(&steam_id) {
                Some(key) => *key,
                None => {
                    let key = self.create(&connect, Some(steam_id), tick);
                    self.by_steam_id.insert(steam_id, key);
                    key
                }
            }
        } else {
            // Nothing persistent to go by, never share the key with an earlier occupant.
            self.create(&connect, None, tick)
        };

        if let Some(previous) = self.by_slot.get(&connect.slot).copied() {
            if previous != key {
                tracing::debug!(
                    slot = connect.slot.0,
                    ?previous,
                    "Slot taken over without disconnect"
                );
                self.mark_disconnected(previous, tick, None);
            }
        }
        self.by_slot.insert(connect.slot, key);

        let player = &mut self.players[key.0 as usize];
        player.slot = connect.slot.0;
        player.user_id = connect.user_id.or(player.user_id);
        player.name = connect.name;
        player.is_connected = true;
        player.disconnected_tick = None;
        player.disconnect_reason = None;

        key
    }

    /// Late identity announcement for an occupied slot.
    pub fn update_info(
        &mut self,
        slot: Slot,
        steam_id: Option<u64>,
        name: Option<String>,
        tick: u32,
    ) -> Option<PlayerKey> {
        let mut key = self.by_slot.get(&slot).copied()?;
        let steam_id = steam_id.filter(|id| *id != 0);

        if let Some(steam_id) = steam_id {
            let current = &self.players[key.0 as usize];
            let can_attach = current.steam_id.is_none() && !current.is_bot;
            match self.by_steam_id.get(&steam_id).copied() {
                Some(existing) if existing != key => {
                    // Reconnect of a known player announced after the connect.
                    tracing::debug!(
                        slot = slot.0,
                        from = ?key,
                        to = ?existing,
                        "Moving slot onto known player"
                    );
                    self.mark_disconnected(key, tick, None);
                    self.by_slot.insert(slot, existing);
                    let player = &mut self.players[existing.0 as usize];
                    player.slot = slot.0;
                    player.is_connected = true;
                    player.disconnected_tick = None;
                    player.disconnect_reason = None;
                    key = existing;
                }
                Some(_) => {}
                None if can_attach => {
                    self.players[key.0 as usize].steam_id = Some(steam_id);
                    self.by_steam_id.insert(steam_id, key);
                }
                None => {
                    tracing::warn!(
                        slot = slot.0,
                        ?key,
                        steam_id,
                        "Conflicting steam id announcement ignored"
                    );
                }
            }
        }

        if let Some(name) = name {
            self.players[key.0 as usize].name = name;
        }

        Some(key)
    }

    fn mark_disconnected(&mut self, key: PlayerKey, tick: u32, reason: Option<String>) {
        let player = &mut self.players[key.0 as usize];
        player.is_connected = false;
        player.disconnected_tick = Some(tick);
        player.disconnect_reason = reason;
    }

    pub fn disconnect(
        &mut self,
        slot: Slot,
        reason: Option<String>,
        tick: u32,
    ) -> Option<PlayerKey> {
        let key = self.by_slot.remove(&slot)?;
        self.pawn_to_slot.retain(|_, s| *s != slot);
        self.mark_disconnected(key, tick, reason);
        Some(key)
    }

    pub fn set_team(&mut self, slot: Slot, team: Team) -> Option<PlayerKey> {
        let key = self.resolve_slot(slot)?;
        self.players[key.0 as usize].team = team;
        Some(key)
    }

    pub fn rename(&mut self, slot: Slot, name: String) -> Option<PlayerKey> {
        let key = self.resolve_slot(slot)?;
        self.players[key.0 as usize].name = name;
        Some(key)
    }

    pub fn assign_pawn(&mut self, slot: Slot, pawn: EntityIndex) -> Option<PlayerKey> {
        let key = self.resolve_slot(slot)?;
        self.pawn_to_slot.insert(pawn, slot);
        Some(key)
    }

    pub fn apply_snapshot(&mut self, pawn: EntityIndex, delta: PawnDelta) -> Option<PlayerKey> {
        let key = self.resolve_pawn(pawn)?;
        let state = self.pawn_states.entry(key).or_default();

        if delta.money.is_some() {
            state.money = delta.money;
        }
        if delta.equipment_value.is_some() {
            state.equipment_value = delta.equipment_value;
        }
        if delta.health.is_some() {
            state.health = delta.health;
        }
        if delta.armor.is_some() {
            state.armor = delta.armor;
        }
        if let Some(helmet) = delta.has_helmet {
            state.has_helmet = helmet;
        }
        if let Some(defuser) = delta.has_defuser {
            state.has_defuser = defuser;
        }
        if delta.position.is_some() {
            state.position = delta.position;
        }

        Some(key)
    }

    pub fn resolve_slot(&self, slot: Slot) -> Option<PlayerKey> {
        self.by_slot.get(&slot).copied()
    }

    pub fn resolve_pawn(&self, pawn: EntityIndex) -> Option<PlayerKey> {
        self.pawn_to_slot
            .get(&pawn)
            .and_then(|slot| self.resolve_slot(*slot))
    }

    pub fn player(&self, key: PlayerKey) -> Option<&Player> {
        self.players.get(key.0 as usize)
    }

    pub fn team_of(&self, key: PlayerKey) -> Option<Team> {
        self.player(key).map(|p| p.team)
    }

    pub fn pawn_state(&self, key: PlayerKey) -> Option<&PawnState> {
        self.pawn_states.get(&key)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Connected, non-spectator players currently on `team`.
    pub fn roster(&self, team: Team) -> impl Iterator<Item = &Player> + '_ {
        self.players
            .iter()
            .filter(move |p| p.is_connected && !p.is_hltv && p.team == team)
    }
}
