//! Turns combat, utility, bomb, economy, movement and objective records into fact
//! rows, one row per record, and keeps the rolling per-round state the derived
//! flags need.

use std::collections::{BTreeMap, HashMap};

use common::{
    AreaEffect, AreaKind, BombEvent, BombEventKind, Damage, EconomyEvent, EconomyEventKind,
    EconomyState, FactContext, Facts, FlashEvent, GrenadeEvent, GrenadeEventKind, GrenadeKind,
    GrenadeTrajectory, HostageEvent, HostageEventKind, Kill, PlayerKey, Position, PositionSample,
    RoundId, RoundType, Team, WeaponClass, WeaponFire, ZoneEvent, ZoneKind,
};

use crate::config::EngineConfig;
use crate::identity::Resolver;
use crate::input::{BombAction, EntityIndex, RecordKind, Slot};
use crate::tables;

#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    Kill(Kill),
    Damage(Damage),
    WeaponFire(WeaponFire),
    Grenade(GrenadeEvent),
    Bomb(BombEvent),
    Flash(FlashEvent),
    Economy(EconomyEvent),
    Position(PositionSample),
    Zone(ZoneEvent),
    Hostage(HostageEvent),
    Area(AreaEffect),
}

impl Fact {
    pub fn context(&self) -> &FactContext {
        match self {
            Self::Kill(f) => &f.ctx,
            Self::Damage(f) => &f.ctx,
            Self::WeaponFire(f) => &f.ctx,
            Self::Grenade(f) => &f.ctx,
            Self::Bomb(f) => &f.ctx,
            Self::Flash(f) => &f.ctx,
            Self::Economy(f) => &f.ctx,
            Self::Position(f) => &f.ctx,
            Self::Zone(f) => &f.ctx,
            Self::Hostage(f) => &f.ctx,
            Self::Area(f) => &f.ctx,
        }
    }

    pub fn store(self, facts: &mut Facts) {
        match self {
            Self::Kill(f) => facts.kills.push(f),
            Self::Damage(f) => facts.damages.push(f),
            Self::WeaponFire(f) => facts.weapon_fires.push(f),
            Self::Grenade(f) => facts.grenade_events.push(f),
            Self::Bomb(f) => facts.bomb_events.push(f),
            Self::Flash(f) => facts.flash_events.push(f),
            Self::Economy(f) => facts.economy_events.push(f),
            Self::Position(f) => facts.position_samples.push(f),
            Self::Zone(f) => facts.zone_events.push(f),
            Self::Hostage(f) => facts.hostage_events.push(f),
            Self::Area(f) => facts.area_effects.push(f),
        }
    }
}

/// A player left alone against at least one opponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clutch {
    pub player: PlayerKey,
    pub team: Team,
    /// Opponents alive when the situation arose. Never revised.
    pub size: u8,
    pub tick: u32,
}

#[derive(Debug, Clone, Copy)]
struct ActiveArea {
    player: Option<PlayerKey>,
    team: Option<Team>,
    start_time: f32,
}

#[derive(Debug, Clone)]
struct KillLogEntry {
    killer: Option<PlayerKey>,
    assister: Option<PlayerKey>,
    victim: Option<PlayerKey>,
    victim_team: Option<Team>,
    game_time: f32,
}

/// The working set of the round currently being played.
#[derive(Debug)]
pub struct RoundTracker {
    pub round: RoundId,
    pub start_tick: u32,
    pub freeze_end_time: Option<f32>,
    pub ended: bool,
    pub facts: Facts,

    /// Players that took part, with the team they played for.
    pub participants: BTreeMap<PlayerKey, Team>,
    alive: HashMap<PlayerKey, Team>,
    pub live_at_start: HashMap<Team, u32>,

    kill_log: Vec<KillLogEntry>,
    first_kill_seen: bool,
    pub clutches: BTreeMap<PlayerKey, Clutch>,

    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub bomb_exploded: bool,
    pub bomb_site: Option<String>,

    knife_events: u32,
    weapon_events: u32,

    grenades: HashMap<EntityIndex, GrenadeTrajectory>,
    pub trajectories: Vec<GrenadeTrajectory>,

    zone_entries: HashMap<(PlayerKey, ZoneKind), f32>,
    hostage_follows: HashMap<EntityIndex, f32>,
    areas: HashMap<(AreaKind, EntityIndex), ActiveArea>,

    /// Money and equipment value per player, captured at freeze end.
    pub start_economy: HashMap<PlayerKey, (u32, u32)>,
    pub economy_states: Vec<EconomyState>,
    pub round_types: HashMap<Team, RoundType>,
}

impl RoundTracker {
    pub fn open(round: RoundId, start_tick: u32, resolver: &Resolver) -> Self {
        let mut tracker = Self {
            round,
            start_tick,
            freeze_end_time: None,
            ended: false,
            facts: Facts::default(),
            participants: BTreeMap::new(),
            alive: HashMap::new(),
            live_at_start: HashMap::new(),
            kill_log: Vec::new(),
            first_kill_seen: false,
            clutches: BTreeMap::new(),
            bomb_planted: false,
            bomb_defused: false,
            bomb_exploded: false,
            bomb_site: None,
            knife_events: 0,
            weapon_events: 0,
            grenades: HashMap::new(),
            zone_entries: HashMap::new(),
            hostage_follows: HashMap::new(),
            areas: HashMap::new(),
            trajectories: Vec::new(),
            start_economy: HashMap::new(),
            economy_states: Vec::new(),
            round_types: HashMap::new(),
        };

        for team in [Team::Terrorist, Team::CounterTerrorist] {
            let mut count = 0;
            for player in resolver.roster(team) {
                tracker.alive.insert(player.key, team);
                tracker.participants.insert(player.key, team);
                count += 1;
            }
            tracker.live_at_start.insert(team, count);
        }

        tracker
    }

    pub fn alive_count(&self, team: Team) -> u32 {
        self.alive.values().filter(|t| **t == team).count() as u32
    }

    fn alive_count_u8(&self, team: Team) -> u8 {
        self.alive_count(team).min(u8::MAX as u32) as u8
    }

    pub fn is_alive(&self, player: PlayerKey) -> bool {
        self.alive.contains_key(&player)
    }

    pub fn spawn(&mut self, player: PlayerKey, team: Team) {
        if !team.is_playing() || self.ended {
            return;
        }

        self.participants.insert(player, team);
        if self.alive.insert(player, team).is_none() && self.freeze_end_time.is_none() {
            *self.live_at_start.entry(team).or_default() += 1;
        }
    }

    pub fn leave(&mut self, player: PlayerKey, tick: u32) {
        if self.alive.remove(&player).is_some() {
            self.detect_clutches(tick);
        }
    }

    /// Rosters are settled once freeze time is over, a round can start as a clutch.
    pub fn freeze_end(&mut self, tick: u32, game_time: f32) {
        self.freeze_end_time = Some(game_time);
        self.detect_clutches(tick);
    }

    pub fn is_buy_time(&self, game_time: f32, buy_time_secs: f32) -> bool {
        match self.freeze_end_time {
            None => !self.ended,
            Some(start) => game_time - start <= buy_time_secs,
        }
    }

    pub fn clutch_of(&self, player: PlayerKey) -> Option<&Clutch> {
        self.clutches.get(&player)
    }

    fn clutch_of_team(&self, team: Team) -> Option<&Clutch> {
        self.clutches.values().find(|c| c.team == team)
    }

    fn detect_clutches(&mut self, tick: u32) {
        if self.ended {
            return;
        }

        for team in [Team::Terrorist, Team::CounterTerrorist] {
            if self.clutch_of_team(team).is_some() {
                continue;
            }

            let own = self.alive_count(team);
            let enemies = team.opponent().map(|o| self.alive_count(o)).unwrap_or(0);
            if own != 1 || enemies == 0 {
                continue;
            }

            let player = self
                .alive
                .iter()
                .find(|(_, t)| **t == team)
                .map(|(p, _)| *p);
            if let Some(player) = player {
                tracing::debug!(?player, ?team, enemies, tick, "Clutch");
                self.clutches.insert(
                    player,
                    Clutch {
                        player,
                        team,
                        size: enemies.min(u8::MAX as u32) as u8,
                        tick,
                    },
                );
            }
        }
    }

    /// Most recent teammate of `avenger_team` that `victim` killed or helped kill
    /// inside the window.
    fn traded_teammate(
        &self,
        victim: PlayerKey,
        avenger_team: Team,
        now: f32,
        window: f32,
    ) -> Option<PlayerKey> {
        self.kill_log
            .iter()
            .rev()
            .take_while(|entry| now - entry.game_time <= window)
            .find(|entry| {
                (entry.killer == Some(victim) || entry.assister == Some(victim))
                    && entry.victim_team == Some(avenger_team)
                    && entry.victim != Some(victim)
            })
            .and_then(|entry| entry.victim)
    }

    fn note_weapon(&mut self, class: WeaponClass) {
        match class {
            WeaponClass::Knife => self.knife_events += 1,
            c if c.is_firearm() || c.is_utility() => self.weapon_events += 1,
            _ => {}
        }
    }

    /// Only knives were used, and enough of them.
    pub fn is_knife_only(&self, min_events: u32) -> bool {
        self.weapon_events == 0 && self.knife_events >= min_events.max(1)
    }

    fn grenade_thrown(
        &mut self,
        entity: EntityIndex,
        player: Option<PlayerKey>,
        team: Option<Team>,
        grenade: GrenadeKind,
        ctx: &FactContext,
        position: Option<Position>,
    ) {
        let trajectory = GrenadeTrajectory {
            demo_file: ctx.demo_file,
            round: self.round,
            entity: entity.0,
            player,
            team,
            grenade,
            throw_tick: ctx.tick,
            throw_time: ctx.game_time,
            detonate_tick: None,
            detonate_time: None,
            flight_time: None,
            bounce_count: 0,
            throw_position: position,
            detonate_position: None,
            players_affected: 0,
            enemies_affected: 0,
            teammates_affected: 0,
            total_flash_duration: 0.0,
        };

        // Entity indices are recycled, retire whatever used this one before.
        if let Some(previous) = self.grenades.insert(entity, trajectory) {
            self.trajectories.push(previous);
        }
    }

    fn grenade_owner(
        &self,
        entity: EntityIndex,
    ) -> Option<(Option<PlayerKey>, Option<Team>, GrenadeKind)> {
        self.grenades.get(&entity).map(|g| (g.player, g.team, g.grenade))
    }

    fn grenade_bounce(&mut self, entity: EntityIndex) {
        if let Some(g) = self.grenades.get_mut(&entity) {
            g.bounce_count += 1;
        }
    }

    fn grenade_detonate(
        &mut self,
        entity: EntityIndex,
        ctx: &FactContext,
        position: Option<Position>,
    ) {
        if let Some(g) = self.grenades.get_mut(&entity) {
            if g.detonate_tick.is_none() {
                g.detonate_tick = Some(ctx.tick);
                g.detonate_time = Some(ctx.game_time);
                g.flight_time = Some((ctx.game_time - g.throw_time).max(0.0));
                g.detonate_position = position;
            }
        }
    }

    fn grenade_flash(&mut self, entity: EntityIndex, enemy: bool, teammate: bool, duration: f32) {
        if let Some(g) = self.grenades.get_mut(&entity) {
            g.players_affected += 1;
            if enemy {
                g.enemies_affected += 1;
            }
            if teammate {
                g.teammates_affected += 1;
            }
            g.total_flash_duration += duration;
        }
    }

    fn zone_enter(&mut self, player: PlayerKey, zone: ZoneKind, now: f32) {
        self.zone_entries.insert((player, zone), now);
    }

    fn zone_exit(&mut self, player: PlayerKey, zone: ZoneKind, now: f32) -> Option<f32> {
        let entered = self.zone_entries.remove(&(player, zone))?;
        Some((now - entered).max(0.0))
    }

    /// Follow time of the hostage, ended by anything but a new follow or a hurt.
    fn hostage_event(
        &mut self,
        hostage: EntityIndex,
        event: HostageEventKind,
        now: f32,
    ) -> Option<f32> {
        match event {
            HostageEventKind::Follows => {
                self.hostage_follows.insert(hostage, now);
                None
            }
            HostageEventKind::Hurt | HostageEventKind::CallForHelp => None,
            HostageEventKind::StopsFollowing
            | HostageEventKind::Killed
            | HostageEventKind::Rescued => {
                let since = self.hostage_follows.remove(&hostage)?;
                Some((now - since).max(0.0))
            }
        }
    }

    fn area_start(&mut self, kind: AreaKind, entity: EntityIndex, area: ActiveArea) {
        self.areas.insert((kind, entity), area);
    }

    fn area_end(&mut self, kind: AreaKind, entity: EntityIndex) -> Option<ActiveArea> {
        self.areas.remove(&(kind, entity))
    }

    /// All trajectories of the round ordered by throw.
    pub fn take_trajectories(&mut self) -> Vec<GrenadeTrajectory> {
        let mut all = std::mem::take(&mut self.trajectories);
        all.extend(self.grenades.drain().map(|(_, g)| g));
        all.sort_by(|a, b| a.throw_tick.cmp(&b.throw_tick).then(a.entity.cmp(&b.entity)));
        all
    }
}

fn resolve(resolver: &Resolver, slot: Option<Slot>, unresolved: &mut bool) -> Option<PlayerKey> {
    let slot = slot?;
    let key = resolver.resolve_slot(slot);
    if key.is_none() {
        *unresolved = true;
    }
    key
}

fn playing_team(resolver: &Resolver, player: Option<PlayerKey>) -> Option<Team> {
    player.and_then(|p| resolver.team_of(p))
}

fn distance(a: Option<Position>, b: Option<Position>) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.distance(&b)),
        _ => None,
    }
}

fn same_side(a: Option<Team>, b: Option<Team>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.is_playing() && a == b,
        _ => false,
    }
}

fn bomb_event_kind(action: BombAction) -> BombEventKind {
    match action {
        BombAction::BeginPlant => BombEventKind::BeginPlant,
        BombAction::AbortPlant => BombEventKind::AbortPlant,
        BombAction::Planted => BombEventKind::Planted,
        BombAction::BeginDefuse => BombEventKind::BeginDefuse,
        BombAction::AbortDefuse => BombEventKind::AbortDefuse,
        BombAction::Defused => BombEventKind::Defused,
        BombAction::Exploded => BombEventKind::Exploded,
        BombAction::Dropped => BombEventKind::Dropped,
        BombAction::Pickup => BombEventKind::Pickup,
    }
}

/// Produces the fact row for `kind`, updating the round's rolling state on the way.
///
/// Returns `None` for records that are not facts.
pub fn classify(
    kind: &RecordKind,
    mut ctx: FactContext,
    resolver: &Resolver,
    config: &EngineConfig,
    mut tracker: Option<&mut RoundTracker>,
) -> Option<Fact> {
    let fact = match kind {
        RecordKind::PlayerDeath {
            victim,
            attacker,
            assister,
            weapon,
            headshot,
            penetrated,
            noscope,
            thrusmoke,
            attackerblind,
            assistedflash,
            attacker_position,
            victim_position,
        } => {
            let killer = resolve(resolver, *attacker, &mut ctx.unresolved);
            let victim = resolve(resolver, *victim, &mut ctx.unresolved);
            let assister = resolve(resolver, *assister, &mut ctx.unresolved);
            let killer_team = playing_team(resolver, killer);
            let victim_team = playing_team(resolver, victim);
            let weapon_class = tables::weapon_class(weapon.as_deref());

            let is_suicide = victim.is_some() && killer == victim;
            let is_team_kill = !is_suicide && same_side(killer_team, victim_team);

            let mut kill = Kill {
                ctx,
                killer,
                victim,
                assister,
                killer_team,
                victim_team,
                weapon: weapon.clone(),
                weapon_class,
                is_headshot: *headshot,
                is_wallbang: *penetrated > 0,
                penetration: *penetrated,
                is_noscope: *noscope,
                through_smoke: *thrusmoke,
                attacker_blind: *attackerblind,
                is_flash_assist: *assistedflash,
                is_team_kill,
                is_suicide,
                is_first_kill: false,
                is_trade_kill: false,
                traded_player: None,
                is_critical_trade: false,
                is_clutch: false,
                clutch_size: 0,
                killer_team_alive: 0,
                victim_team_alive: 0,
                distance: distance(*attacker_position, *victim_position),
                killer_position: *attacker_position,
                victim_position: *victim_position,
            };

            if let Some(tracker) = tracker.as_deref_mut() {
                tracker.note_weapon(weapon_class);
                // Rounds without a freeze end marker
                tracker.detect_clutches(kill.ctx.tick);

                kill.is_first_kill = !tracker.first_kill_seen;
                tracker.first_kill_seen = true;

                if let (Some(k), Some(v), Some(kt)) = (killer, victim, killer_team) {
                    if !is_suicide && !is_team_kill {
                        kill.traded_player = tracker.traded_teammate(
                            v,
                            kt,
                            kill.ctx.game_time,
                            config.trade_window_secs,
                        );
                        kill.is_trade_kill = kill.traded_player.is_some();

                        let own_alive = tracker.alive_count(kt);
                        let enemy_alive =
                            kt.opponent().map(|o| tracker.alive_count(o)).unwrap_or(0);
                        kill.is_critical_trade = kill.is_trade_kill && own_alive <= enemy_alive;
                    }

                    if let Some(clutch) = tracker.clutch_of(k) {
                        kill.is_clutch = true;
                        kill.clutch_size = clutch.size;
                    }
                }

                tracker.kill_log.push(KillLogEntry {
                    killer,
                    assister,
                    victim,
                    victim_team,
                    game_time: kill.ctx.game_time,
                });

                if let Some(v) = victim {
                    tracker.alive.remove(&v);
                }
                tracker.detect_clutches(kill.ctx.tick);

                kill.killer_team_alive =
                    killer_team.map(|t| tracker.alive_count_u8(t)).unwrap_or(0);
                kill.victim_team_alive =
                    victim_team.map(|t| tracker.alive_count_u8(t)).unwrap_or(0);
            }

            Fact::Kill(kill)
        }

        RecordKind::PlayerHurt {
            victim,
            attacker,
            weapon,
            dmg_health,
            dmg_armor,
            health,
            armor,
            hitgroup,
            attacker_position,
            victim_position,
        } => {
            let attacker = resolve(resolver, *attacker, &mut ctx.unresolved);
            let victim = resolve(resolver, *victim, &mut ctx.unresolved);
            let attacker_team = playing_team(resolver, attacker);
            let victim_team = playing_team(resolver, victim);
            let is_self_damage = victim.is_some() && attacker == victim;

            Fact::Damage(Damage {
                ctx,
                attacker,
                victim,
                attacker_team,
                victim_team,
                weapon: weapon.clone(),
                weapon_class: tables::weapon_class(weapon.as_deref()),
                hitgroup: *hitgroup,
                damage_health: *dmg_health,
                damage_armor: *dmg_armor,
                health: *health,
                armor: *armor,
                is_headshot: *hitgroup == Some(1),
                is_team_damage: !is_self_damage && same_side(attacker_team, victim_team),
                is_self_damage,
                is_fatal: *health == 0,
                distance: distance(*attacker_position, *victim_position),
            })
        }

        RecordKind::WeaponFire {
            slot,
            weapon,
            silenced,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let weapon_class = tables::weapon_class(weapon.as_deref());
            if let Some(tracker) = tracker.as_deref_mut() {
                tracker.note_weapon(weapon_class);
            }

            Fact::WeaponFire(WeaponFire {
                ctx,
                player,
                team: playing_team(resolver, player),
                weapon: weapon.clone(),
                weapon_class,
                is_silenced: *silenced,
                position: *position,
            })
        }

        RecordKind::GrenadeThrown {
            slot,
            entity,
            weapon,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let team = playing_team(resolver, player);
            let grenade = GrenadeKind::from_weapon(weapon);

            if let (Some(tracker), Some(entity)) = (tracker.as_deref_mut(), entity) {
                tracker.grenade_thrown(*entity, player, team, grenade, &ctx, *position);
            }

            Fact::Grenade(GrenadeEvent {
                ctx,
                player,
                team,
                entity: entity.map(|e| e.0),
                grenade,
                event: GrenadeEventKind::Thrown,
                position: *position,
            })
        }

        RecordKind::GrenadeBounce { entity, position } => {
            let owner = tracker.as_deref().and_then(|t| t.grenade_owner(*entity));
            if let Some(tracker) = tracker.as_deref_mut() {
                tracker.grenade_bounce(*entity);
            }

            Fact::Grenade(GrenadeEvent {
                ctx,
                player: owner.and_then(|(p, _, _)| p),
                team: owner.and_then(|(_, t, _)| t),
                entity: Some(entity.0),
                grenade: owner.map(|(_, _, g)| g).unwrap_or(GrenadeKind::Unknown),
                event: GrenadeEventKind::Bounce,
                position: *position,
            })
        }

        RecordKind::GrenadeDetonate {
            slot,
            entity,
            weapon,
            position,
        } => {
            let owner = entity.and_then(|e| tracker.as_deref().and_then(|t| t.grenade_owner(e)));
            let player = match slot {
                Some(_) => resolve(resolver, *slot, &mut ctx.unresolved),
                None => owner.and_then(|(p, _, _)| p),
            };
            let team = playing_team(resolver, player).or(owner.and_then(|(_, t, _)| t));

            if let (Some(tracker), Some(entity)) = (tracker.as_deref_mut(), entity) {
                tracker.grenade_detonate(*entity, &ctx, *position);
            }

            Fact::Grenade(GrenadeEvent {
                ctx,
                player,
                team,
                entity: entity.map(|e| e.0),
                grenade: GrenadeKind::from_weapon(weapon),
                event: GrenadeEventKind::Detonate,
                position: *position,
            })
        }

        RecordKind::GrenadeExpired {
            entity,
            weapon,
            position,
        } => {
            let owner = entity.and_then(|e| tracker.as_deref().and_then(|t| t.grenade_owner(e)));

            Fact::Grenade(GrenadeEvent {
                ctx,
                player: owner.and_then(|(p, _, _)| p),
                team: owner.and_then(|(_, t, _)| t),
                entity: entity.map(|e| e.0),
                grenade: GrenadeKind::from_weapon(weapon),
                event: GrenadeEventKind::Expired,
                position: *position,
            })
        }

        RecordKind::PlayerBlind {
            victim,
            attacker,
            entity,
            duration,
        } => {
            let flashed = resolve(resolver, *victim, &mut ctx.unresolved);
            let flasher = resolve(resolver, *attacker, &mut ctx.unresolved);
            let flashed_team = playing_team(resolver, flashed);
            let flasher_team = playing_team(resolver, flasher);
            let is_self_flash = flashed.is_some() && flashed == flasher;
            let is_team_flash = !is_self_flash && same_side(flashed_team, flasher_team);
            let is_enemy = !is_self_flash
                && !is_team_flash
                && flashed_team.is_some()
                && flasher_team.is_some();

            if let (Some(tracker), Some(entity)) = (tracker.as_deref_mut(), entity) {
                tracker.grenade_flash(*entity, is_enemy, is_team_flash, *duration);
            }

            Fact::Flash(FlashEvent {
                ctx,
                flashed,
                flasher,
                flashed_team,
                flasher_team,
                grenade_entity: entity.map(|e| e.0),
                duration: *duration,
                is_team_flash,
                is_self_flash,
            })
        }

        RecordKind::Bomb {
            slot,
            action,
            site,
            has_kit,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let team = playing_team(resolver, player);
            let event = bomb_event_kind(*action);

            let mut row = BombEvent {
                ctx,
                player,
                team,
                event,
                site: site.clone(),
                has_kit: *has_kit,
                is_clutch: false,
                clutch_size: 0,
                position: *position,
            };

            if let Some(tracker) = tracker.as_deref_mut() {
                match event {
                    BombEventKind::Planted => {
                        tracker.bomb_planted = true;
                        if site.is_some() {
                            tracker.bomb_site = site.clone();
                        }
                    }
                    BombEventKind::Defused => tracker.bomb_defused = true,
                    BombEventKind::Exploded => tracker.bomb_exploded = true,
                    _ => {}
                }

                if row.site.is_none() {
                    row.site = tracker.bomb_site.clone();
                }

                if let Some(clutch) = player.and_then(|p| tracker.clutch_of(p)) {
                    row.is_clutch = true;
                    row.clutch_size = clutch.size;
                }
            }

            Fact::Bomb(row)
        }

        RecordKind::ItemPurchase { slot, item, cost } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let item_cost = cost.or_else(|| tables::item_price(item));
            let money_before = player
                .and_then(|p| resolver.pawn_state(p))
                .and_then(|s| s.money);
            let money_after = money_before.map(|m| m.saturating_sub(item_cost.unwrap_or(0)));
            let is_buy_time = tracker
                .as_deref()
                .map(|t| t.is_buy_time(ctx.game_time, config.buy_time_secs))
                .unwrap_or(false);

            Fact::Economy(EconomyEvent {
                ctx,
                player,
                team: playing_team(resolver, player),
                event: EconomyEventKind::Purchase,
                item: item.clone(),
                item_class: tables::weapon_class(Some(item.as_str())),
                item_cost,
                money_before,
                money_after,
                is_buy_time,
            })
        }

        RecordKind::ItemPickup { slot, item } | RecordKind::ItemDrop { slot, item } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let money = player
                .and_then(|p| resolver.pawn_state(p))
                .and_then(|s| s.money);
            let event = match kind {
                RecordKind::ItemPickup { .. } => EconomyEventKind::Pickup,
                _ => EconomyEventKind::Drop,
            };
            let is_buy_time = tracker
                .as_deref()
                .map(|t| t.is_buy_time(ctx.game_time, config.buy_time_secs))
                .unwrap_or(false);

            Fact::Economy(EconomyEvent {
                ctx,
                player,
                team: playing_team(resolver, player),
                event,
                item: item.clone(),
                item_class: tables::weapon_class(Some(item.as_str())),
                item_cost: tables::item_price(item),
                money_before: money,
                money_after: money,
                is_buy_time,
            })
        }

        RecordKind::PlayerPosition {
            pawn,
            position,
            yaw,
            pitch,
            velocity,
            active_weapon,
            is_scoped,
            is_crouching,
        } => {
            let interval = config.position_sample_interval;
            if interval == 0 || ctx.tick % interval != 0 {
                return None;
            }

            let player = resolver.resolve_pawn(*pawn);
            if player.is_none() {
                ctx.unresolved = true;
            }
            let state = player.and_then(|p| resolver.pawn_state(p));
            let health = state.and_then(|s| s.health);
            let is_alive = match (player, tracker.as_deref()) {
                (Some(p), Some(tracker)) => tracker.is_alive(p),
                _ => health.map(|h| h > 0).unwrap_or(false),
            };

            Fact::Position(PositionSample {
                ctx,
                player,
                team: playing_team(resolver, player),
                position: *position,
                yaw: *yaw,
                pitch: *pitch,
                speed: velocity.map(|v| (v.x * v.x + v.y * v.y).sqrt()),
                is_alive,
                health,
                armor: state.and_then(|s| s.armor),
                has_helmet: state.map(|s| s.has_helmet).unwrap_or(false),
                has_defuser: state.map(|s| s.has_defuser).unwrap_or(false),
                money: state.and_then(|s| s.money),
                active_weapon: active_weapon.clone(),
                is_scoped: *is_scoped,
                is_crouching: *is_crouching,
            })
        }

        RecordKind::ZoneEnter {
            slot,
            zone,
            has_bomb,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            if let (Some(tracker), Some(p)) = (tracker.as_deref_mut(), player) {
                tracker.zone_enter(p, *zone, ctx.game_time);
            }

            Fact::Zone(ZoneEvent {
                ctx,
                player,
                team: playing_team(resolver, player),
                zone: *zone,
                entered: true,
                has_bomb: *has_bomb,
                time_in_zone: None,
                position: *position,
            })
        }

        RecordKind::ZoneExit {
            slot,
            zone,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let time_in_zone = match (tracker.as_deref_mut(), player) {
                (Some(tracker), Some(p)) => tracker.zone_exit(p, *zone, ctx.game_time),
                _ => None,
            };

            Fact::Zone(ZoneEvent {
                ctx,
                player,
                team: playing_team(resolver, player),
                zone: *zone,
                entered: false,
                has_bomb: false,
                time_in_zone,
                position: *position,
            })
        }

        RecordKind::Hostage {
            slot,
            hostage,
            action,
            position,
        } => {
            let player = resolve(resolver, *slot, &mut ctx.unresolved);
            let follow_duration = tracker
                .as_deref_mut()
                .and_then(|t| t.hostage_event(*hostage, *action, ctx.game_time));

            Fact::Hostage(HostageEvent {
                ctx,
                player,
                team: playing_team(resolver, player),
                hostage: hostage.0,
                event: *action,
                follow_duration,
                position: *position,
            })
        }

        RecordKind::AreaStart {
            kind: area,
            entity,
            slot,
            position,
        } => {
            // Smokes share the projectile's entity, so the thrower is known from the throw
            let owner = tracker.as_deref().and_then(|t| t.grenade_owner(*entity));
            let player = match slot {
                Some(_) => resolve(resolver, *slot, &mut ctx.unresolved),
                None => owner.and_then(|(p, _, _)| p),
            };
            let team = playing_team(resolver, player).or(owner.and_then(|(_, t, _)| t));

            if let Some(tracker) = tracker.as_deref_mut() {
                let active = ActiveArea {
                    player,
                    team,
                    start_time: ctx.game_time,
                };
                tracker.area_start(*area, *entity, active);
            }

            Fact::Area(AreaEffect {
                ctx,
                player,
                team,
                kind: *area,
                entity: entity.0,
                started: true,
                duration: None,
                position: *position,
            })
        }

        RecordKind::AreaEnd {
            kind: area,
            entity,
            position,
        } => {
            let started = tracker.as_deref_mut().and_then(|t| t.area_end(*area, *entity));
            let duration = started.map(|a| (ctx.game_time - a.start_time).max(0.0));

            Fact::Area(AreaEffect {
                ctx,
                player: started.and_then(|a| a.player),
                team: started.and_then(|a| a.team),
                kind: *area,
                entity: entity.0,
                started: false,
                duration,
                position: *position,
            })
        }

        _ => return None,
    };

    Some(fact)
}
