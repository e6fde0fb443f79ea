#![allow(dead_code)]

use std::sync::atomic::AtomicBool;

use analysis::input::{BombAction, EntityIndex, Record, RecordKind, Slot};
use analysis::{DecodeError, EngineConfig, MemorySink, Session, Summary};
use common::{DemoFile, DemoFileId, Team};

pub const CT_SLOTS: [i32; 5] = [1, 2, 3, 4, 5];
pub const T_SLOTS: [i32; 5] = [6, 7, 8, 9, 10];

pub fn demo_file() -> DemoFile {
    DemoFile {
        id: DemoFileId(uuid::Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0001)),
        file_name: "synthetic.dem".to_owned(),
        map: None,
        server_name: None,
        source: None,
        tick_rate: 64,
        total_ticks: 0,
    }
}

#[derive(Debug, Clone)]
pub struct Stream {
    pub records: Vec<Record>,
}

impl Stream {
    pub fn new() -> Self {
        let mut stream = Self { records: Vec::new() };
        stream.push(
            0,
            RecordKind::Header {
                map: Some("de_test".to_owned()),
                tick_rate: Some(64),
                server_name: Some("local".to_owned()),
                source: Some("valve".to_owned()),
                max_rounds: None,
            },
        );
        stream
    }

    pub fn push(&mut self, tick: u32, kind: RecordKind) -> &mut Self {
        self.records.push(Record::new(tick, kind));
        self
    }

    pub fn timed(&mut self, tick: u32, game_time: f32, kind: RecordKind) -> &mut Self {
        self.records.push(Record::at(tick, game_time, kind));
        self
    }

    pub fn player(&mut self, tick: u32, slot: i32, steam_id: u64, team: Team) -> &mut Self {
        self.push(
            tick,
            RecordKind::PlayerConnect {
                slot: Slot(slot),
                user_id: Some(slot),
                steam_id: Some(steam_id),
                name: format!("player{}", slot),
                is_bot: false,
                is_hltv: false,
            },
        )
        .push(tick, RecordKind::PlayerTeam { slot: Slot(slot), team })
    }

    /// Five against five, steam ids are `76561190000000000 + slot`.
    pub fn five_v_five(&mut self) -> &mut Self {
        for slot in CT_SLOTS {
            self.player(0, slot, steam(slot), Team::CounterTerrorist);
        }
        for slot in T_SLOTS {
            self.player(0, slot, steam(slot), Team::Terrorist);
        }
        self
    }

    pub fn spawn(&mut self, tick: u32, slot: i32, pawn: i32) -> &mut Self {
        self.push(
            tick,
            RecordKind::PlayerSpawn {
                slot: Slot(slot),
                pawn: Some(EntityIndex(pawn)),
            },
        )
    }

    pub fn money(&mut self, tick: u32, pawn: i32, money: u32, equipment_value: u32) -> &mut Self {
        self.push(
            tick,
            RecordKind::PlayerSnapshot {
                pawn: EntityIndex(pawn),
                money: Some(money),
                equipment_value: Some(equipment_value),
                health: Some(100),
                armor: None,
                has_helmet: None,
                has_defuser: None,
                position: None,
            },
        )
    }

    pub fn kill(&mut self, tick: u32, attacker: i32, victim: i32) -> &mut Self {
        self.push(tick, death(Some(attacker), Some(victim), "weapon_ak47"))
    }

    pub fn kill_at(&mut self, tick: u32, game_time: f32, attacker: i32, victim: i32) -> &mut Self {
        self.timed(tick, game_time, death(Some(attacker), Some(victim), "weapon_ak47"))
    }

    pub fn knife_kill(&mut self, tick: u32, attacker: i32, victim: i32) -> &mut Self {
        self.push(tick, death(Some(attacker), Some(victim), "weapon_knife"))
    }

    pub fn hurt(
        &mut self,
        tick: u32,
        attacker: i32,
        victim: i32,
        damage: u32,
        health: u32,
    ) -> &mut Self {
        self.push(
            tick,
            RecordKind::PlayerHurt {
                victim: Some(Slot(victim)),
                attacker: Some(Slot(attacker)),
                weapon: Some("weapon_ak47".to_owned()),
                dmg_health: damage,
                dmg_armor: 0,
                health,
                armor: 100,
                hitgroup: Some(2),
                attacker_position: None,
                victim_position: None,
            },
        )
    }

    pub fn plant(&mut self, tick: u32, slot: i32, site: &str) -> &mut Self {
        self.push(
            tick,
            RecordKind::Bomb {
                slot: Some(Slot(slot)),
                action: BombAction::Planted,
                site: Some(site.to_owned()),
                has_kit: false,
                position: None,
            },
        )
    }

    pub fn round_start(&mut self, tick: u32) -> &mut Self {
        self.push(tick, RecordKind::RoundStart)
    }

    pub fn freeze_end(&mut self, tick: u32) -> &mut Self {
        self.push(tick, RecordKind::FreezeEnd)
    }

    pub fn round_end(&mut self, tick: u32, winner: Team) -> &mut Self {
        let reason = match winner {
            Team::CounterTerrorist => 8,
            _ => 9,
        };
        self.push(
            tick,
            RecordKind::RoundEnd {
                winner: Some(winner),
                reason: Some(reason),
                message: None,
            },
        )
    }

    pub fn officially_ended(&mut self, tick: u32) -> &mut Self {
        self.push(tick, RecordKind::RoundOfficiallyEnded)
    }

    /// Start, freeze end, end and official end, without anything happening.
    pub fn round(&mut self, start: u32, winner: Team) -> &mut Self {
        self.round_start(start)
            .freeze_end(start + 10)
            .round_end(start + 100, winner)
            .officially_ended(start + 150)
    }

    pub fn records(&self) -> Vec<Result<Record, DecodeError>> {
        self.records.iter().cloned().map(Ok).collect()
    }
}

pub fn steam(slot: i32) -> u64 {
    76561190000000000 + slot as u64
}

pub fn death(attacker: Option<i32>, victim: Option<i32>, weapon: &str) -> RecordKind {
    RecordKind::PlayerDeath {
        victim: victim.map(Slot),
        attacker: attacker.map(Slot),
        assister: None,
        weapon: Some(weapon.to_owned()),
        headshot: false,
        penetrated: 0,
        noscope: false,
        thrusmoke: false,
        attackerblind: false,
        assistedflash: false,
        attacker_position: None,
        victim_position: None,
    }
}

pub fn run(stream: &Stream) -> (MemorySink, Summary) {
    run_with(EngineConfig::default(), stream)
}

pub fn run_with(config: EngineConfig, stream: &Stream) -> (MemorySink, Summary) {
    let mut sink = MemorySink::new();
    let cancel = AtomicBool::new(false);
    let summary = Session::new(demo_file(), config)
        .run(stream.records(), &mut sink, &cancel)
        .unwrap();
    (sink, summary)
}
