use analysis::input::{Record, RecordKind, Slot};
use analysis::{DecodeError, EngineConfig, MemorySink, Session};
use common::{DemoFile, DemoFileId, Team};

fn main() {
    divan::main();
}

fn demo_file() -> DemoFile {
    DemoFile {
        id: DemoFileId(uuid::Uuid::nil()),
        file_name: "bench.dem".to_owned(),
        map: Some("de_bench".to_owned()),
        server_name: None,
        source: None,
        tick_rate: 64,
        total_ticks: 0,
    }
}

fn death(attacker: i32, victim: i32) -> RecordKind {
    RecordKind::PlayerDeath {
        victim: Some(Slot(victim)),
        attacker: Some(Slot(attacker)),
        assister: None,
        weapon: Some("weapon_ak47".to_owned()),
        headshot: attacker % 2 == 0,
        penetrated: 0,
        noscope: false,
        thrusmoke: false,
        attackerblind: false,
        assistedflash: false,
        attacker_position: None,
        victim_position: None,
    }
}

/// Ten players, `rounds` rounds with shots, damage and a full team wipe each.
fn synthetic_match(rounds: u32) -> Vec<Record> {
    let mut records = Vec::new();
    for slot in 1..=10 {
        records.push(Record::new(
            0,
            RecordKind::PlayerConnect {
                slot: Slot(slot),
                user_id: Some(slot),
                steam_id: Some(76561190000000000 + slot as u64),
                name: format!("player{}", slot),
                is_bot: false,
                is_hltv: false,
            },
        ));
        let team = if slot <= 5 {
            Team::CounterTerrorist
        } else {
            Team::Terrorist
        };
        records.push(Record::new(0, RecordKind::PlayerTeam { slot: Slot(slot), team }));
    }

    for round in 0..rounds {
        let start = 1000 + round * 10_000;
        let ct_wins = round % 3 != 0;
        let (winners, losers) = if ct_wins { (1..=5, 6..=10) } else { (6..=10, 1..=5) };

        records.push(Record::new(start, RecordKind::RoundStart));
        for slot in 1..=10 {
            records.push(Record::new(
                start + 1,
                RecordKind::PlayerSpawn { slot: Slot(slot), pawn: None },
            ));
        }
        records.push(Record::new(start + 1000, RecordKind::FreezeEnd));

        let mut tick = start + 2000;
        for (attacker, victim) in winners.zip(losers) {
            for _ in 0..8 {
                records.push(Record::new(
                    tick,
                    RecordKind::WeaponFire {
                        slot: Some(Slot(attacker)),
                        weapon: Some("weapon_ak47".to_owned()),
                        silenced: false,
                        position: None,
                    },
                ));
                tick += 8;
            }
            records.push(Record::new(
                tick,
                RecordKind::PlayerHurt {
                    victim: Some(Slot(victim)),
                    attacker: Some(Slot(attacker)),
                    weapon: Some("weapon_ak47".to_owned()),
                    dmg_health: 100,
                    dmg_armor: 10,
                    health: 0,
                    armor: 90,
                    hitgroup: Some(1),
                    attacker_position: None,
                    victim_position: None,
                },
            ));
            records.push(Record::new(tick, death(attacker, victim)));
            tick += 64;
        }

        let winner = if ct_wins {
            Team::CounterTerrorist
        } else {
            Team::Terrorist
        };
        records.push(Record::new(
            tick + 10,
            RecordKind::RoundEnd {
                winner: Some(winner),
                reason: Some(if ct_wins { 8 } else { 9 }),
                message: None,
            },
        ));
        records.push(Record::new(tick + 500, RecordKind::RoundOfficiallyEnded));
    }

    records
}

#[divan::bench(args = [12, 24, 30])]
fn session(bencher: divan::Bencher, rounds: u32) {
    let records = synthetic_match(rounds);

    bencher.bench(|| {
        let mut sink = MemorySink::new();
        let cancel = std::sync::atomic::AtomicBool::new(false);
        let input = records.iter().cloned().map(Ok::<_, DecodeError>);
        Session::new(demo_file(), EngineConfig::default())
            .run(divan::black_box(input), &mut sink, &cancel)
            .map(|summary| divan::black_box(summary))
    });
}

#[cfg(feature = "csdemo")]
#[divan::bench(args = ["dust2.dem", "inferno.dem", "nuke.dem"])]
fn demo(bencher: divan::Bencher, file: &str) {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../testfiles/")
        .join(file);
    let data = std::fs::read(path).unwrap();

    bencher.bench(|| analysis::demo::parse(divan::black_box(&data)));
}
