use analysis::input::{EntityIndex, Slot};
use analysis::RecordKind;
use common::{GrenadeKind, PlayerKey, Team};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

mod support;

use support::Stream;

/// Keys are handed out in connect order.
fn key_of(sink: &analysis::MemorySink, slot: i32) -> PlayerKey {
    sink.rounds[0]
        .players
        .iter()
        .find(|p| p.slot == slot && p.is_connected)
        .map(|p| p.key)
        .unwrap()
}

#[test]
#[traced_test]
fn clutch_size_is_fixed_when_it_arises() {
    let mut stream = Stream::new();
    // A and D on CT, B and C on T
    stream
        .player(0, 1, support::steam(1), Team::CounterTerrorist)
        .player(0, 2, support::steam(2), Team::CounterTerrorist)
        .player(0, 6, support::steam(6), Team::Terrorist)
        .player(0, 7, support::steam(7), Team::Terrorist);

    stream.round_start(100).freeze_end(110);
    stream.kill(1000, 6, 2);
    stream.kill(1200, 1, 6);
    stream.kill(1300, 7, 1);
    stream.round_end(1400, Team::Terrorist).officially_ended(1450);

    let (sink, _) = support::run(&stream);
    let a = key_of(&sink, 1);
    let d = key_of(&sink, 2);
    let b = key_of(&sink, 6);
    let c = key_of(&sink, 7);

    let kills: Vec<_> = sink.kills().collect();
    assert_eq!(3, kills.len());

    assert!(!kills[0].is_clutch);
    assert_eq!((2, 1), (kills[0].killer_team_alive, kills[0].victim_team_alive));

    assert_eq!(Some(a), kills[1].killer);
    assert!(kills[1].is_clutch);
    assert_eq!(2, kills[1].clutch_size);
    assert!(kills[1].is_trade_kill);
    assert_eq!(Some(d), kills[1].traded_player);
    assert!(kills[1].is_critical_trade);

    assert_eq!(Some(c), kills[2].killer);
    assert!(kills[2].is_clutch);
    assert_eq!(1, kills[2].clutch_size);
    assert_eq!(Some(b), kills[2].traded_player);

    let stats = &sink.rounds[0].player_round_stats;
    let a_stats = stats.iter().find(|s| s.player == a).unwrap();
    assert!(a_stats.is_clutch);
    assert_eq!(2, a_stats.clutch_size);
    assert!(!a_stats.clutch_won);

    let c_stats = stats.iter().find(|s| s.player == c).unwrap();
    assert!(c_stats.is_clutch);
    assert_eq!(1, c_stats.clutch_size);
    assert!(c_stats.clutch_won);
    assert!(c_stats.survived);

    let d_stats = stats.iter().find(|s| s.player == d).unwrap();
    assert!(d_stats.traded);
    assert!(d_stats.kast);
    assert!(d_stats.first_death);
}

#[test]
#[traced_test]
fn round_starting_one_versus_two_is_a_clutch() {
    let mut stream = Stream::new();
    stream
        .player(0, 1, support::steam(1), Team::CounterTerrorist)
        .player(0, 6, support::steam(6), Team::Terrorist)
        .player(0, 7, support::steam(7), Team::Terrorist);

    stream.round_start(100).freeze_end(110);
    stream.kill(1200, 1, 6);
    stream.kill(1300, 1, 7);
    stream.round_end(1400, Team::CounterTerrorist).officially_ended(1450);

    let (sink, _) = support::run(&stream);
    let a = key_of(&sink, 1);

    let kills: Vec<_> = sink.kills().collect();
    assert_eq!(2, kills.len());
    for kill in &kills {
        assert_eq!(Some(a), kill.killer);
        assert!(kill.is_clutch);
        assert_eq!(2, kill.clutch_size);
    }

    let stats = &sink.rounds[0].player_round_stats;
    let a_stats = stats.iter().find(|s| s.player == a).unwrap();
    assert!(a_stats.is_clutch);
    assert_eq!(2, a_stats.clutch_size);
    assert!(a_stats.clutch_won);
}

#[test]
#[traced_test]
fn lone_player_without_freeze_end_is_a_clutch() {
    let mut stream = Stream::new();
    stream
        .player(0, 1, support::steam(1), Team::CounterTerrorist)
        .player(0, 6, support::steam(6), Team::Terrorist)
        .player(0, 7, support::steam(7), Team::Terrorist);

    stream.round_start(100);
    stream.kill(1200, 1, 6);
    stream.round_end(1400, Team::Terrorist).officially_ended(1450);

    let (sink, _) = support::run(&stream);

    let kills: Vec<_> = sink.kills().collect();
    assert_eq!(1, kills.len());
    assert!(kills[0].is_clutch);
    assert_eq!(2, kills[0].clutch_size);
}

#[test]
#[traced_test]
fn trades_inside_the_window() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    // X kills Y, Z kills X two seconds later
    stream.kill_at(500, 10.0, 6, 1);
    stream.kill_at(520, 12.0, 2, 6);
    stream.round_end(600, Team::CounterTerrorist).officially_ended(650);

    stream.round_start(700).freeze_end(710);
    stream.kill_at(800, 20.0, 7, 3);
    stream.kill_at(1100, 25.5, 4, 7);
    stream.round_end(1200, Team::CounterTerrorist).officially_ended(1250);

    let (sink, _) = support::run(&stream);
    let y = key_of(&sink, 1);

    let kills: Vec<_> = sink.kills().collect();
    assert_eq!(4, kills.len());

    assert!(kills[0].is_first_kill);
    assert!(!kills[0].is_trade_kill);

    assert!(!kills[1].is_first_kill);
    assert!(kills[1].is_trade_kill);
    assert_eq!(Some(y), kills[1].traded_player);

    assert!(kills[2].is_first_kill);
    assert!(!kills[3].is_trade_kill);
    assert_eq!(None, kills[3].traded_player);
}

#[test]
#[traced_test]
fn team_kills_and_suicides() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    stream.kill(200, 1, 2);
    stream.kill(300, 3, 3);
    stream.round_end(400, Team::Terrorist).officially_ended(450);

    let (sink, _) = support::run(&stream);
    let kills: Vec<_> = sink.kills().collect();

    assert!(kills[0].is_team_kill);
    assert!(!kills[0].is_suicide);
    // The first kill is literal, a team kill counts
    assert!(kills[0].is_first_kill);

    assert!(kills[1].is_suicide);
    assert!(!kills[1].is_team_kill);

    let stats = &sink.rounds[0].player_round_stats;
    let killer = stats.iter().find(|s| s.player == key_of(&sink, 1)).unwrap();
    assert_eq!(0, killer.kills);
    let suicide = stats.iter().find(|s| s.player == key_of(&sink, 3)).unwrap();
    assert_eq!(0, suicide.kills);
    assert_eq!(1, suicide.deaths);
}

#[test]
#[traced_test]
fn unresolved_references_keep_the_row() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    stream.kill(200, 42, 1);
    stream.round_end(400, Team::Terrorist).officially_ended(450);

    let (sink, summary) = support::run(&stream);
    let kills: Vec<_> = sink.kills().collect();

    assert_eq!(1, kills.len());
    assert_eq!(None, kills[0].killer);
    assert_eq!(Some(key_of(&sink, 1)), kills[0].victim);
    assert!(kills[0].ctx.unresolved);
    assert_eq!(1, summary.unresolved_references);
}

#[test]
#[traced_test]
fn damage_is_capped_at_remaining_health() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    stream.hurt(200, 1, 6, 80, 20);
    stream.hurt(210, 1, 6, 120, 0);
    stream.kill(210, 1, 6);
    stream.round_end(400, Team::CounterTerrorist).officially_ended(450);

    let (sink, _) = support::run(&stream);
    let stats = &sink.rounds[0].player_round_stats;

    let attacker = stats.iter().find(|s| s.player == key_of(&sink, 1)).unwrap();
    assert_eq!(100, attacker.damage);
    assert_eq!(2, attacker.shots_hit);
    let victim = stats.iter().find(|s| s.player == key_of(&sink, 6)).unwrap();
    assert_eq!(100, victim.damage_taken);

    let damages = &sink.rounds[0].facts.damages;
    assert!(damages[1].is_fatal);
    assert!(!damages[0].is_fatal);
}

#[test]
#[traced_test]
fn flashbang_trajectory() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    stream.timed(
        150,
        10.0,
        RecordKind::GrenadeThrown {
            slot: Some(Slot(1)),
            entity: Some(EntityIndex(200)),
            weapon: "weapon_flashbang".to_owned(),
            position: None,
        },
    );
    stream.timed(
        160,
        10.5,
        RecordKind::GrenadeBounce {
            entity: EntityIndex(200),
            position: None,
        },
    );
    stream.timed(
        180,
        11.5,
        RecordKind::GrenadeDetonate {
            slot: Some(Slot(1)),
            entity: Some(EntityIndex(200)),
            weapon: "weapon_flashbang".to_owned(),
            position: None,
        },
    );
    stream.timed(
        180,
        11.5,
        RecordKind::PlayerBlind {
            victim: Some(Slot(6)),
            attacker: Some(Slot(1)),
            entity: Some(EntityIndex(200)),
            duration: 2.0,
        },
    );
    stream.timed(
        180,
        11.5,
        RecordKind::PlayerBlind {
            victim: Some(Slot(2)),
            attacker: Some(Slot(1)),
            entity: Some(EntityIndex(200)),
            duration: 1.0,
        },
    );
    stream.round_end(400, Team::CounterTerrorist).officially_ended(450);

    let (sink, _) = support::run(&stream);
    let batch = &sink.rounds[0];

    assert_eq!(1, batch.grenade_trajectories.len());
    let trajectory = &batch.grenade_trajectories[0];
    assert_eq!(GrenadeKind::Flashbang, trajectory.grenade);
    assert_eq!(Some(key_of(&sink, 1)), trajectory.player);
    assert_eq!(1, trajectory.bounce_count);
    assert_eq!(Some(180), trajectory.detonate_tick);
    assert_eq!(Some(1.5), trajectory.flight_time);
    assert_eq!(2, trajectory.players_affected);
    assert_eq!(1, trajectory.enemies_affected);
    assert_eq!(1, trajectory.teammates_affected);
    assert_eq!(3.0, trajectory.total_flash_duration);

    // The bounce carries no thrower, it is taken from the throw
    assert_eq!(Some(key_of(&sink, 1)), batch.facts.grenade_events[1].player);
    assert!(batch.facts.flash_events[1].is_team_flash);

    let flasher = batch
        .player_round_stats
        .iter()
        .find(|s| s.player == key_of(&sink, 1))
        .unwrap();
    assert_eq!(1, flasher.enemies_flashed);
    assert_eq!(1, flasher.teammates_flashed);
    assert_eq!(2.0, flasher.flash_duration);
}

#[test]
#[traced_test]
fn bomb_plant_marks_the_round() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).freeze_end(110);
    stream.plant(300, 6, "B");
    stream.push(
        900,
        RecordKind::RoundEnd {
            winner: None,
            reason: Some(1),
            message: None,
        },
    );
    stream.officially_ended(950);

    let (sink, _) = support::run(&stream);
    let batch = &sink.rounds[0];
    let round = batch.round.as_ref().unwrap();

    assert!(round.bomb_planted);
    assert_eq!(Some("B".to_owned()), round.bomb_site);
    assert_eq!(Some(Team::Terrorist), round.winner);

    let planter = batch
        .player_round_stats
        .iter()
        .find(|s| s.player == key_of(&sink, 6))
        .unwrap();
    assert!(planter.bomb_planted);
    assert!(planter.won_round);

    let impact = batch.round_impacts.iter().find(|i| i.player == key_of(&sink, 6)).unwrap();
    assert!(impact.objective_impact > 0.0);
}

#[test]
#[traced_test]
fn purchases_inside_and_after_buy_time() {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.round_start(100).spawn(101, 1, 300).money(102, 300, 4000, 0);
    stream.push(
        105,
        RecordKind::ItemPurchase {
            slot: Some(Slot(1)),
            item: "weapon_ak47".to_owned(),
            cost: None,
        },
    );
    stream.timed(110, 2.0, RecordKind::FreezeEnd);
    stream.timed(
        2000,
        40.0,
        RecordKind::ItemPurchase {
            slot: Some(Slot(1)),
            item: "weapon_flashbang".to_owned(),
            cost: Some(200),
        },
    );
    stream.round_end(3000, Team::CounterTerrorist).officially_ended(3050);

    let (sink, _) = support::run(&stream);
    let events = &sink.rounds[0].facts.economy_events;

    assert_eq!(2, events.len());
    assert!(events[0].is_buy_time);
    assert_eq!(Some(2700), events[0].item_cost);
    assert_eq!(Some(4000), events[0].money_before);
    assert_eq!(Some(1300), events[0].money_after);
    assert!(!events[1].is_buy_time);

    let buyer = sink.rounds[0]
        .player_round_stats
        .iter()
        .find(|s| s.player == key_of(&sink, 1))
        .unwrap();
    assert_eq!(2900, buyer.money_spent);
}
