use std::sync::atomic::{AtomicBool, Ordering};

use analysis::input::Slot;
use analysis::{DecodeError, EngineConfig, MemorySink, RecordKind, Session, SessionError};
use common::{RoundBatch, Team};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

mod support;

use support::Stream;

/// Three rounds with a bit of everything and one fact before the first round.
fn short_match() -> Stream {
    let mut stream = Stream::new();
    stream.five_v_five();

    stream.push(
        50,
        RecordKind::WeaponFire {
            slot: Some(Slot(1)),
            weapon: Some("weapon_glock".to_owned()),
            silenced: false,
            position: None,
        },
    );

    stream.round_start(100).freeze_end(110);
    stream.hurt(150, 1, 6, 100, 0).kill(150, 1, 6);
    stream.hurt(160, 1, 7, 100, 0).kill(160, 1, 7);
    stream.kill(170, 8, 1);
    stream.round_end(300, Team::CounterTerrorist).officially_ended(350);

    stream.round_start(400).freeze_end(410);
    stream.kill(450, 6, 2);
    stream.plant(500, 6, "A");
    stream.round_end(600, Team::Terrorist).officially_ended(650);

    stream.round(700, Team::CounterTerrorist);
    stream
}

fn round_batches(sink: &MemorySink) -> impl Iterator<Item = &RoundBatch> {
    sink.rounds.iter().filter(|b| b.round.is_some())
}

#[test]
#[traced_test]
fn batches_carry_their_parents() {
    let (sink, summary) = support::run(&short_match());

    assert_eq!(Some(support::demo_file().id), sink.demo.as_ref().map(|d| d.id));

    // The fact seen before any round goes out first, without a round
    let orphan = &sink.rounds[0];
    assert_eq!(None, orphan.round);
    assert_eq!(1, orphan.facts.weapon_fires.len());
    assert_eq!(None, orphan.facts.weapon_fires[0].ctx.round);

    for batch in round_batches(&sink) {
        let round = batch.round.as_ref().unwrap();
        let match_row = batch.match_row.as_ref().unwrap();
        assert_eq!(match_row.id, round.match_id);

        for ctx in batch.facts.contexts() {
            assert_eq!(Some(round.id), ctx.round);
            assert_eq!(Some(match_row.id), ctx.match_id);
        }

        let known = |key: common::PlayerKey| batch.players.iter().any(|p| p.key == key);
        for kill in batch.facts.kills.iter() {
            assert!(kill.killer.into_iter().chain(kill.victim).all(known));
        }
        for stats in batch.player_round_stats.iter() {
            assert!(known(stats.player));
            assert_eq!(round.id, stats.round);
        }
        for impact in batch.round_impacts.iter() {
            assert!(known(impact.player));
        }
    }

    let numbers: Vec<_> = sink.round_rows().map(|r| r.round_number).collect();
    assert_eq!(vec![1, 2, 3], numbers);

    let mut seqs: Vec<_> = sink
        .rounds
        .iter()
        .flat_map(|b| b.facts.contexts().map(|c| c.seq))
        .collect();
    let total = seqs.len();
    seqs.sort();
    seqs.dedup();
    assert_eq!(total, seqs.len());
    assert_eq!(total as u64, summary.facts);

    assert_eq!(1, sink.matches.len());
    assert_eq!(3, summary.rounds);
}

#[test]
#[traced_test]
fn runs_are_deterministic() {
    let stream = short_match();

    let (first, first_summary) = support::run(&stream);
    let (second, second_summary) = support::run(&stream);

    assert_eq!(first.rounds, second.rounds);
    assert_eq!(first.matches, second.matches);
    assert_eq!(first_summary, second_summary);
}

#[test]
#[traced_test]
fn match_stats_cover_competitive_rounds() {
    let (sink, _) = support::run(&short_match());
    let batch = &sink.matches[0];

    let entry = sink.rounds[1].players.iter().find(|p| p.slot == 1).unwrap().key;
    let stats = batch.player_match_stats.iter().find(|s| s.player == entry).unwrap();

    assert_eq!(2, stats.kills);
    assert_eq!(1, stats.deaths);
    assert_eq!(3, stats.rounds_played);
    assert_eq!(2, stats.rounds_won);
    assert_eq!(1, stats.first_kills);
    assert_eq!([1, 0, 0, 0], stats.multi_kill_rounds);
    assert_eq!(200, stats.damage);
    assert!((stats.adr - 200.0 / 3.0).abs() < 1e-3);
    assert!(stats.partial);

    let advanced = batch.advanced_player_stats.iter().find(|s| s.player == entry).unwrap();
    assert_eq!(3, advanced.sample_size);
    assert_eq!(100.0, advanced.opening_duel_success_rate);
    assert!((advanced.rating_one - (2.0 + 2.0 / 3.0) / 2.0).abs() < 1e-5);

    // One row per player that took part, ten of them
    assert_eq!(10, batch.player_match_stats.len());
    assert_eq!(10, batch.advanced_player_stats.len());
}

#[test]
#[traced_test]
fn round_impact_is_apportioned() {
    let (sink, _) = support::run(&short_match());

    for batch in round_batches(&sink) {
        let round = batch.round.as_ref().unwrap();
        let winners: f32 = batch.round_impacts.iter().map(|i| i.win_contribution).sum();
        let losers: f32 = batch.round_impacts.iter().map(|i| i.loss_share).sum();

        assert!(round.winner.is_some());
        assert!((winners - 1.0).abs() < 1e-4, "round {} winners {}", round.round_number, winners);
        assert!((losers - 1.0).abs() < 1e-4, "round {} losers {}", round.round_number, losers);
    }

    let first = &sink.rounds[1];
    let entry = first.players.iter().find(|p| p.slot == 1).unwrap().key;
    let impact = first.round_impacts.iter().find(|i| i.player == entry).unwrap();
    assert!(impact.has_entry_frag);
    assert!(impact.has_multi_kill);
    assert!(impact.fragging_impact > 0.0);
}

#[test]
#[traced_test]
fn cancellation_drops_the_round_in_progress() {
    let stream = short_match();

    let cancel = AtomicBool::new(false);
    let records = stream.records().into_iter().inspect(|r| {
        if r.as_ref().map(|r| r.tick >= 710).unwrap_or(false) {
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let mut sink = MemorySink::new();
    let session = Session::new(support::demo_file(), EngineConfig::default());
    let result = session.run(records, &mut sink, &cancel);

    match result {
        Err(SessionError::Cancelled { last_tick }) => assert_eq!(700, last_tick),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(2, sink.round_rows().count());
    assert!(sink.matches.is_empty());
}

#[test]
#[traced_test]
fn decode_error_stops_without_flushing() {
    let stream = short_match();
    let mut records = stream.records();
    let broken = records
        .iter()
        .position(|r| r.as_ref().map(|r| r.tick == 450).unwrap_or(false))
        .unwrap();
    records.insert(broken, Err(DecodeError::new("truncated packet")));

    let mut sink = MemorySink::new();
    let cancel = AtomicBool::new(false);
    let session = Session::new(support::demo_file(), EngineConfig::default());
    let result = session.run(records, &mut sink, &cancel);

    match result {
        Err(SessionError::Decode { last_tick, source }) => {
            assert_eq!(410, last_tick);
            assert_eq!("truncated packet", source.message);
        }
        other => panic!("expected a decode error, got {:?}", other),
    }
    assert_eq!(1, sink.round_rows().count());
    assert!(sink.matches.is_empty());
}

#[test]
#[traced_test]
fn empty_stream_still_writes_the_match() {
    let mut sink = MemorySink::new();
    let cancel = AtomicBool::new(false);
    let summary = Session::new(support::demo_file(), EngineConfig::default())
        .run(Vec::<Result<analysis::Record, DecodeError>>::new(), &mut sink, &cancel)
        .unwrap();

    assert_eq!(0, summary.rounds);
    assert!(sink.rounds.is_empty());
    assert_eq!(1, sink.matches.len());
    assert_eq!(None, sink.matches[0].match_row);
}
