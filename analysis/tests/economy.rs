use analysis::aggregate::{self, EconomyInput, Streak};
use analysis::config::EconomyThresholds;
use analysis::EngineConfig;
use common::{DemoFileId, RoundId, RoundType, Team};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

mod support;

use support::{Stream, CT_SLOTS, T_SLOTS};

fn eco_config() -> EngineConfig {
    EngineConfig {
        economy: EconomyThresholds {
            eco_threshold: 1500,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Pistol round won by CT, then CT saves while T buys.
fn eco_against_full_buy() -> Stream {
    let mut stream = Stream::new();
    stream.five_v_five();
    stream.round(100, Team::CounterTerrorist);

    stream.round_start(300);
    for slot in CT_SLOTS.into_iter().chain(T_SLOTS) {
        let pawn = 100 + slot;
        stream.spawn(301, slot, pawn);
        let money = if slot <= 5 { 900 } else { 4200 };
        stream.money(302, pawn, money, 0);
    }
    stream.freeze_end(310).round_end(400, Team::Terrorist).officially_ended(450);

    stream
}

#[test]
#[traced_test]
fn eco_and_full_buy_are_classified_per_team() {
    let (sink, summary) = support::run_with(eco_config(), &eco_against_full_buy());

    let batch = &sink.rounds[1];
    let round = batch.round.as_ref().unwrap();
    assert_eq!(2, round.round_number);
    assert_eq!(Some(RoundType::Eco), round.ct_round_type);
    assert_eq!(Some(RoundType::FullBuy), round.t_round_type);
    assert!(round.is_eco_round);
    assert!(round.is_anti_eco_round);
    assert!(!round.is_force_buy_round);
    assert_eq!(4500, round.ct_start_money);
    assert_eq!(21000, round.t_start_money);

    let start: Vec<_> = batch
        .economy_states
        .iter()
        .filter(|s| s.phase == "round_start")
        .collect();
    assert_eq!(2, start.len());

    let ct = start.iter().find(|s| s.team == Team::CounterTerrorist).unwrap();
    assert_eq!(900, ct.average_spend_capacity);
    assert_eq!(5, ct.players_on_eco);
    assert!(!ct.is_anti_eco);
    assert!(!ct.partial);
    assert_eq!(1, ct.consecutive_wins);
    assert_eq!(1400, ct.loss_bonus);

    let t = start.iter().find(|s| s.team == Team::Terrorist).unwrap();
    assert!(t.is_anti_eco);
    assert_eq!(5, t.players_can_full_buy);
    assert_eq!(1, t.consecutive_losses);
    assert_eq!(1900, t.loss_bonus);

    assert_eq!(2, batch.economy_states.iter().filter(|s| s.phase == "round_end").count());

    let ct_player = batch
        .player_round_stats
        .iter()
        .find(|s| s.team == Team::CounterTerrorist)
        .unwrap();
    assert_eq!(900, ct_player.start_money);
    assert!(!ct_player.partial);

    let impact = batch
        .round_impacts
        .iter()
        .find(|i| i.player == ct_player.player)
        .unwrap();
    assert_eq!(Some(RoundType::Eco), impact.round_type);

    assert_eq!(Some(RoundType::Eco), round.classification(Team::CounterTerrorist));
    assert_eq!(Some(RoundType::AntiEco), round.classification(Team::Terrorist));
    let t_player = batch
        .player_round_stats
        .iter()
        .find(|s| s.team == Team::Terrorist)
        .unwrap();
    let t_impact = batch
        .round_impacts
        .iter()
        .find(|i| i.player == t_player.player)
        .unwrap();
    assert_eq!(Some(RoundType::AntiEco), t_impact.round_type);

    // Only the pistol round lacks snapshots
    let pistol = sink.rounds[0].round.as_ref().unwrap();
    assert!(pistol.is_pistol);
    assert_eq!(Some(RoundType::Pistol), pistol.ct_round_type);
    assert!(sink.rounds[0].player_round_stats.iter().all(|s| s.partial));
    assert!(summary.partial_aggregates > 0);
}

#[test]
#[traced_test]
fn economy_is_deterministic() {
    let stream = eco_against_full_buy();

    let (first, first_summary) = support::run_with(eco_config(), &stream);
    let (second, second_summary) = support::run_with(eco_config(), &stream);

    assert_eq!(first.rounds, second.rounds);
    assert_eq!(first.matches, second.matches);
    assert_eq!(first_summary, second_summary);
}

#[test]
fn loss_bonus_is_capped() {
    assert_eq!(1400, aggregate::loss_bonus(0));
    assert_eq!(1900, aggregate::loss_bonus(1));
    assert_eq!(3400, aggregate::loss_bonus(4));
    assert_eq!(3400, aggregate::loss_bonus(9));
}

#[test]
fn round_type_thresholds() {
    let thresholds = EconomyThresholds::default();

    assert_eq!(RoundType::Eco, aggregate::classify_round_type(0, &thresholds));
    assert_eq!(RoundType::Eco, aggregate::classify_round_type(1999, &thresholds));
    assert_eq!(RoundType::Force, aggregate::classify_round_type(2000, &thresholds));
    assert_eq!(RoundType::Force, aggregate::classify_round_type(3499, &thresholds));
    assert_eq!(RoundType::FullBuy, aggregate::classify_round_type(3500, &thresholds));
}

#[test]
fn streaks_reset_on_the_other_outcome() {
    let mut streak = Streak::default();
    streak.record(false);
    streak.record(false);
    assert_eq!(Streak { losses: 2, wins: 0 }, streak);

    streak.record(true);
    assert_eq!(Streak { losses: 0, wins: 1 }, streak);
}

#[test]
fn missing_snapshots_make_the_state_partial() {
    let input = EconomyInput {
        demo_file: DemoFileId(uuid::Uuid::nil()),
        round: RoundId(3),
        tick: 1000,
        phase: "round_start",
        is_warmup: false,
        is_pistol: false,
    };
    let thresholds = EconomyThresholds::default();

    let state = aggregate::economy_state(
        &input,
        Team::Terrorist,
        &[Some((3000, 1000)), None, Some((5000, 0))],
        Streak::default(),
        &thresholds,
    );

    assert!(state.partial);
    assert_eq!(3, state.players);
    assert_eq!(8000, state.total_money);
    assert_eq!(4000, state.average_money);
    assert_eq!(4500, state.average_spend_capacity);
    assert_eq!(RoundType::FullBuy, state.round_type);
    assert_eq!(3000, state.min_money);
    assert_eq!(5000, state.max_money);

    let warmup = aggregate::economy_state(
        &EconomyInput {
            is_warmup: true,
            ..input
        },
        Team::Terrorist,
        &[],
        Streak::default(),
        &thresholds,
    );
    assert_eq!(RoundType::Warmup, warmup.round_type);
    assert!(warmup.partial);
}
