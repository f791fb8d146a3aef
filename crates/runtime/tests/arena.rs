//! Arena and battle worker behaviour over real channels and paused time.

use std::sync::Arc;
use std::time::Duration;

use combat_core::{
    ActionSelection, AttackAction, AttackTemplate, Battle, BattleMode, BattleResult, BattleState,
    BattleStatus, BodyRegion, CombatConfig, Controller, Element, EngineError, FlatResolver,
    GridPosition, Loadout, LogPayload, ParticipantId, ParticipantSpec, ParticipantStore,
    ShareToken, StandardResolver, SystemEvent, ValidationError, VitalsKind, replay,
};
use combat_runtime::{
    AggressiveProvider, Arena, BattleEvent, BattleHandle, BattleRepository, Event,
    InMemoryBattleRepo, InMemoryLogRepo, JsonLinesLogRepo, LogRepository, RuntimeConfig,
    RuntimeError, SubmissionAck, Topic,
};
use tokio::time::Instant;

fn id(n: u32) -> ParticipantId {
    ParticipantId(n)
}

fn strike(target: u32, attack: &str) -> AttackAction {
    AttackAction::new(attack, id(target), BodyRegion::Torso)
}

fn kit() -> Loadout {
    let attack = |name: &str, potency: u32| AttackTemplate {
        name: name.into(),
        element: Element::Normal,
        potency,
        cost: 10,
        reach: 1,
    };
    Loadout {
        attacks: vec![attack("jab", 5), attack("cut", 10)],
        ..Loadout::default()
    }
}

fn duel(mode: BattleMode) -> BattleState {
    BattleState::new(
        Battle::new(mode, 80, 50, 11),
        [
            ParticipantSpec::new(1, "Aria", "alpha", 40)
                .with_initiative(10)
                .with_position(GridPosition::new(0, 0))
                .with_loadout(kit()),
            ParticipantSpec::new(2, "Bram", "beta", 100)
                .with_initiative(20)
                .with_position(GridPosition::new(1, 0))
                .with_loadout(kit()),
        ],
    )
}

fn squads() -> BattleState {
    BattleState::new(
        Battle::new(BattleMode::SimultaneousRound, 80, 50, 5),
        [
            ParticipantSpec::new(1, "Aria", "alpha", 40).with_loadout(kit()),
            ParticipantSpec::new(2, "Bram", "beta", 100).with_loadout(kit()),
            ParticipantSpec::new(3, "Cato", "beta", 60).with_loadout(kit()),
            ParticipantSpec::new(4, "Dusk", "alpha", 60).with_loadout(kit()),
        ],
    )
}

fn bots() -> BattleState {
    BattleState::new(
        Battle::new(BattleMode::SimultaneousRound, 80, 50, 99),
        [
            ParticipantSpec::new(1, "Aria", "alpha", 60).with_controller(Controller::Ai),
            ParticipantSpec::new(2, "Bram", "beta", 60).with_controller(Controller::Ai),
            ParticipantSpec::new(3, "Cato", "beta", 30).with_controller(Controller::Ai),
        ],
    )
}

/// Polls until the worker reports completion; paused time skips deadlines.
async fn finished(handle: &BattleHandle) -> BattleState {
    loop {
        let state = handle.query_state().await.unwrap();
        if state.battle.is_completed() {
            return state;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn capped() -> CombatConfig {
    CombatConfig {
        max_rounds: Some(25),
        ..CombatConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn last_submission_resolves_the_round() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::SimultaneousRound)).await.unwrap();
    let mut rounds = handle.subscribe(Topic::Round);
    let mut vitals = handle.subscribe(Topic::Vitals);

    assert!(!handle.ready(id(1)).await.unwrap());
    assert!(handle.ready(id(2)).await.unwrap());

    let first = handle
        .submit_action(id(1), ActionSelection::pass().attack(strike(2, "cut")))
        .await
        .unwrap();
    assert!(!first.round_ready);
    let last = handle.submit_action(id(2), ActionSelection::pass()).await.unwrap();
    assert!(last.round_ready);

    let Event::Round(round) = rounds.recv().await.unwrap() else {
        panic!("expected a round event");
    };
    assert_eq!(round.round_number, 1);
    assert!(round.vitals.iter().any(|change| change.participant == id(2)
        && change.kind == VitalsKind::Damage
        && change.amount == 10));

    let Event::Vitals(first_change) = vitals.recv().await.unwrap() else {
        panic!("expected a vitals event");
    };
    assert_eq!(first_change.battle_id, handle.battle_id());

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.battle.round_number, 2);
    assert!(state.participants.iter().all(|p| !p.has_submitted));

    drop((handle, rounds, vitals));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn round_deadline_auto_resolves_missing_participants() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::SimultaneousRound)).await.unwrap();
    let mut rounds = handle.subscribe(Topic::Round);
    handle.ready(id(1)).await.unwrap();
    handle.ready(id(2)).await.unwrap();

    handle
        .submit_action(id(1), ActionSelection::pass().attack(strike(2, "cut")))
        .await
        .unwrap();

    let before = tokio::time::Instant::now();
    let Event::Round(round) = rounds.recv().await.unwrap() else {
        panic!("expected a round event");
    };
    assert!(before.elapsed() >= Duration::from_millis(CombatConfig::DEFAULT_ROUND_DEADLINE_MS));
    assert!(round.entries.iter().any(|entry| matches!(
        entry.payload,
        LogPayload::System(SystemEvent::AutoResolved { participant, .. }) if participant == id(2)
    )));

    drop((handle, rounds));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn forfeit_that_completes_the_round_resolves_it_at_once() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(squads()).await.unwrap();
    for n in 1..=4 {
        handle.ready(id(n)).await.unwrap();
    }

    handle
        .submit_action(id(1), ActionSelection::pass().attack(strike(2, "jab")))
        .await
        .unwrap();
    handle.submit_action(id(2), ActionSelection::pass()).await.unwrap();
    handle.submit_action(id(4), ActionSelection::pass()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;

    let forfeited_at = Instant::now();
    handle.forfeit(id(3)).await.unwrap();
    let state = handle.query_state().await.unwrap();
    assert_eq!(forfeited_at.elapsed(), Duration::ZERO);
    assert_eq!(state.battle.round_number, 2);
    assert!(state.battle.is_active());
    assert_eq!(state.participants.get(id(2)).unwrap().current_hp(), 95);

    drop(handle);
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn forfeit_keeps_the_running_round_deadline() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(squads()).await.unwrap();
    for n in 1..=4 {
        handle.ready(id(n)).await.unwrap();
    }

    handle.submit_action(id(1), ActionSelection::pass()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;
    handle.forfeit(id(4)).await.unwrap();
    assert_eq!(handle.query_state().await.unwrap().battle.round_number, 1);

    // The window opened at battle start still closes at 30s.
    tokio::time::sleep(Duration::from_secs(11)).await;
    let state = handle.query_state().await.unwrap();
    assert_eq!(state.battle.round_number, 2);
    assert!(state.log.entries().iter().any(|entry| matches!(
        entry.payload,
        LogPayload::System(SystemEvent::AutoResolved { participant, .. }) if participant == id(3)
    )));

    drop(handle);
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn lobby_window_withdraws_stragglers() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let mut state = duel(BattleMode::SimultaneousRound);
    state.participants = ParticipantStore::from_roster([
        ParticipantSpec::new(1, "Aria", "alpha", 40),
        ParticipantSpec::new(2, "Bram", "beta", 100),
        ParticipantSpec::new(3, "Cato", "beta", 60),
    ]);
    let handle = arena.create_battle(state).await.unwrap();
    let mut lifecycle = handle.subscribe(Topic::Battle);

    assert!(!handle.ready(id(1)).await.unwrap());
    assert!(!handle.ready(id(2)).await.unwrap());
    assert_eq!(handle.query_state().await.unwrap().battle.status(), BattleStatus::Pending);

    let Event::Battle(BattleEvent::Started(started)) = lifecycle.recv().await.unwrap() else {
        panic!("expected the lobby to close");
    };
    assert!(started.entries.iter().any(|entry| matches!(
        entry.payload,
        LogPayload::System(SystemEvent::NotReady { participant }) if participant == id(3)
    )));
    let cato = handle.query_state().await.unwrap();
    assert!(!cato.participants.get(id(3)).unwrap().is_active());

    drop((handle, lifecycle));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn turn_time_limit_hands_the_turn_over() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::AlternatingTurn)).await.unwrap();
    let mut rounds = handle.subscribe(Topic::Round);
    handle.ready(id(1)).await.unwrap();
    handle.ready(id(2)).await.unwrap();

    let state = handle.query_state().await.unwrap();
    assert_eq!(state.battle.current_actor, Some(id(2)));

    let Event::Round(turn) = rounds.recv().await.unwrap() else {
        panic!("expected a turn event");
    };
    assert_eq!(turn.next_actor, Some(id(1)));
    assert!(turn.entries.iter().any(|entry| matches!(
        entry.payload,
        LogPayload::System(SystemEvent::TurnTimedOut { participant }) if participant == id(2)
    )));

    let out_of_turn = handle.advance_turn(id(2)).await;
    assert!(matches!(out_of_turn, Err(RuntimeError::Engine(EngineError::State(_)))));

    drop((handle, rounds));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_is_acknowledged_with_a_code() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::SimultaneousRound)).await.unwrap();
    handle.ready(id(1)).await.unwrap();
    handle.ready(id(2)).await.unwrap();

    let flurry = ActionSelection::pass()
        .attack(strike(2, "jab"))
        .attack(strike(2, "jab"))
        .attack(strike(2, "jab"));
    let result = handle.submit_action(id(1), flurry).await;
    assert_eq!(
        result.as_ref().err().and_then(RuntimeError::as_engine),
        Some(&EngineError::Validation(ValidationError::BudgetExceeded { cost: 105, budget: 80 }))
    );

    let ack = SubmissionAck::from_result(&result);
    assert!(!ack.accepted);
    assert_eq!(ack.code.as_deref(), Some("BUDGET_EXCEEDED"));
    assert!(ack.cost_used.is_none());

    let accepted = handle
        .submit_action(id(1), ActionSelection::pass().attack(strike(2, "jab")))
        .await;
    let ack = SubmissionAck::from_result(&accepted);
    assert!(ack.accepted);
    assert_eq!(ack.cost_used.map(|cost| cost.total), Some(10));

    drop(handle);
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_ends_a_pending_battle() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::SimultaneousRound)).await.unwrap();
    let mut lifecycle = handle.subscribe(Topic::Battle);

    let report = handle.cancel("server maintenance").await.unwrap();
    assert_eq!(
        report.outcome,
        Some(BattleResult::Cancelled {
            reason: "server maintenance".into()
        })
    );

    let Event::Battle(BattleEvent::Ended(ended)) = lifecycle.recv().await.unwrap() else {
        panic!("expected the battle to end");
    };
    assert_eq!(ended.rounds, 1);

    assert!(handle.query_state().await.unwrap().battle.is_completed());
    assert!(handle.ready(id(1)).await.is_err());

    drop((handle, lifecycle));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn spectators_join_by_share_token() {
    let arena = Arena::builder().resolver(FlatResolver).build();
    let handle = arena.create_battle(duel(BattleMode::SimultaneousRound)).await.unwrap();

    let spectator = arena.spectate(handle.share_token()).await.unwrap();
    assert_eq!(spectator.battle_id(), handle.battle_id());
    let mut watched = spectator.subscribe(Topic::Battle);

    handle.ready(id(1)).await.unwrap();
    handle.ready(id(2)).await.unwrap();
    let Event::Battle(BattleEvent::Started(started)) = watched.recv().await.unwrap() else {
        panic!("expected the battle to start");
    };
    assert_eq!(started.initiative_order, vec![id(2), id(1)]);
    assert!(spectator.snapshot().await.unwrap().battle.is_active());

    let stranger = ShareToken::generate();
    assert!(matches!(
        arena.spectate(stranger).await,
        Err(RuntimeError::UnknownShareToken(token)) if token == stranger
    ));
    assert_eq!(arena.battle_ids().await, vec![handle.battle_id()]);

    drop((handle, spectator, watched));
    arena.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ai_battle_runs_to_completion_and_replays() {
    let config = capped();
    let initial = bots();
    let logs = Arc::new(InMemoryLogRepo::new());
    let battles = Arc::new(InMemoryBattleRepo::new());
    let arena = Arena::builder()
        .config(RuntimeConfig {
            combat: config.clone(),
            ..RuntimeConfig::default()
        })
        .provider(AggressiveProvider::default())
        .log_repository(logs.clone())
        .battle_repository(battles.clone())
        .build();

    let handle = arena.create_battle(initial.clone()).await.unwrap();
    let battle_id = handle.battle_id();
    let state = finished(&handle).await;
    assert!(state.battle.round_number <= 25);
    state.log.verify().unwrap();

    assert_eq!(logs.load(battle_id).unwrap(), state.log.entries());
    assert_eq!(battles.load(battle_id).unwrap(), Some(state.clone()));

    let resolver = StandardResolver::new(config.balance.clone());
    let replayed = replay(initial, &state.history, &config, &resolver).unwrap();
    assert_eq!(replayed.battle.result(), state.battle.result());
    for participant in state.participants.iter() {
        let twin = replayed.participants.get(participant.id).unwrap();
        assert_eq!(twin.current_hp(), participant.current_hp());
    }

    drop(handle);
    arena.remove(battle_id).await.unwrap();
    assert!(matches!(
        arena.handle(battle_id).await,
        Err(RuntimeError::UnknownBattle(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn json_lines_log_matches_the_in_memory_log() {
    let dir = tempfile::tempdir().unwrap();
    let logs = Arc::new(JsonLinesLogRepo::new(dir.path()).unwrap());
    let arena = Arena::builder()
        .combat_config(capped())
        .provider(AggressiveProvider::default())
        .log_repository(logs.clone())
        .build();

    let handle = arena.create_battle(bots()).await.unwrap();
    let state = finished(&handle).await;

    let on_disk = JsonLinesLogRepo::read_file(&logs.path_for(handle.battle_id())).unwrap();
    assert_eq!(on_disk, state.log.entries());

    drop(handle);
    arena.shutdown().await.unwrap();
}
