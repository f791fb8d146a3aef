//! JSON shapes seen by clients and persistence.

use chrono::Utc;
use serde_json::json;

use combat_core::{
    ActionBudget, ActionSelection, Battle, BattleEngine, BattleMode, BattleState, BodyRegion,
    BudgetCalculator, CombatAction, CombatConfig, FlatResolver, ParticipantId, ParticipantSpec,
    ParticipantStore, SkillEffect, ValidationError,
};

#[test]
fn client_selection_needs_only_names_targets_and_regions() {
    let wire = json!({
        "actions": [
            { "kind": "attack", "attack": "strike", "target": 2, "region": "head" },
            { "kind": "attack", "attack": "strike", "target": 2, "region": "legs",
              "potency": 1000000, "cost": 0 },
            { "kind": "block", "region": "stomach" },
            { "kind": "skill", "skill": "strike", "target": 2 },
        ]
    });
    let selection: ActionSelection = serde_json::from_value(wire).unwrap();
    assert_eq!(selection.attack_count(), 2);
    let CombatAction::Skill(skill) = &selection.actions[3] else {
        panic!("expected a skill");
    };
    assert_eq!((skill.effect, skill.region), (SkillEffect::Damage, BodyRegion::Torso));

    let config = CombatConfig::default();
    let store = ParticipantStore::from_roster([
        ParticipantSpec::new(1, "Aria", "alpha", 50),
        ParticipantSpec::new(2, "Bram", "beta", 50),
    ]);
    let actor = store.get(ParticipantId(1)).unwrap();
    let calculator = BudgetCalculator::new(&config);

    let attacks_only = ActionSelection::new(selection.actions[..3].to_vec());
    let verdict = calculator.evaluate(&attacks_only, actor, &store).unwrap();
    assert!(verdict.selection.attacks().all(|a| a.potency == 10 && a.cost == 20));
    assert_eq!(verdict.cost.total, 20 + 20 + 10 + 25);

    assert_eq!(
        calculator.evaluate(&selection, actor, &store),
        Err(ValidationError::UnknownSkill { skill: "strike".into() })
    );
}

#[test]
fn validation_errors_serialize_with_a_kind_tag() {
    let error = ValidationError::BudgetExceeded { cost: 105, budget: 80 };
    let value = serde_json::to_value(&error).unwrap();
    assert_eq!(value, json!({ "kind": "budget_exceeded", "cost": 105, "budget": 80 }));
    assert_eq!(serde_json::from_value::<ValidationError>(value).unwrap(), error);
}

#[test]
fn battle_snapshot_survives_json() {
    let config = CombatConfig::default();
    let mut state = BattleState::new(
        Battle::new(BattleMode::SimultaneousRound, 80, 50, 21),
        [
            ParticipantSpec::new(1, "Aria", "alpha", 50),
            ParticipantSpec::new(2, "Bram", "beta", 50),
        ],
    );
    {
        let mut engine = BattleEngine::new(&mut state, &config, &FlatResolver);
        engine.mark_ready(ParticipantId(1)).unwrap();
        engine.mark_ready(ParticipantId(2)).unwrap();
        engine.start(Utc::now()).unwrap();
        let wire = json!({
            "actions": [{ "kind": "attack", "attack": "strike", "target": 2, "region": "torso" }]
        });
        let selection: ActionSelection = serde_json::from_value(wire).unwrap();
        engine.submit(ParticipantId(1), &selection).unwrap();
        engine.resolve_round(Utc::now()).unwrap();
    }

    let json = serde_json::to_string(&state).unwrap();
    let restored: BattleState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, state);
    restored.log.verify().unwrap();
}
