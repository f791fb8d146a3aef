use std::io::Write;

use combat_content::{ConfigLoader, ScenarioLoader};
use combat_core::BattleMode;

#[test]
fn loads_config_and_scenario_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("combat.toml");
    std::fs::write(&config_path, "action_points_per_turn = 60\nround_deadline_ms = 500\n").unwrap();
    let config = ConfigLoader::load(&config_path).unwrap();
    assert_eq!(config.action_points_per_turn, 60);
    assert_eq!(config.round_deadline().as_millis(), 500);

    let scenario_path = dir.path().join("duel.toml");
    let mut file = std::fs::File::create(&scenario_path).unwrap();
    writeln!(
        file,
        r#"
        name = "duel"
        mode = "alternating_turn"

        [[participants]]
        id = 1
        name = "Aria"
        team = "alpha"
        max_hp = 30
        position = {{ x = 0, y = 0 }}

        [[participants]]
        id = 2
        name = "Bram"
        team = "beta"
        max_hp = 30
        position = {{ x = 2, y = 1 }}
        "#
    )
    .unwrap();

    let scenario = ScenarioLoader::load(&scenario_path, &config).unwrap();
    assert_eq!(scenario.mode, BattleMode::AlternatingTurn);
    let state = scenario.into_state(&config);
    assert_eq!(state.battle.action_points_per_turn, 60);
    assert_eq!(state.participants.len(), 2);
}

#[test]
fn missing_file_reports_the_path() {
    let error = ConfigLoader::load(std::path::Path::new("/nonexistent/combat.toml")).unwrap_err();
    assert!(format!("{error:#}").contains("/nonexistent/combat.toml"));
}
