//! Tests for loading host configuration and replay scripts from disk.

use ritual_engine::Phase;
use ritual_host::{
    Authority, HostConfig, ManualClock, RecordingTransport, ReplayScript, final_state,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
room = "moonlit-glade"
rng_seed = 9

[durations]
discussionMs = 5000

[rulesets]
enableInfection = true
"#
    )
    .unwrap();

    let config = HostConfig::from_file(file.path()).unwrap();
    assert_eq!(config.room(), "moonlit-glade");
    assert_eq!(*config.rng_seed(), Some(9));

    let meta = config.meta();
    assert_eq!(meta.phase_durations.discussion_ms, 5000);
    assert!(meta.rulesets.enable_infection);
    assert!(!meta.rulesets.enable_corruption);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HostConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.starts_with("Failed to read config file"));
}

#[test]
fn test_configured_durations_drive_deadlines() {
    let config = HostConfig::from_toml_str(
        r#"
        rng_seed = 3

        [durations]
        discussionMs = 5000
        "#,
    )
    .unwrap();
    let clock = ManualClock::new(100);
    let mut authority = Authority::new(&config, clock.clone(), RecordingTransport::new());

    let players = (0..4)
        .map(|i| ritual_engine::PlayerSeed::new(format!("p{i}"), format!("p{i}"), i == 0))
        .collect();
    let state = authority.start(players, "moon").unwrap();
    assert_eq!(state.phase_expires_at, Some(5100));
    assert_eq!(state.meta.phase_durations.discussion_ms, 5000);
}

#[test]
fn test_json_replay_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "seed": "moon",
            "players": [
                {{"id": "p0", "name": "Ash", "isHost": true}},
                {{"id": "p1", "name": "Briar"}},
                {{"id": "p2", "name": "Cinder"}}
            ],
            "steps": [
                {{"kind": "action", "playerId": "p1", "action": {{"type": "ADVANCE_PHASE"}}}},
                {{"kind": "action", "playerId": "p0", "action": {{"type": "ADVANCE_PHASE"}}}}
            ]
        }}"#
    )
    .unwrap();

    let script = ReplayScript::from_file(file.path()).unwrap();
    let clock = ManualClock::new(0);
    let config = HostConfig::default().with_rng_seed(1);
    let mut authority = Authority::new(&config, clock.clone(), RecordingTransport::new());
    let summary = script.run(&mut authority, &clock).unwrap();

    assert_eq!(summary.applied, 1);
    assert_eq!(summary.refused, 1);
    assert_eq!(final_state(&authority).unwrap().phase, Phase::NominationVote);
}
