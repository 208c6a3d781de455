//! Panel Integration Tests
//!
//! End-to-end evaluation runs over synthetic reference clips in a temp
//! directory: offline rubric judges, weighting from the preference store,
//! and failure paths that must still yield one verdict per judge.

use aura_panel::agents::AgentDefinition;
use aura_panel::clip::{synth, write_clip};
use aura_panel::config::{ModelConfig, PanelConfig};
use aura_panel::panel::{evaluate, EvaluationRequest, JudgeBackend};
use aura_panel::storage::PreferenceStore;
use aura_panel::types::{JudgeProfile, SeverityBand, PARSE_FAILURE_MARKER};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const STEVE: &str = "Judge_Steve_Jobs";
const DONALD: &str = "Judge_Donald_Trump";

fn judges() -> Vec<JudgeProfile> {
    vec![
        JudgeProfile::new(STEVE, "Steve Jobs").with_metric("index_finger_gap"),
        JudgeProfile::new(DONALD, "Donald Trump").with_metric("hand_spread"),
    ]
}

/// Two steeple references for Steve, two accordion references for Donald.
/// The user clip is a copy of Steve's first reference.
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let refs = dir.path().join("reference");
    let mut rng = StdRng::seed_from_u64(42);

    let mut steve_first = None;
    for n in 1..=2 {
        let steeple = synth::generate_reference(synth::Behavior::Steeple, 30, &mut rng);
        write_clip(&refs.join(synth::reference_file_name(STEVE, n)), &steeple).unwrap();
        steve_first.get_or_insert(steeple);

        let accordion = synth::generate_reference(synth::Behavior::Accordion, 30, &mut rng);
        write_clip(&refs.join(synth::reference_file_name(DONALD, n)), &accordion).unwrap();
    }
    write_clip(&dir.path().join("landmarks.json"), &steve_first.unwrap()).unwrap();
    dir
}

fn request(dir: &Path, backend: JudgeBackend) -> EvaluationRequest {
    EvaluationRequest {
        user_clip: dir.join("landmarks.json"),
        reference_dir: dir.join("reference"),
        preferences: dir.join("preferences.json"),
        judges: judges(),
        backend,
    }
}

#[tokio::test]
async fn offline_panel_ranks_the_mismatched_persona_first() {
    let dir = workspace();
    let report = evaluate(
        &PanelConfig::default(),
        request(dir.path(), JudgeBackend::Rubric),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.len(), 2);
    assert_eq!(report.failures(), 0);
    assert_eq!(report.judges(), vec![DONALD, STEVE]);

    let donald = &report.entries[0];
    assert_eq!(donald.verdict.metric_analyzed, "hand_spread");
    assert_eq!(donald.band, SeverityBand::Critical);
    assert_eq!(donald.label, "Donald Trump");

    let steve = &report.entries[1];
    assert_eq!(steve.verdict.metric_analyzed, "index_finger_gap");
    assert!(steve.verdict.severity <= 0.3 + 1e-9, "{}", steve.verdict.severity);
    assert_eq!(steve.weight, 1.0);
}

#[tokio::test]
async fn stored_weights_reorder_the_report() {
    let dir = workspace();
    let store = PreferenceStore::new(dir.path().join("preferences.json"));
    // Label lookup: Steve's entry is stored under the display name.
    store.set("Steve Jobs", 10.0).unwrap();
    store.set(DONALD, 0.0).unwrap();

    let report = evaluate(
        &PanelConfig::default(),
        request(dir.path(), JudgeBackend::Rubric),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.judges(), vec![STEVE, DONALD]);
    let steve = &report.entries[0];
    assert_eq!(steve.weight, 10.0);
    assert!((steve.effective_severity - steve.verdict.severity * 10.0).abs() < 1e-9);

    // A zero weight keeps the verdict but sinks it.
    let donald = &report.entries[1];
    assert_eq!(donald.effective_severity, 0.0);
    assert_eq!(donald.band, SeverityBand::Critical);
}

#[tokio::test]
async fn judge_without_references_gets_the_sentinel_severity() {
    let dir = workspace();
    let mut req = request(dir.path(), JudgeBackend::Rubric);
    req.judges.push(JudgeProfile::new("Judge_Nobody", "Nobody"));

    let report = evaluate(&PanelConfig::default(), req, CancellationToken::new()).await;
    let nobody = report
        .entries
        .iter()
        .find(|e| e.verdict.judge == "Judge_Nobody")
        .unwrap();
    assert_eq!(nobody.verdict.severity, 1.0);
    assert!(!nobody.verdict.is_failure());
}

#[tokio::test]
async fn missing_user_clip_fails_every_judge_but_keeps_the_roster() {
    let dir = workspace();
    std::fs::remove_file(dir.path().join("landmarks.json")).unwrap();

    let report = evaluate(
        &PanelConfig::default(),
        request(dir.path(), JudgeBackend::Rubric),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.len(), 2);
    assert_eq!(report.failures(), 2);
    for entry in &report.entries {
        assert_eq!(entry.verdict.metric_analyzed, PARSE_FAILURE_MARKER);
        assert_eq!(entry.verdict.severity, 0.0);
    }
    // Equal effective severity falls back to judge id order.
    assert_eq!(report.judges(), vec![DONALD, STEVE]);
}

#[tokio::test]
async fn unreachable_model_yields_failure_verdicts() {
    let dir = workspace();
    let def_path = dir.path().join("judge.json");
    std::fs::write(
        &def_path,
        r#"{"config": {"name": "Judge", "system_message": "You are {id} ({label}).",
            "model_client": {"config": {"model": "test", "api_key": "sk-test", "base_url": "http://127.0.0.1:9/v1"}}}}"#,
    )
    .unwrap();

    let model = ModelConfig {
        timeout_secs: 2,
        judge_definition: Some(def_path),
        ..ModelConfig::default()
    };
    let backend = tokio_test::assert_ok!(JudgeBackend::from_config(&model));
    assert!(matches!(backend, JudgeBackend::Model { ref definition, .. } if definition.config.name == "Judge"));

    let report = evaluate(&PanelConfig::default(), request(dir.path(), backend), CancellationToken::new()).await;
    assert_eq!(report.len(), 2);
    assert_eq!(report.failures(), 2);
    assert!(report.entries.iter().all(|e| e.verdict.description.contains("Session failed")));
}

#[tokio::test]
async fn cancelled_run_still_reports_every_judge() {
    let dir = workspace();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = evaluate(&PanelConfig::default(), request(dir.path(), JudgeBackend::Rubric), cancel).await;
    assert_eq!(report.len(), 2);
    // No judge spoke, so both sessions degrade to the failure verdict.
    assert_eq!(report.failures(), 2);
}

#[test]
fn default_definition_needs_an_api_key() {
    let model = ModelConfig {
        api_key_env: "AURA_PANEL_TEST_UNSET_KEY".to_string(),
        ..ModelConfig::default()
    };
    let judge = JudgeProfile::new(STEVE, "Steve Jobs");
    tokio_test::assert_err!(AgentDefinition::default_judge().build_judge(&judge, &model));
}
