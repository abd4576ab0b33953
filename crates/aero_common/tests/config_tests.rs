//! Config discovery and fail-safe wiring

use aero_common::{
    read_events, ClassifierMode, ConfigHealth, IntentClassifier, PolicyMediator, QueryCategory,
    SystemFocus, TutorConfig,
};
use std::fs;
use std::path::Path;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("aerotutor.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn valid_file_loads_normal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[safety]
strict_mode = true

[corpus]
max_passages = 2
"#,
    );

    let loaded = TutorConfig::discover(Some(&path), None);
    assert_eq!(loaded.health, ConfigHealth::Loaded { path: path.clone() });
    assert!(!loaded.is_fail_safe());
    assert_eq!(loaded.config.corpus.max_passages, 2);
    assert_eq!(IntentClassifier::from_loaded(&loaded).mode(), ClassifierMode::Normal);
}

#[test]
fn missing_explicit_file_is_fail_safe() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = TutorConfig::discover(Some(&dir.path().join("nope.toml")), None);
    assert_eq!(loaded.health, ConfigHealth::Missing);
    assert!(loaded.is_fail_safe());
    assert_eq!(
        IntentClassifier::from_loaded(&loaded).mode(),
        ClassifierMode::DefaultDeny
    );
}

#[test]
fn env_path_used_when_no_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[log]\nlevel = \"debug\"\n");
    let loaded = TutorConfig::discover(None, Some(&path));
    assert!(!loaded.is_fail_safe());
    assert_eq!(loaded.config.log.level, "debug");
}

#[test]
fn malformed_files_are_fail_safe() {
    let dir = tempfile::tempdir().unwrap();
    for body in [
        "this is not toml = = =",
        "[safety]\nblocked_verbs = []\n",
        "[safety]\nprocedural_phrases = [\"re:([\"]\n",
        "[safety]\nblockd_verbs = [\"remove\"]\n",
    ] {
        let path = write_config(dir.path(), body);
        let loaded = TutorConfig::discover(Some(&path), None);
        assert!(
            matches!(loaded.health, ConfigHealth::Invalid { .. }),
            "accepted: {}",
            body
        );

        let classifier = IntentClassifier::from_loaded(&loaded);
        let verdict =
            classifier.classify("How does the main AC bus stay powered if one generator fails?");
        assert_ne!(verdict.category, QueryCategory::Conceptual, "{}", body);
    }
}

#[test]
fn mediator_from_config_wires_corpus_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(corpus.join("electrical")).unwrap();
    fs::write(
        corpus.join("electrical/ac_bus.md"),
        "Each generator powers its own AC bus; tie breakers join the buses after a generator loss.",
    )
    .unwrap();
    let logs = dir.path().join("logs");

    let body = format!(
        r#"
[corpus]
paths = [{corpus:?}]
component_labels = {labels:?}

[compliance]
log_dir = {logs:?}
hash_salt = "pepper"
"#,
        corpus = corpus.to_string_lossy(),
        labels = dir.path().join("missing.yaml").to_string_lossy(),
        logs = logs.to_string_lossy(),
    );
    let path = write_config(dir.path(), &body);
    let loaded = TutorConfig::discover(Some(&path), None);
    assert!(!loaded.is_fail_safe(), "{:?}", loaded.health);

    let mediator = PolicyMediator::from_config(&loaded);
    assert_eq!(mediator.corpus().len(), 1);
    assert!(mediator.compliance_enabled());

    let answer = mediator.handle_question(
        "How does the main AC bus stay powered if one generator fails?",
        SystemFocus::Electrical,
    );
    assert!(!answer.was_redirected);
    assert_eq!(answer.sources, vec!["electrical/ac_bus.md"]);

    let redirect = mediator.handle_question("How to replace the generator?", SystemFocus::Electrical);
    assert!(redirect.was_redirected);

    let events = read_events(&logs.join("blocked_queries.jsonl")).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].query_fingerprint,
        aero_common::fingerprint_query("How to replace the generator?", "pepper")
    );
}
