//! Subcommand implementations. Each loads config itself and runs in-process.

use crate::output;
use aero_common::{
    fingerprint_query, read_events, AuditSummary, CorpusIndex, IntentClassifier, LexicalIndex,
    LoadedConfig, PolicyMediator, SystemFocus, TutorConfig,
};
use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::warn;

fn load(config: Option<&Path>) -> LoadedConfig {
    let loaded = TutorConfig::load(config);
    for diagnostic in &loaded.diagnostics {
        warn!("{}", diagnostic);
    }
    loaded
}

fn parse_focus(focus: &str) -> Result<SystemFocus> {
    match SystemFocus::parse(focus) {
        Some(f) => Ok(f),
        None => bail!(
            "unknown system focus '{}' (expected electrical, hydraulic or other)",
            focus
        ),
    }
}

fn read_question(question: Option<String>) -> Result<String> {
    match question {
        Some(q) => Ok(q),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading question from stdin")?;
            Ok(buf)
        }
    }
}

/// `aeroctl ask`
pub fn ask(config: Option<&Path>, question: Option<String>, focus: &str, json: bool) -> Result<()> {
    let focus = parse_focus(focus)?;
    let question = read_question(question)?;
    let loaded = load(config);
    if loaded.is_fail_safe() && !json {
        output::display_fail_safe_notice(&loaded);
    }

    let mediator = PolicyMediator::from_config(&loaded);
    let response = mediator.handle_question(&question, focus);

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        output::display_response(&response);
    }
    Ok(())
}

/// `aeroctl classify`
pub fn classify(config: Option<&Path>, question: &str, json: bool) -> Result<()> {
    let loaded = load(config);
    let classifier = IntentClassifier::from_loaded(&loaded);
    let classification = classifier.classify(question);

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
    } else {
        output::display_classification(&classification, classifier.mode().as_str());
    }
    Ok(())
}

/// `aeroctl corpus`
pub fn corpus(config: Option<&Path>, focus: Option<&str>) -> Result<()> {
    let focus = focus.map(parse_focus).transpose()?;
    let loaded = load(config);
    let corpus_config = &loaded.config.corpus;

    let mut index = LexicalIndex::new().with_snippet_chars(corpus_config.effective_snippet_chars());
    let report = index.ingest(&corpus_config.paths);

    let documents: Vec<_> = index
        .documents()
        .filter(|d| focus.map_or(true, |f| d.focus == f))
        .collect();
    output::display_corpus(&corpus_config.paths, &documents, &report);
    Ok(())
}

/// `aeroctl audit`
pub fn audit(config: Option<&Path>, limit: usize) -> Result<()> {
    let loaded = load(config);
    let path = loaded.config.compliance.log_path();
    let events = read_events(&path)
        .with_context(|| format!("reading compliance log {}", path.display()))?;
    let summary = AuditSummary::from_events(&events);

    let skip = events.len().saturating_sub(limit);
    output::display_audit(&path, &summary, &events[skip..]);
    Ok(())
}

/// `aeroctl config`
pub fn config(config: Option<&Path>) -> Result<()> {
    let loaded = load(config);
    let rendered = loaded.config.to_toml_string()?;
    output::display_config(&loaded, &rendered);
    Ok(())
}

/// `aeroctl fingerprint`
pub fn fingerprint(config: Option<&Path>, question: &str) -> Result<()> {
    let loaded = load(config);
    println!(
        "{}",
        fingerprint_query(question, &loaded.config.compliance.hash_salt)
    );
    Ok(())
}
