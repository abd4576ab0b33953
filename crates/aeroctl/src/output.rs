//! Output formatting - ASCII-only terminal output

use aero_common::{
    AuditSummary, Classification, ComplianceEvent, ConfigHealth, Document, DocumentKind,
    IngestReport, LoadedConfig, QueryCategory, TutorResponse,
};
use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "------------------------------------------------------------";

fn category_tag(category: QueryCategory) -> String {
    match category {
        QueryCategory::Conceptual => "[CONCEPTUAL]".bright_green().to_string(),
        QueryCategory::Procedural => "[PROCEDURAL]".bright_red().to_string(),
        QueryCategory::Ambiguous => "[AMBIGUOUS]".yellow().to_string(),
    }
}

fn print_counts(title: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    println!("  {}:", title);
    for (key, count) in counts {
        println!("    {:<28} {}", key, count);
    }
}

/// Display a tutor response
pub fn display_response(response: &TutorResponse) {
    println!();
    if response.was_redirected {
        println!(
            "{}  {}  focus: {}",
            "[REDIRECTED]".yellow(),
            category_tag(response.classification.category),
            response.system_focus
        );
    } else {
        println!(
            "{}  focus: {}",
            "[ANSWER]".bright_green(),
            response.system_focus
        );
    }
    println!("{}", SEPARATOR);
    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!();
        println!("[SOURCES]");
        for source in &response.sources {
            println!("  * {}", source.cyan());
        }
    }

    let reasons = response.classification.reason_codes();
    if !reasons.is_empty() {
        println!();
        println!("[REASONS] {}", reasons.join(", ").dimmed());
    }
    println!();
}

pub fn display_classification(classification: &Classification, mode: &str) {
    println!("{}  classifier: {}", category_tag(classification.category), mode);
    for reason in classification.reason_codes() {
        println!("  * {}", reason);
    }
}

pub fn display_fail_safe_notice(loaded: &LoadedConfig) {
    let detail = match &loaded.health {
        ConfigHealth::Invalid { path, reason } => format!("{}: {}", path.display(), reason),
        _ => "no config file found".to_string(),
    };
    eprintln!(
        "{} {} - every question will be redirected",
        "[WARNING]".bright_red(),
        detail
    );
}

pub fn display_corpus(paths: &[PathBuf], documents: &[&Document], report: &IngestReport) {
    println!("[CORPUS]");
    for path in paths {
        println!("  root: {}", path.display());
    }
    println!(
        "  {} text, {} binary stubs, {} skipped, {} failed",
        report.text_documents, report.binary_stubs, report.skipped, report.failed
    );
    println!("{}", SEPARATOR);

    if documents.is_empty() {
        println!("  {}", "(no documents)".dimmed());
    }
    for doc in documents {
        let kind = match doc.kind {
            DocumentKind::Text => "text",
            DocumentKind::BinaryStub => "stub",
        };
        println!("  {:<11} {:<5} {}", doc.focus.as_str(), kind, doc.id.cyan());
    }

    if !report.diagnostics.is_empty() {
        println!();
        println!("[NOTE]");
        for diagnostic in &report.diagnostics {
            println!("  * {}", diagnostic.yellow());
        }
    }
}

pub fn display_audit(path: &Path, summary: &AuditSummary, recent: &[ComplianceEvent]) {
    println!("[AUDIT] {}", path.display());
    println!("  redirected questions: {}", summary.total);
    if let (Some(first), Some(last)) = (summary.first_seen, summary.last_seen) {
        println!("  window: {} .. {}", first.to_rfc3339(), last.to_rfc3339());
    }
    print_counts("by category", &summary.by_category);
    print_counts("by reason", &summary.by_reason);
    print_counts("by verb", &summary.by_verb);
    print_counts("by focus", &summary.by_focus);

    if recent.is_empty() {
        return;
    }
    println!("{}", SEPARATOR);
    println!("[RECENT]");
    for event in recent {
        println!(
            "  {}  {:<10} {:<10} {}  {}",
            event.timestamp_utc.format("%Y-%m-%d %H:%M:%S"),
            event.classification.as_str(),
            event.system_focus.as_str(),
            &event.query_fingerprint[..event.query_fingerprint.len().min(12)],
            event.reason_codes.join(",").dimmed()
        );
    }
}

pub fn display_config(loaded: &LoadedConfig, rendered: &str) {
    match &loaded.health {
        ConfigHealth::Loaded { path } => {
            println!("{} {}", "[LOADED]".bright_green(), path.display())
        }
        ConfigHealth::Missing => println!(
            "{} no config file found (default-deny)",
            "[MISSING]".bright_red()
        ),
        ConfigHealth::Invalid { path, reason } => println!(
            "{} {}: {} (default-deny)",
            "[INVALID]".bright_red(),
            path.display(),
            reason
        ),
    }
    for diagnostic in &loaded.diagnostics {
        println!("[NOTE] {}", diagnostic.yellow());
    }
    println!("{}", SEPARATOR);
    print!("{}", rendered);
}
