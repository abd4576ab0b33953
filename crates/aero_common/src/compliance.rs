//! Compliance log for redirected questions.
//!
//! One JSON line per blocked or ambiguous question. Raw query text is never
//! written: events carry a salted SHA-256 fingerprint and the query length.
//! A truncated preview is stored only when explicitly enabled.
//!
//! Default location: `logs/blocked_queries.jsonl`

use crate::config::ComplianceConfig;
use crate::error::{Result, TutorError};
use crate::types::{Classification, QueryCategory, SystemFocus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Maximum preview length in characters
pub const PREVIEW_MAX_CHARS: usize = 80;

// ============================================================================
// Event
// ============================================================================

/// Privacy-preserving record of one redirected question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvent {
    pub timestamp_utc: DateTime<Utc>,
    pub classification: QueryCategory,
    pub reason_codes: Vec<String>,
    pub system_focus: SystemFocus,
    /// hex(SHA-256(salt | normalized query))
    pub query_fingerprint: String,
    /// Unicode scalar count of the raw query
    pub query_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_preview: Option<String>,
}

/// Whitespace-collapsed, lower-cased, trimmed
fn normalize_for_fingerprint(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Salted one-way fingerprint of a query
pub fn fingerprint_query(query: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_for_fingerprint(query).as_bytes());
    hex::encode(hasher.finalize())
}

/// Whitespace-collapsed preview, truncated with "..." past the limit
pub fn safe_preview(query: &str) -> String {
    let preview = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if preview.chars().count() <= PREVIEW_MAX_CHARS {
        return preview;
    }
    let head: String = preview.chars().take(PREVIEW_MAX_CHARS - 3).collect();
    format!("{}...", head)
}

// ============================================================================
// Sinks
// ============================================================================

/// Append-only destination for compliance events
pub trait ComplianceSink: Send + Sync {
    fn record(&self, event: &ComplianceEvent) -> Result<()>;
}

/// JSON Lines file sink. Appends are serialized by a mutex.
#[derive(Debug)]
pub struct JsonlComplianceLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlComplianceLog {
    /// Prepare the parent directory and return a sink for `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| {
                    TutorError::ComplianceLog(format!("cannot create {}: {}", dir.display(), e))
                })?;
            }
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ComplianceSink for JsonlComplianceLog {
    fn record(&self, event: &ComplianceEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;

        let _guard = self
            .lock
            .lock()
            .map_err(|_| TutorError::ComplianceLog("log lock poisoned".into()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                TutorError::ComplianceLog(format!("cannot open {}: {}", self.path.display(), e))
            })?;

        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// In-process sink
#[derive(Debug, Default)]
pub struct MemoryComplianceLog {
    events: Mutex<Vec<ComplianceEvent>>,
}

impl MemoryComplianceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ComplianceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ComplianceSink for MemoryComplianceLog {
    fn record(&self, event: &ComplianceEvent) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| TutorError::ComplianceLog("log lock poisoned".into()))?;
        events.push(event.clone());
        Ok(())
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Builds events for redirected questions and hands them to a sink.
/// Write failures are reported and swallowed.
#[derive(Clone)]
pub struct ComplianceRecorder {
    sink: Arc<dyn ComplianceSink>,
    salt: String,
    store_preview: bool,
}

impl ComplianceRecorder {
    pub fn new(sink: Arc<dyn ComplianceSink>) -> Self {
        Self {
            sink,
            salt: String::new(),
            store_preview: false,
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    pub fn with_preview(mut self, enabled: bool) -> Self {
        self.store_preview = enabled;
        self
    }

    /// `None` when logging is disabled or the log file cannot be prepared
    pub fn from_config(config: &ComplianceConfig) -> Option<Self> {
        if !config.enabled {
            debug!("Compliance log disabled");
            return None;
        }
        match JsonlComplianceLog::create(config.log_path()) {
            Ok(log) => Some(
                Self::new(Arc::new(log))
                    .with_salt(config.hash_salt.clone())
                    .with_preview(config.store_query_preview),
            ),
            Err(e) => {
                warn!(error = %e, "Compliance log unavailable, redirects will not be recorded");
                None
            }
        }
    }

    pub fn build_event(
        &self,
        query: &str,
        classification: &Classification,
        focus: SystemFocus,
    ) -> ComplianceEvent {
        ComplianceEvent {
            timestamp_utc: Utc::now(),
            classification: classification.category,
            reason_codes: classification.reason_codes(),
            system_focus: focus,
            query_fingerprint: fingerprint_query(query, &self.salt),
            query_length: query.chars().count(),
            query_preview: self.store_preview.then(|| safe_preview(query)),
        }
    }

    /// Record one redirected question. Returns false if the write failed.
    pub fn record_blocked(
        &self,
        query: &str,
        classification: &Classification,
        focus: SystemFocus,
    ) -> bool {
        let event = self.build_event(query, classification, focus);
        match self.sink.record(&event) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Compliance event not recorded");
                false
            }
        }
    }
}

impl std::fmt::Debug for ComplianceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceRecorder")
            .field("store_preview", &self.store_preview)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Review
// ============================================================================

/// Read events from a JSONL log, skipping lines that do not parse.
/// A missing file is an empty log.
pub fn read_events(path: &Path) -> Result<Vec<ComplianceEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping malformed compliance line: {}", e);
                None
            }
        })
        .collect())
}

/// Aggregate counts for audit review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_reason: BTreeMap<String, usize>,
    pub by_focus: BTreeMap<String, usize>,
    /// Individual verbs from `blocked_verbs:` codes
    pub by_verb: BTreeMap<String, usize>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl AuditSummary {
    pub fn from_events(events: &[ComplianceEvent]) -> Self {
        let mut summary = Self::default();
        for event in events {
            summary.total += 1;
            *summary
                .by_category
                .entry(event.classification.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .by_focus
                .entry(event.system_focus.as_str().to_string())
                .or_insert(0) += 1;

            for code in &event.reason_codes {
                match code.strip_prefix("blocked_verbs:") {
                    Some(verbs) => {
                        *summary.by_reason.entry("blocked_verbs".to_string()).or_insert(0) += 1;
                        for verb in verbs.split(',').filter(|v| !v.is_empty()) {
                            *summary.by_verb.entry(verb.to_string()).or_insert(0) += 1;
                        }
                    }
                    None => *summary.by_reason.entry(code.clone()).or_insert(0) += 1,
                }
            }

            summary.first_seen = Some(match summary.first_seen {
                Some(t) if t <= event.timestamp_utc => t,
                _ => event.timestamp_utc,
            });
            summary.last_seen = Some(match summary.last_seen {
                Some(t) if t >= event.timestamp_utc => t,
                _ => event.timestamp_utc,
            });
        }
        summary
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_events(&read_events(path)?))
    }
}
