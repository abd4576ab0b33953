//! Shared types for the tutor pipeline.
//!
//! Everything here is either immutable after creation or owned by exactly
//! one component, so values move freely between threads.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// System Focus
// ============================================================================

/// Subsystem domain selected for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemFocus {
    Electrical,
    Hydraulic,
    Other,
}

impl SystemFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemFocus::Electrical => "electrical",
            SystemFocus::Hydraulic => "hydraulic",
            SystemFocus::Other => "other",
        }
    }

    /// Human-facing label used in answer text
    pub fn label(&self) -> &'static str {
        match self {
            SystemFocus::Electrical => "The electrical power system",
            SystemFocus::Hydraulic => "The hydraulic system",
            SystemFocus::Other => "An aircraft system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "electrical" | "elec" => Some(SystemFocus::Electrical),
            "hydraulic" | "hyd" => Some(SystemFocus::Hydraulic),
            "other" => Some(SystemFocus::Other),
            _ => None,
        }
    }

    pub fn all() -> [SystemFocus; 3] {
        [
            SystemFocus::Electrical,
            SystemFocus::Hydraulic,
            SystemFocus::Other,
        ]
    }

    /// Retrieval scope for this focus. `Other` is not a subsystem, so it
    /// searches the whole corpus.
    pub fn retrieval_scope(&self) -> Option<SystemFocus> {
        match self {
            SystemFocus::Other => None,
            focus => Some(*focus),
        }
    }
}

impl fmt::Display for SystemFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemFocus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemFocus::parse(s).ok_or_else(|| {
            format!(
                "unknown system focus '{}' (expected electrical, hydraulic or other)",
                s
            )
        })
    }
}

// ============================================================================
// Corpus Types
// ============================================================================

/// How a document's body was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Text or markdown read directly
    Text,
    /// PDF or image; body is a stub referencing the resource
    BinaryStub,
}

/// A curated training document. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Corpus-relative identifier (e.g. "electrical/ac_distribution.md")
    pub id: String,
    /// Subsystem tag
    pub focus: SystemFocus,
    /// Text or stub
    pub kind: DocumentKind,
    /// Raw text body
    pub body: String,
    /// Where the document was read from
    pub source_path: PathBuf,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        focus: SystemFocus,
        kind: DocumentKind,
        body: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            focus,
            kind,
            body: body.into(),
            source_path: source_path.into(),
        }
    }

    /// File name shown to learners when citing the document
    pub fn source_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Per-query retrieval result. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Owning document identifier
    pub document_id: String,
    /// Display name of the training resource
    pub source: String,
    /// Extracted span or stub summary
    pub text: String,
    /// Relevance (non-negative, higher = more relevant)
    pub score: f32,
}

// ============================================================================
// Classification
// ============================================================================

/// Intent verdict for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Conceptual,
    Procedural,
    Ambiguous,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Conceptual => "conceptual",
            QueryCategory::Procedural => "procedural",
            QueryCategory::Ambiguous => "ambiguous",
        }
    }

    /// Procedural and ambiguous questions take the redirection path
    pub fn is_blocked(&self) -> bool {
        !matches!(self, QueryCategory::Conceptual)
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a question was classified the way it was.
///
/// Rendered as stable strings; the same strings appear in the compliance log.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    /// Sorted, deduplicated base verbs
    BlockedVerbs(Vec<String>),
    TaskHowToLanguage,
    StepwiseLanguage,
    DiagnosticLanguage,
    AmbiguousIntent,
    EmptyQuery,
    ConfigFallback,
    PipelineFault,
}

impl ReasonCode {
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReasonCode::BlockedVerbs(verbs) => write!(f, "blocked_verbs:{}", verbs.join(",")),
            ReasonCode::TaskHowToLanguage => f.write_str("task_how_to_language"),
            ReasonCode::StepwiseLanguage => f.write_str("stepwise_language"),
            ReasonCode::DiagnosticLanguage => {
                f.write_str("diagnostic_or_troubleshooting_language")
            }
            ReasonCode::AmbiguousIntent => f.write_str("ambiguous_intent"),
            ReasonCode::EmptyQuery => f.write_str("empty_query"),
            ReasonCode::ConfigFallback => f.write_str("config_fallback"),
            ReasonCode::PipelineFault => f.write_str("pipeline_fault"),
        }
    }
}

impl FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(list) = s.strip_prefix("blocked_verbs:") {
            let verbs = list
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            return Ok(ReasonCode::BlockedVerbs(verbs));
        }
        match s {
            "task_how_to_language" => Ok(ReasonCode::TaskHowToLanguage),
            "stepwise_language" => Ok(ReasonCode::StepwiseLanguage),
            "diagnostic_or_troubleshooting_language" => Ok(ReasonCode::DiagnosticLanguage),
            "ambiguous_intent" => Ok(ReasonCode::AmbiguousIntent),
            "empty_query" => Ok(ReasonCode::EmptyQuery),
            "config_fallback" => Ok(ReasonCode::ConfigFallback),
            "pipeline_fault" => Ok(ReasonCode::PipelineFault),
            other => Err(format!("unknown reason code '{}'", other)),
        }
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReasonCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Classifier verdict plus the triggers that produced it.
///
/// `reasons` is non-empty whenever `category` is not conceptual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: QueryCategory,
    pub reasons: Vec<ReasonCode>,
}

impl Classification {
    pub fn conceptual() -> Self {
        Self {
            category: QueryCategory::Conceptual,
            reasons: Vec::new(),
        }
    }

    pub fn procedural(reasons: Vec<ReasonCode>) -> Self {
        Self {
            category: QueryCategory::Procedural,
            reasons,
        }
    }

    pub fn ambiguous(reasons: Vec<ReasonCode>) -> Self {
        Self {
            category: QueryCategory::Ambiguous,
            reasons,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.category.is_blocked()
    }

    /// Reason codes as stable strings, in order
    pub fn reason_codes(&self) -> Vec<String> {
        self.reasons.iter().map(ReasonCode::code).collect()
    }

    pub fn has_reason(&self, code: &str) -> bool {
        self.reasons.iter().any(|r| r.code() == code)
    }
}

// ============================================================================
// Response
// ============================================================================

/// The only value returned across the pipeline boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorResponse {
    /// Final answer text
    pub answer: String,
    /// Focus echoed back
    pub system_focus: SystemFocus,
    /// Resulting classification
    pub classification: Classification,
    /// True when the question was redirected instead of answered
    pub was_redirected: bool,
    /// Training resources that informed a conceptual answer
    #[serde(default)]
    pub sources: Vec<String>,
}
