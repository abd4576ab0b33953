//! Aero Common - core of the conceptual aircraft-systems tutor.
//!
//! Answers questions about electrical and hydraulic systems from curated
//! training text only. Procedural or ambiguous questions are never answered:
//! they are redirected to approved documentation and logged without storing
//! the raw query.
//!
//! Pipeline: [`PolicyMediator`] → [`IntentClassifier`] → [`CorpusIndex`] →
//! [`Synthesizer`] → release check → [`TutorResponse`].

pub mod classifier;
pub mod compliance;
pub mod components;
pub mod config;
pub mod corpus;
pub mod error;
pub mod mediator;
pub mod synthesizer;
pub mod types;

pub use classifier::{ClassifierMode, IntentClassifier};
pub use compliance::{
    fingerprint_query, read_events, AuditSummary, ComplianceEvent, ComplianceRecorder,
    ComplianceSink, JsonlComplianceLog, MemoryComplianceLog,
};
pub use components::{ComponentCatalog, ComponentLabel};
pub use config::{ConfigHealth, LoadedConfig, SafetyConfig, TutorConfig};
pub use corpus::{CorpusIndex, IngestReport, LexicalIndex, SharedCorpus};
pub use error::{Result, TutorError};
pub use mediator::PolicyMediator;
pub use synthesizer::{Synthesizer, TemplateSynthesizer};
pub use types::{
    Classification, Document, DocumentKind, QueryCategory, ReasonCode, RetrievedPassage,
    SystemFocus, TutorResponse,
};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "AEROTUTOR_CONFIG";

/// Default daemon bind address (localhost only)
pub const DEFAULT_BIND: &str = "127.0.0.1:7870";
