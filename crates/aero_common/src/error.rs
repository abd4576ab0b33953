//! Error types for the tutor core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error for {path}: {reason}")]
    Ingest { path: PathBuf, reason: String },

    #[error("Retrieval backend error: {0}")]
    Retrieval(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Compliance log error: {0}")]
    ComplianceLog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TutorError {
    /// Stable slug for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            TutorError::Config(_) => "config",
            TutorError::Ingest { .. } => "ingest",
            TutorError::Retrieval(_) => "retrieval",
            TutorError::Synthesis(_) => "synthesis",
            TutorError::ComplianceLog(_) => "compliance_log",
            TutorError::Io(_) => "io",
            TutorError::Json(_) => "json",
            TutorError::Toml(_) => "toml",
            TutorError::Yaml(_) => "yaml",
        }
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
