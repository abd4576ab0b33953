//! Tutor configuration.
//!
//! Safety vocabularies are data, not code: they are loaded from a reviewable
//! TOML file (see `config/aerotutor.toml`). Every field has a documented
//! default, but the classifier only leaves default-deny mode when a config
//! file was actually found, parsed and validated.
//!
//! Discovery order:
//! 1. explicit path (`--config`)
//! 2. `$AEROTUTOR_CONFIG`
//! 3. `./aerotutor.toml`
//! 4. `./config/aerotutor.toml`
//! 5. `~/.config/aerotutor/config.toml`
//!
//! Env overrides (applied after loading): `AEROTUTOR_STRICT_MODE`,
//! `AEROTUTOR_COMPLIANCE_LOG`, `AEROTUTOR_LOG_SALT`,
//! `AEROTUTOR_STORE_QUERY_PREVIEW`.

use crate::error::{Result, TutorError};
use crate::CONFIG_ENV;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Local config file name
pub const CONFIG_FILE: &str = "aerotutor.toml";

/// Prefix marking a phrase pattern as a raw regular expression
pub const REGEX_PREFIX: &str = "re:";

// ============================================================================
// Safety
// ============================================================================

/// Safety vocabulary consumed by the intent classifier.
///
/// Unknown keys are rejected so a misspelled list never silently falls back
/// to something the reviewer did not approve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SafetyConfig {
    /// Widen procedural/ambiguous patterns and require a conceptual cue
    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,

    /// Task verbs matched as whole words (plus regular inflections)
    #[serde(default = "default_blocked_verbs")]
    pub blocked_verbs: Vec<String>,

    /// Task / how-to phrasing
    #[serde(default = "default_procedural_phrases")]
    pub procedural_phrases: Vec<String>,

    /// Step-wise phrasing (also counts as how-to language)
    #[serde(default = "default_stepwise_terms")]
    pub stepwise_terms: Vec<String>,

    /// Diagnostic / troubleshooting phrasing (also counts as how-to language)
    #[serde(default = "default_diagnostic_terms")]
    pub diagnostic_terms: Vec<String>,

    /// Extra procedural phrases active only in strict mode
    #[serde(default = "default_strict_procedural_phrases")]
    pub strict_procedural_phrases: Vec<String>,

    /// Action language without a blocked verb
    #[serde(default = "default_action_markers")]
    pub action_markers: Vec<String>,

    /// First words that put a question in the imperative mood
    #[serde(default = "default_imperative_openers")]
    pub imperative_openers: Vec<String>,

    /// System-understanding language (required in strict mode)
    #[serde(default = "default_conceptual_cues")]
    pub conceptual_cues: Vec<String>,
}

fn default_strict_mode() -> bool {
    true
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_blocked_verbs() -> Vec<String> {
    strings(&[
        "remove",
        "install",
        "torque",
        "replace",
        "adjust",
        "troubleshoot",
        "repair",
        "fix",
        "service",
    ])
}

fn default_procedural_phrases() -> Vec<String> {
    strings(&[
        "how to",
        "how do i",
        "how can i",
        "walk me through",
        "what should i do",
        "what do i do",
        "show me how",
        "tell me how",
        "instructions for",
        "guide me",
    ])
}

fn default_stepwise_terms() -> Vec<String> {
    strings(&[
        "step",
        "steps",
        "step by step",
        "procedure",
        "procedures",
        "checklist",
        "checklists",
    ])
}

fn default_diagnostic_terms() -> Vec<String> {
    strings(&[
        "troubleshooting",
        "diagnose",
        "diagnosis",
        "diagnostic",
        "diagnostics",
        "fault isolation",
    ])
}

fn default_strict_procedural_phrases() -> Vec<String> {
    strings(&[
        "what is the process",
        "process for",
        "sequence for",
        "in what order",
        "best way to",
        "where do i",
        "before i",
        "after i",
        r"re:\bhow\s+(?:would|should|could)\s+(?:i|we|you)\b",
    ])
}

fn default_action_markers() -> Vec<String> {
    strings(&[
        "reset",
        "bypass",
        "disconnect",
        "reconnect",
        "drain",
        "bleed",
        "tighten",
        "loosen",
        "swap",
        "jumper",
        "pressurize",
        "depressurize",
        "inspect",
        "should i",
        "can i",
        "do i need to",
        "is it safe to",
        "is it ok to",
        "am i allowed to",
        "what tools",
        "which tools",
    ])
}

fn default_imperative_openers() -> Vec<String> {
    strings(&["show", "tell", "help", "give", "list", "teach", "guide", "walk", "let"])
}

fn default_conceptual_cues() -> Vec<String> {
    strings(&[
        "how does",
        "how do",
        "how is",
        "how are",
        "why",
        "what happens",
        "what is",
        "what are",
        "what does",
        "what role",
        "role of",
        "explain",
        "describe",
        "overview",
        "purpose of",
        "difference between",
        "compare",
        "cause",
        "effect",
        "flow of",
        "fault logic",
        "architecture",
        "concept",
        "conceptual",
        "when does",
        "which components",
    ])
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            strict_mode: default_strict_mode(),
            blocked_verbs: default_blocked_verbs(),
            procedural_phrases: default_procedural_phrases(),
            stepwise_terms: default_stepwise_terms(),
            diagnostic_terms: default_diagnostic_terms(),
            strict_procedural_phrases: default_strict_procedural_phrases(),
            action_markers: default_action_markers(),
            imperative_openers: default_imperative_openers(),
            conceptual_cues: default_conceptual_cues(),
        }
    }
}

impl SafetyConfig {
    /// Reject configurations the classifier cannot enforce faithfully
    pub fn validate(&self) -> Result<()> {
        if self.blocked_verbs.is_empty() {
            return Err(TutorError::Config("blocked_verbs must not be empty".into()));
        }
        for verb in &self.blocked_verbs {
            let v = verb.trim();
            if v.is_empty() || !v.chars().all(|c| c.is_alphanumeric()) {
                return Err(TutorError::Config(format!(
                    "blocked verb '{}' must be a single word",
                    verb
                )));
            }
        }
        if self.procedural_phrases.is_empty() {
            return Err(TutorError::Config(
                "procedural_phrases must not be empty".into(),
            ));
        }

        let phrase_lists = [
            ("procedural_phrases", &self.procedural_phrases),
            ("stepwise_terms", &self.stepwise_terms),
            ("diagnostic_terms", &self.diagnostic_terms),
            ("strict_procedural_phrases", &self.strict_procedural_phrases),
            ("action_markers", &self.action_markers),
            ("conceptual_cues", &self.conceptual_cues),
        ];
        for (field, list) in phrase_lists {
            for phrase in list.iter() {
                if let Some(pattern) = phrase.strip_prefix(REGEX_PREFIX) {
                    Regex::new(pattern).map_err(|e| {
                        TutorError::Config(format!("{}: invalid pattern '{}': {}", field, pattern, e))
                    })?;
                } else if phrase.trim().is_empty() {
                    return Err(TutorError::Config(format!("{}: empty phrase", field)));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Corpus
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Files or directories holding curated training material
    #[serde(default = "default_corpus_paths")]
    pub paths: Vec<PathBuf>,

    /// Passages handed to the synthesizer per question
    #[serde(default = "default_max_passages")]
    pub max_passages: usize,

    /// Snippet window in characters
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// YAML component label catalog
    #[serde(default = "default_component_labels", skip_serializing_if = "Option::is_none")]
    pub component_labels: Option<PathBuf>,
}

fn default_corpus_paths() -> Vec<PathBuf> {
    vec![PathBuf::from("corpus")]
}

fn default_max_passages() -> usize {
    3
}

fn default_snippet_chars() -> usize {
    200
}

fn default_component_labels() -> Option<PathBuf> {
    Some(PathBuf::from("config/component_labels.yaml"))
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            paths: default_corpus_paths(),
            max_passages: default_max_passages(),
            snippet_chars: default_snippet_chars(),
            component_labels: default_component_labels(),
        }
    }
}

impl CorpusConfig {
    /// Clamp passage count to 1-10
    pub fn effective_max_passages(&self) -> usize {
        self.max_passages.clamp(1, 10)
    }

    /// Clamp snippet window to 40-1000 characters
    pub fn effective_snippet_chars(&self) -> usize {
        self.snippet_chars.clamp(40, 1000)
    }
}

// ============================================================================
// Compliance
// ============================================================================

/// Blocked-query audit log settings.
///
/// Raw queries are never written unless `store_query_preview` is enabled,
/// which should stay off without a privacy review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    #[serde(default = "default_compliance_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_log_name")]
    pub log_name: String,

    /// Salt mixed into query fingerprints
    #[serde(default)]
    pub hash_salt: String,

    #[serde(default)]
    pub store_query_preview: bool,
}

fn default_compliance_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_name() -> String {
    "blocked_queries.jsonl".to_string()
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            enabled: default_compliance_enabled(),
            log_dir: default_log_dir(),
            log_name: default_log_name(),
            hash_salt: String::new(),
            store_query_preview: false,
        }
    }
}

impl ComplianceConfig {
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_name)
    }
}

// ============================================================================
// Server / Logging
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    crate::DEFAULT_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================================================
// Top-level
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub compliance: ComplianceConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Outcome of config discovery
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigHealth {
    /// Parsed and validated
    Loaded { path: PathBuf },
    /// No config file found anywhere
    Missing,
    /// Found but unreadable, unparsable or invalid
    Invalid { path: PathBuf, reason: String },
}

impl ConfigHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigHealth::Loaded { .. } => "loaded",
            ConfigHealth::Missing => "missing",
            ConfigHealth::Invalid { .. } => "invalid",
        }
    }
}

/// Config plus how it was obtained
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TutorConfig,
    pub health: ConfigHealth,
    /// Non-fatal problems found while loading (env overrides, etc.)
    pub diagnostics: Vec<String>,
}

impl LoadedConfig {
    /// True when the classifier must run in default-deny mode
    pub fn is_fail_safe(&self) -> bool {
        !matches!(self.health, ConfigHealth::Loaded { .. })
    }

    /// A validated in-memory config (used by tests and embedders)
    pub fn trusted(config: TutorConfig) -> Self {
        Self {
            config,
            health: ConfigHealth::Loaded {
                path: PathBuf::from("<memory>"),
            },
            diagnostics: Vec::new(),
        }
    }
}

impl TutorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TutorConfig = toml::from_str(content)?;
        config.safety.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TutorError::Config(format!("cannot render config: {}", e)))
    }

    /// Discover, load and apply env overrides. Never fails: problems are
    /// reported through `LoadedConfig::health` and `diagnostics`.
    pub fn load(explicit: Option<&Path>) -> LoadedConfig {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut loaded = Self::discover(explicit, env_path.as_deref());
        let diagnostics = loaded
            .config
            .apply_env_overrides(|key| std::env::var(key).ok());
        loaded.diagnostics.extend(diagnostics);
        loaded
    }

    /// Discovery without touching the process environment
    pub fn discover(explicit: Option<&Path>, env_path: Option<&Path>) -> LoadedConfig {
        if let Some(path) = explicit.or(env_path) {
            if !path.exists() {
                warn!("Config file {} not found, running fail-safe", path.display());
                return LoadedConfig {
                    config: TutorConfig::default(),
                    health: ConfigHealth::Missing,
                    diagnostics: vec![format!("config file {} not found", path.display())],
                };
            }
            return Self::load_from_path(path);
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        warn!("No config file found, running fail-safe");
        LoadedConfig {
            config: TutorConfig::default(),
            health: ConfigHealth::Missing,
            diagnostics: vec!["no config file found".to_string()],
        }
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(CONFIG_FILE),
            PathBuf::from("config").join(CONFIG_FILE),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("aerotutor").join("config.toml"));
        }
        paths
    }

    /// Load a specific file. Unreadable or invalid files yield defaults with
    /// `ConfigHealth::Invalid`.
    pub fn load_from_path(path: &Path) -> LoadedConfig {
        let result = fs::read_to_string(path)
            .map_err(TutorError::from)
            .and_then(|content| Self::from_toml_str(&content));

        match result {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                LoadedConfig {
                    config,
                    health: ConfigHealth::Loaded {
                        path: path.to_path_buf(),
                    },
                    diagnostics: Vec::new(),
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Config {} rejected, running fail-safe",
                    path.display()
                );
                LoadedConfig {
                    config: TutorConfig::default(),
                    health: ConfigHealth::Invalid {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    },
                    diagnostics: vec![format!("config {} rejected: {}", path.display(), e)],
                }
            }
        }
    }

    /// Apply `AEROTUTOR_*` overrides. Malformed values keep the more
    /// conservative setting and produce a diagnostic.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut diagnostics = Vec::new();

        if let Some(raw) = lookup("AEROTUTOR_STRICT_MODE") {
            match raw.trim() {
                "1" => self.safety.strict_mode = true,
                "0" => self.safety.strict_mode = false,
                other => {
                    self.safety.strict_mode = true;
                    diagnostics.push(format!(
                        "AEROTUTOR_STRICT_MODE='{}' not understood, strict mode forced on",
                        other
                    ));
                }
            }
        }

        if let Some(raw) = lookup("AEROTUTOR_COMPLIANCE_LOG") {
            match raw.trim() {
                "1" => self.compliance.enabled = true,
                "0" => self.compliance.enabled = false,
                other => diagnostics.push(format!(
                    "AEROTUTOR_COMPLIANCE_LOG='{}' not understood, ignored",
                    other
                )),
            }
        }

        if let Some(salt) = lookup("AEROTUTOR_LOG_SALT") {
            self.compliance.hash_salt = salt;
        }

        if let Some(raw) = lookup("AEROTUTOR_STORE_QUERY_PREVIEW") {
            // Anything but an explicit "1" keeps previews off
            self.compliance.store_query_preview = raw.trim() == "1";
        }

        for d in &diagnostics {
            warn!("{}", d);
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TutorConfig::default();
        assert!(config.safety.strict_mode);
        assert!(config.safety.blocked_verbs.contains(&"replace".to_string()));
        assert_eq!(config.corpus.max_passages, 3);
        assert!(config.compliance.enabled);
        assert!(!config.compliance.store_query_preview);
        assert_eq!(
            config.compliance.log_path(),
            PathBuf::from("logs/blocked_queries.jsonl")
        );
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let toml_str = r#"
[safety]
strict_mode = false
blocked_verbs = ["remove", "install"]

[compliance]
hash_salt = "pepper"
"#;
        let config = TutorConfig::from_toml_str(toml_str).unwrap();
        assert!(!config.safety.strict_mode);
        assert_eq!(config.safety.blocked_verbs, vec!["remove", "install"]);
        // Unspecified lists keep their defaults
        assert!(config.safety.procedural_phrases.contains(&"how to".to_string()));
        assert_eq!(config.compliance.hash_salt, "pepper");
        assert_eq!(config.compliance.log_name, "blocked_queries.jsonl");
    }

    #[test]
    fn test_unknown_safety_key_rejected() {
        let toml_str = r#"
[safety]
blocked_verb = ["remove"]
"#;
        assert!(TutorConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let toml_str = r#"
[safety]
strict_mode = "yes"
"#;
        assert!(TutorConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_verbs_and_bad_regex() {
        let mut safety = SafetyConfig::default();
        safety.blocked_verbs.clear();
        assert!(safety.validate().is_err());

        let mut safety = SafetyConfig::default();
        safety.procedural_phrases.push("re:([unclosed".to_string());
        assert!(safety.validate().is_err());

        let mut safety = SafetyConfig::default();
        safety.blocked_verbs.push("take apart".to_string());
        assert!(safety.validate().is_err());
    }

    #[test]
    fn test_default_safety_validates() {
        SafetyConfig::default().validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AEROTUTOR_STRICT_MODE", "0"),
            ("AEROTUTOR_COMPLIANCE_LOG", "0"),
            ("AEROTUTOR_LOG_SALT", "s3"),
            ("AEROTUTOR_STORE_QUERY_PREVIEW", "yes"),
        ]
        .into_iter()
        .collect();

        let mut config = TutorConfig::default();
        let diags = config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert!(diags.is_empty());
        assert!(!config.safety.strict_mode);
        assert!(!config.compliance.enabled);
        assert_eq!(config.compliance.hash_salt, "s3");
        // Only an explicit "1" enables previews
        assert!(!config.compliance.store_query_preview);
    }

    #[test]
    fn test_malformed_strict_env_forces_strict() {
        let mut config = TutorConfig::default();
        config.safety.strict_mode = false;
        let diags = config.apply_env_overrides(|k| {
            (k == "AEROTUTOR_STRICT_MODE").then(|| "maybe".to_string())
        });
        assert!(config.safety.strict_mode);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_round_trip_render() {
        let config = TutorConfig::default();
        let rendered = config.to_toml_string().unwrap();
        let back = TutorConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(back, config);
    }
}
