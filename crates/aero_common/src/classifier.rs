//! Intent classifier.
//!
//! Lexical heuristics that decide whether a question is conceptual,
//! procedural or ambiguous. Runs before any retrieval so blocked questions
//! never touch the corpus.
//!
//! Order of checks:
//! 1. Empty input → AMBIGUOUS
//! 2. Blocked task verbs (and inflections) → PROCEDURAL
//! 3. How-to / step-wise / diagnostic phrasing → PROCEDURAL
//! 4. Action-seeking uncertainty → AMBIGUOUS
//! 5. Otherwise CONCEPTUAL (AMBIGUOUS in default-deny mode)

use crate::config::{LoadedConfig, SafetyConfig, REGEX_PREFIX};
use crate::error::{Result, TutorError};
use crate::types::{Classification, ReasonCode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

// ============================================================================
// Mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// Configuration loaded and validated
    Normal,
    /// Configuration missing or rejected: nothing is conceptual
    DefaultDeny,
}

impl ClassifierMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierMode::Normal => "normal",
            ClassifierMode::DefaultDeny => "default_deny",
        }
    }
}

// ============================================================================
// Text normalization
// ============================================================================

/// Case-fold, drop apostrophes, turn other punctuation into word
/// boundaries and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regular inflections of a base verb, base form included
pub fn inflections(verb: &str) -> Vec<String> {
    let base = verb.trim().to_lowercase();
    let mut forms = vec![
        base.clone(),
        format!("{}s", base),
        format!("{}es", base),
        format!("{}ed", base),
        format!("{}d", base),
        format!("{}ing", base),
    ];
    if let Some(stem) = base.strip_suffix('e') {
        if !stem.is_empty() {
            forms.push(format!("{}ing", stem));
        }
    }
    forms
}

/// A configured phrase: whole-word sequence or raw regex
#[derive(Debug, Clone)]
enum PhrasePattern {
    Words(String),
    Pattern(Regex),
}

impl PhrasePattern {
    fn compile(raw: &str) -> Result<Self> {
        if let Some(pattern) = raw.strip_prefix(REGEX_PREFIX) {
            let re = Regex::new(pattern)
                .map_err(|e| TutorError::Config(format!("invalid pattern '{}': {}", pattern, e)))?;
            return Ok(PhrasePattern::Pattern(re));
        }
        let words = normalize(raw);
        if words.is_empty() {
            return Err(TutorError::Config(format!("phrase '{}' has no words", raw)));
        }
        Ok(PhrasePattern::Words(format!(" {} ", words)))
    }

    /// `padded` is normalized text with a leading and trailing space
    fn matches(&self, padded: &str) -> bool {
        match self {
            PhrasePattern::Words(seq) => padded.contains(seq.as_str()),
            PhrasePattern::Pattern(re) => re.is_match(padded.trim()),
        }
    }
}

fn compile_all(list: &[String]) -> Result<Vec<PhrasePattern>> {
    list.iter().map(|p| PhrasePattern::compile(p)).collect()
}

// ============================================================================
// Classifier
// ============================================================================

/// Lexical intent classifier. Immutable after construction.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    mode: ClassifierMode,
    strict: bool,
    /// Inflected form → base verb
    verb_forms: HashMap<String, String>,
    procedural: Vec<PhrasePattern>,
    stepwise: Vec<PhrasePattern>,
    diagnostic: Vec<PhrasePattern>,
    action_markers: Vec<PhrasePattern>,
    imperative_openers: HashSet<String>,
    conceptual_cues: Vec<PhrasePattern>,
}

impl IntentClassifier {
    /// Build from a validated safety vocabulary
    pub fn new(safety: &SafetyConfig) -> Result<Self> {
        safety.validate()?;

        let mut verb_forms = HashMap::new();
        for verb in &safety.blocked_verbs {
            let base = verb.trim().to_lowercase();
            for form in inflections(&base) {
                verb_forms.entry(form).or_insert_with(|| base.clone());
            }
        }

        let mut procedural = compile_all(&safety.procedural_phrases)?;
        if safety.strict_mode {
            procedural.extend(compile_all(&safety.strict_procedural_phrases)?);
        }

        Ok(Self {
            mode: ClassifierMode::Normal,
            strict: safety.strict_mode,
            verb_forms,
            procedural,
            stepwise: compile_all(&safety.stepwise_terms)?,
            diagnostic: compile_all(&safety.diagnostic_terms)?,
            action_markers: compile_all(&safety.action_markers)?,
            imperative_openers: safety
                .imperative_openers
                .iter()
                .map(|w| normalize(w))
                .filter(|w| !w.is_empty())
                .collect(),
            conceptual_cues: compile_all(&safety.conceptual_cues)?,
        })
    }

    /// Conservative built-in vocabulary, strict, nothing conceptual
    pub fn default_deny() -> Self {
        let safety = SafetyConfig {
            strict_mode: true,
            ..SafetyConfig::default()
        };
        let mut classifier = match Self::new(&safety) {
            Ok(c) => c,
            // Built-in lists always compile; keep a verb-only fallback regardless
            Err(_) => Self::verbs_only(&safety.blocked_verbs),
        };
        classifier.mode = ClassifierMode::DefaultDeny;
        classifier
    }

    fn verbs_only(verbs: &[String]) -> Self {
        let mut verb_forms = HashMap::new();
        for verb in verbs {
            for form in inflections(verb) {
                verb_forms.entry(form).or_insert_with(|| verb.to_lowercase());
            }
        }
        Self {
            mode: ClassifierMode::DefaultDeny,
            strict: true,
            verb_forms,
            procedural: Vec::new(),
            stepwise: Vec::new(),
            diagnostic: Vec::new(),
            action_markers: Vec::new(),
            imperative_openers: HashSet::new(),
            conceptual_cues: Vec::new(),
        }
    }

    /// Build from a loaded config; anything but a healthy config (or a
    /// vocabulary that fails to compile) gives default-deny mode.
    pub fn from_loaded(loaded: &LoadedConfig) -> Self {
        if loaded.is_fail_safe() {
            warn!(
                "Config {}, classifier running in default-deny mode",
                loaded.health.as_str()
            );
            return Self::default_deny();
        }
        match Self::new(&loaded.config.safety) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Safety vocabulary rejected, classifier running in default-deny mode");
                Self::default_deny()
            }
        }
    }

    pub fn mode(&self) -> ClassifierMode {
        self.mode
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Classify a question. Same input and configuration always give the
    /// same result.
    pub fn classify(&self, query: &str) -> Classification {
        let normalized = normalize(query);

        // 1. Nothing to classify
        if normalized.is_empty() {
            return Classification::ambiguous(vec![
                ReasonCode::AmbiguousIntent,
                ReasonCode::EmptyQuery,
            ]);
        }

        let padded = format!(" {} ", normalized);
        let mut reasons = Vec::new();

        // 2. Blocked task verbs
        let verbs = self.verbs_in_normalized(&normalized);
        if !verbs.is_empty() {
            reasons.push(ReasonCode::BlockedVerbs(verbs));
        }

        // 3. Task phrasing
        let how_to = self.procedural.iter().any(|p| p.matches(&padded));
        let stepwise = self.stepwise.iter().any(|p| p.matches(&padded));
        let diagnostic = self.diagnostic.iter().any(|p| p.matches(&padded));
        if how_to || stepwise || diagnostic {
            reasons.push(ReasonCode::TaskHowToLanguage);
        }
        if stepwise {
            reasons.push(ReasonCode::StepwiseLanguage);
        }
        if diagnostic {
            reasons.push(ReasonCode::DiagnosticLanguage);
        }

        if !reasons.is_empty() {
            debug!("Procedural question: {:?}", reasons);
            return Classification::procedural(reasons);
        }

        // 4. Action-seeking uncertainty
        if self.is_uncertain(&normalized, &padded) {
            return Classification::ambiguous(vec![ReasonCode::AmbiguousIntent]);
        }

        // 5. Conceptual, unless we cannot trust the vocabulary
        if self.mode == ClassifierMode::DefaultDeny {
            return Classification::ambiguous(vec![
                ReasonCode::AmbiguousIntent,
                ReasonCode::ConfigFallback,
            ]);
        }

        Classification::conceptual()
    }

    fn is_uncertain(&self, normalized: &str, padded: &str) -> bool {
        if self.action_markers.iter().any(|p| p.matches(padded)) {
            return true;
        }

        let opener = normalized.split(' ').next().unwrap_or_default();
        if self.imperative_openers.contains(opener) {
            return true;
        }

        self.strict && !self.conceptual_cues.iter().any(|p| p.matches(padded))
    }

    fn verbs_in_normalized(&self, normalized: &str) -> Vec<String> {
        let found: BTreeSet<&str> = normalized
            .split(' ')
            .filter_map(|word| self.verb_forms.get(word).map(String::as_str))
            .collect();
        found.into_iter().map(String::from).collect()
    }

    /// Base forms of blocked verbs appearing anywhere in `text` (sorted)
    pub fn blocked_verbs_in(&self, text: &str) -> Vec<String> {
        self.verbs_in_normalized(&normalize(text))
    }

    /// True if `text` carries how-to, step-wise or diagnostic phrasing
    pub fn has_procedural_language(&self, text: &str) -> bool {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return false;
        }
        let padded = format!(" {} ", normalized);
        self.procedural
            .iter()
            .chain(&self.stepwise)
            .chain(&self.diagnostic)
            .any(|p| p.matches(&padded))
    }
}
