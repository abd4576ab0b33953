//! Policy mediator.
//!
//! Single entry point of the tutor. Classifies the question first; only
//! conceptual questions reach the corpus and the synthesizer. Everything
//! else gets a fixed redirection and a compliance event.
//!
//! ```text
//! question ─▶ classify ─┬─ conceptual ─▶ retrieve ─▶ synthesize ─▶ release check ─▶ + disclaimer
//!                       └─ procedural / ambiguous ─▶ redirection ─▶ compliance event
//! ```

use crate::classifier::IntentClassifier;
use crate::compliance::ComplianceRecorder;
use crate::components::ComponentCatalog;
use crate::config::LoadedConfig;
use crate::corpus::SharedCorpus;
use crate::error::Result;
use crate::synthesizer::{Synthesizer, TemplateSynthesizer};
use crate::types::{Classification, QueryCategory, ReasonCode, SystemFocus, TutorResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Fixed texts
// ============================================================================

pub const BASE_NOTICE: &str = "This tutor is a training-only learning assistant for aircraft \
system understanding. It cannot provide maintenance procedures, task instructions, or real-world \
diagnostics.";

pub const PROCEDURAL_GUIDANCE: &str = "Your question appears to request task-level or procedural \
guidance. For actual maintenance work, always consult the approved Aircraft Maintenance Manual \
(AMM), applicable regulatory documents, and your instructor or supervising engineer.\n\n\
If you would like to continue using this tool, you can rephrase your question to focus on:\n\
- How the system is designed to operate.\n\
- How energy or pressure flows through the system.\n\
- What indications or protections are provided conceptually.";

pub const AMBIGUOUS_GUIDANCE: &str = "This question is somewhat ambiguous from a safety \
perspective. To stay within training-only limits, the tutor will not offer task-level advice.\n\n\
You may instead ask about:\n\
- System architecture and major components.\n\
- High-level effects of component failures.\n\
- The logic behind protections and redundancy.";

pub const DOCUMENTATION_REMINDER: &str = "Always defer to approved maintenance documentation, \
local procedures, and regulatory requirements (e.g., your national aviation authority) before \
performing any maintenance activity.";

pub const DISCLAIMER: &str = "---\nThis explanation is for educational and training purposes only. \
It is not a substitute for the approved Aircraft Maintenance Manual (AMM), type-specific training, \
or regulatory guidance. Do not use this system to plan or perform real-world maintenance.";

/// Used instead of [`DISCLAIMER`] when the configured vocabulary blocks a word in it
pub const SHORT_DISCLAIMER: &str = "---\nFor education and training only. Approved manuals and \
regulatory guidance always take precedence.";

/// Substituted for any draft line carrying task wording
pub const WITHHELD_LINE: &str =
    "[Content withheld: this line described task-level activity, which is outside training-only limits.]";

/// Wordless stand-in for [`WITHHELD_LINE`]
const WITHHELD_MARKER: &str = "[...]";

fn rephrasing_example(focus: SystemFocus) -> &'static str {
    match focus {
        SystemFocus::Electrical => "What happens to the AC buses if one generator fails?",
        SystemFocus::Hydraulic => "How is hydraulic pressure maintained if one pump stops working?",
        SystemFocus::Other => "What is the role of redundancy in aircraft system design?",
    }
}

/// Fixed redirection for a blocked question. Never echoes the question.
pub fn redirection_message(category: QueryCategory, focus: SystemFocus) -> String {
    let guidance = match category {
        QueryCategory::Procedural => PROCEDURAL_GUIDANCE,
        _ => AMBIGUOUS_GUIDANCE,
    };
    format!(
        "{}\n\n{}\n\nFor example, you could ask: \"{}\"\n\n{}",
        BASE_NOTICE,
        guidance,
        rephrasing_example(focus),
        DOCUMENTATION_REMINDER
    )
}

/// First candidate free of blocked verbs. If none is, the first candidate
/// with every offending sentence dropped.
fn verb_free_text(classifier: &IntentClassifier, candidates: &[&str]) -> String {
    if let Some(clean) = candidates
        .iter()
        .find(|text| classifier.blocked_verbs_in(text).is_empty())
    {
        return clean.to_string();
    }

    let first = candidates.first().copied().unwrap_or_default();
    warn!("Fixed text conflicts with the configured blocked verbs, trimming it");
    first
        .lines()
        .map(|line| {
            line.split_inclusive(". ")
                .filter(|sentence| classifier.blocked_verbs_in(sentence).is_empty())
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Mediator
// ============================================================================

/// Stateless per request; share via `Arc`.
pub struct PolicyMediator {
    classifier: IntentClassifier,
    corpus: Arc<SharedCorpus>,
    synthesizer: Arc<dyn Synthesizer>,
    compliance: Option<ComplianceRecorder>,
    max_passages: usize,
    /// Fixed texts screened against the classifier's vocabulary
    disclaimer: String,
    withheld: String,
}

impl PolicyMediator {
    /// Empty corpus, template synthesizer, no compliance log
    pub fn new(classifier: IntentClassifier) -> Self {
        let disclaimer = verb_free_text(&classifier, &[DISCLAIMER, SHORT_DISCLAIMER]);
        let withheld = verb_free_text(&classifier, &[WITHHELD_LINE, WITHHELD_MARKER]);

        for focus in SystemFocus::all() {
            for category in [QueryCategory::Procedural, QueryCategory::Ambiguous] {
                let message = redirection_message(category, focus);
                let hits = message
                    .lines()
                    .filter(|line| !classifier.blocked_verbs_in(line).is_empty())
                    .count();
                if hits > 0 {
                    warn!(
                        "{} redirection for {} will withhold {} line(s) under the configured verbs",
                        category.as_str(),
                        focus.as_str(),
                        hits
                    );
                }
            }
        }

        Self {
            classifier,
            corpus: Arc::new(SharedCorpus::empty()),
            synthesizer: Arc::new(TemplateSynthesizer::new()),
            compliance: None,
            max_passages: 3,
            disclaimer,
            withheld,
        }
    }

    pub fn with_corpus(mut self, corpus: Arc<SharedCorpus>) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn with_compliance(mut self, recorder: ComplianceRecorder) -> Self {
        self.compliance = Some(recorder);
        self
    }

    pub fn with_max_passages(mut self, k: usize) -> Self {
        self.max_passages = k;
        self
    }

    /// Wire everything from configuration: classifier (default-deny on an
    /// unhealthy config), corpus, component catalog, compliance log.
    pub fn from_config(loaded: &LoadedConfig) -> Self {
        let config = &loaded.config;
        let classifier = IntentClassifier::from_loaded(loaded);

        let corpus = Arc::new(SharedCorpus::empty());
        corpus.rebuild(&config.corpus.paths, config.corpus.effective_snippet_chars());

        let mut synthesizer =
            TemplateSynthesizer::new().with_summary_chars(config.corpus.effective_snippet_chars());
        if let Some(path) = &config.corpus.component_labels {
            synthesizer = synthesizer.with_catalog(Arc::new(ComponentCatalog::load_or_empty(path)));
        }

        let mut mediator = Self::new(classifier)
            .with_corpus(corpus)
            .with_synthesizer(Arc::new(synthesizer))
            .with_max_passages(config.corpus.effective_max_passages());
        mediator.compliance = ComplianceRecorder::from_config(&config.compliance);

        info!(
            "Mediator ready: classifier {}, {} documents, compliance log {}",
            mediator.classifier.mode().as_str(),
            mediator.corpus.len(),
            if mediator.compliance.is_some() { "on" } else { "off" }
        );
        mediator
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn corpus(&self) -> &Arc<SharedCorpus> {
        &self.corpus
    }

    pub fn compliance_enabled(&self) -> bool {
        self.compliance.is_some()
    }

    /// Answer or redirect one question.
    ///
    /// Retrieval is restricted to documents tagged with `focus`, except for
    /// [`SystemFocus::Other`], which searches the whole corpus.
    pub fn handle_question(&self, question: &str, focus: SystemFocus) -> TutorResponse {
        let classification = self.classifier.classify(question);
        debug!(
            category = classification.category.as_str(),
            focus = focus.as_str(),
            "Question classified"
        );

        if classification.is_blocked() {
            return self.redirect(question, focus, classification);
        }

        match self.answer_conceptual(question, focus) {
            Ok((draft, sources)) => {
                let released = self.release_check(&draft);
                TutorResponse {
                    answer: format!("{}\n\n{}", released.trim(), self.disclaimer),
                    system_focus: focus,
                    classification,
                    was_redirected: false,
                    sources,
                }
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "Conceptual answer failed, redirecting");
                let degraded = Classification::ambiguous(vec![
                    ReasonCode::AmbiguousIntent,
                    ReasonCode::PipelineFault,
                ]);
                self.redirect(question, focus, degraded)
            }
        }
    }

    fn answer_conceptual(&self, question: &str, focus: SystemFocus) -> Result<(String, Vec<String>)> {
        let index = self.corpus.current();
        let passages = index.retrieve(question, focus.retrieval_scope(), self.max_passages)?;
        let draft = self.synthesizer.synthesize(question, focus, &passages)?;
        let sources = passages.into_iter().map(|p| p.document_id).collect();
        Ok((draft, sources))
    }

    /// Withhold every draft line with a blocked verb form or task phrasing
    pub fn release_check(&self, draft: &str) -> String {
        let mut withheld = 0;
        let lines: Vec<&str> = draft
            .lines()
            .map(|line| {
                if !self.classifier.blocked_verbs_in(line).is_empty()
                    || self.classifier.has_procedural_language(line)
                {
                    withheld += 1;
                    self.withheld.as_str()
                } else {
                    line
                }
            })
            .collect();
        if withheld > 0 {
            warn!("Release check withheld {} draft line(s)", withheld);
        }
        lines.join("\n")
    }

    fn redirect(
        &self,
        question: &str,
        focus: SystemFocus,
        classification: Classification,
    ) -> TutorResponse {
        let message = redirection_message(classification.category, focus);

        // Custom vocabularies may name words the fixed text uses
        let answer = message
            .lines()
            .map(|line| {
                if self.classifier.blocked_verbs_in(line).is_empty() {
                    line
                } else {
                    self.withheld.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(recorder) = &self.compliance {
            recorder.record_blocked(question, &classification, focus);
        }

        info!(
            category = classification.category.as_str(),
            reasons = %classification.reason_codes().join(";"),
            "Question redirected"
        );

        TutorResponse {
            answer,
            system_focus: focus,
            classification,
            was_redirected: true,
            sources: Vec::new(),
        }
    }
}

impl std::fmt::Debug for PolicyMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyMediator")
            .field("mode", &self.classifier.mode())
            .field("documents", &self.corpus.len())
            .field("compliance", &self.compliance.is_some())
            .field("max_passages", &self.max_passages)
            .finish()
    }
}
