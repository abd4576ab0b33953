//! Answer synthesis.
//!
//! Turns retrieved passages into a conceptual explanation. The template
//! synthesizer is deterministic and never repeats the learner's question.

use crate::components::ComponentCatalog;
use crate::error::Result;
use crate::types::{RetrievedPassage, SystemFocus};
use std::sync::Arc;

/// Drafts an explanation from retrieved passages
pub trait Synthesizer: Send + Sync {
    fn synthesize(
        &self,
        question: &str,
        focus: SystemFocus,
        passages: &[RetrievedPassage],
    ) -> Result<String>;
}

pub const RESOURCES_HEADER: &str = "Relevant training resources include:";

pub const NO_RESOURCES: &str = "No detailed training documents are currently indexed for this topic. \
You can still reason about the system in terms of:\n\
- Primary sources of power or pressure.\n\
- Distribution paths and protection or regulation points.\n\
- Typical loads or actuators that depend on the system.";

pub const CLOSING_REFLECTION: &str = "When reviewing your question, focus on how the system is \
designed to behave (normal operation, failure modes, and protections), rather than on specific \
maintenance tasks.";

const DEFAULT_SUMMARY_CHARS: usize = 200;

fn framing(focus: SystemFocus) -> &'static str {
    match focus {
        SystemFocus::Electrical => {
            "Its architecture links sources (generators, batteries, external power) to \
             distribution buses, conversion equipment such as transformer rectifier units, and \
             the protection logic that isolates faults so essential loads stay powered."
        }
        SystemFocus::Hydraulic => {
            "Its architecture links pressure sources (engine-driven and electric pumps) to \
             reservoirs, accumulators, distribution lines with regulation and protection points, \
             and the actuators that depend on them."
        }
        SystemFocus::Other => {
            "Its architecture links energy sources to distribution paths, the loads or actuators \
             they support, and the protections built into the design."
        }
    }
}

/// Collapse whitespace and cap length, marking truncation with "..."
pub fn summarize(text: &str, max_chars: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}

/// Fixed-template synthesizer
#[derive(Debug, Clone)]
pub struct TemplateSynthesizer {
    catalog: Option<Arc<ComponentCatalog>>,
    summary_chars: usize,
}

impl Default for TemplateSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSynthesizer {
    pub fn new() -> Self {
        Self {
            catalog: None,
            summary_chars: DEFAULT_SUMMARY_CHARS,
        }
    }

    /// Name catalog components recognized in the question
    pub fn with_catalog(mut self, catalog: Arc<ComponentCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_summary_chars(mut self, chars: usize) -> Self {
        self.summary_chars = chars.max(10);
        self
    }

    fn components_section(&self, question: &str, focus: SystemFocus) -> Option<String> {
        let catalog = self.catalog.as_ref()?;
        let mentioned = catalog.mentioned_in(question, focus);
        if mentioned.is_empty() {
            return None;
        }
        let mut section = String::from("Components in this question:");
        for component in mentioned {
            section.push_str(&format!("\n- {} ({})", component.name, component.id));
            if !component.description.is_empty() {
                section.push_str(&format!(": {}", summarize(&component.description, self.summary_chars)));
            }
        }
        Some(section)
    }
}

impl Synthesizer for TemplateSynthesizer {
    fn synthesize(
        &self,
        question: &str,
        focus: SystemFocus,
        passages: &[RetrievedPassage],
    ) -> Result<String> {
        let mut sections = vec![format!(
            "{} can be understood as a set of major components and the paths that carry \
             energy or pressure between them. {} The description below is conceptual and \
             intended for training only.",
            focus.label(),
            framing(focus)
        )];

        if passages.is_empty() {
            sections.push(NO_RESOURCES.to_string());
        } else {
            let mut body = String::from(RESOURCES_HEADER);
            for passage in passages {
                body.push_str(&format!(
                    "\n- {}: {}",
                    passage.source,
                    summarize(&passage.text, self.summary_chars)
                ));
            }
            sections.push(body);
        }

        if let Some(components) = self.components_section(question, focus) {
            sections.push(components);
        }

        sections.push(CLOSING_REFLECTION.to_string());
        Ok(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentLabel;

    fn passage(source: &str, text: &str) -> RetrievedPassage {
        RetrievedPassage {
            document_id: source.to_string(),
            source: source.to_string(),
            text: text.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_lists_passages() {
        let synth = TemplateSynthesizer::new();
        let answer = synth
            .synthesize(
                "Why is the battery bus special?",
                SystemFocus::Electrical,
                &[passage("ac_distribution.md", "The  AC buses\nare fed by generators.")],
            )
            .unwrap();
        assert!(answer.starts_with("The electrical power system"));
        assert!(answer.contains(RESOURCES_HEADER));
        assert!(answer.contains("- ac_distribution.md: The AC buses are fed by generators."));
        assert!(answer.ends_with(CLOSING_REFLECTION));
    }

    #[test]
    fn test_generic_answer_without_passages() {
        let answer = TemplateSynthesizer::new()
            .synthesize("Why?", SystemFocus::Hydraulic, &[])
            .unwrap();
        assert!(answer.contains(NO_RESOURCES));
        assert!(!answer.contains(RESOURCES_HEADER));
    }

    #[test]
    fn test_never_echoes_question() {
        let question = "Why does the zebra quartz bus glow?";
        let answer = TemplateSynthesizer::new()
            .synthesize(question, SystemFocus::Other, &[])
            .unwrap();
        assert!(!answer.contains(question));
        assert!(!answer.contains("zebra"));
    }

    #[test]
    fn test_components_section() {
        let catalog = ComponentCatalog {
            electrical: vec![ComponentLabel {
                id: "TRU".into(),
                name: "Transformer rectifier unit".into(),
                aliases: vec!["tru".into()],
                description: "Converts AC to 28 V DC.".into(),
            }],
            ..ComponentCatalog::default()
        };
        let synth = TemplateSynthesizer::new().with_catalog(Arc::new(catalog));
        let answer = synth
            .synthesize("What does the TRU feed?", SystemFocus::Electrical, &[])
            .unwrap();
        assert!(answer.contains("Components in this question:"));
        assert!(answer.contains("- Transformer rectifier unit (TRU): Converts AC to 28 V DC."));
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("a  b\nc", 10), "a b c");
        let long = "x".repeat(300);
        let s = summarize(&long, 200);
        assert_eq!(s.chars().count(), 200);
        assert!(s.ends_with("..."));
    }
}
