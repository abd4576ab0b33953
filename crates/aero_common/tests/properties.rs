//! Property tests for the safety guarantees

use aero_common::classifier::normalize;
use aero_common::mediator::{redirection_message, DISCLAIMER, SHORT_DISCLAIMER, WITHHELD_LINE};
use aero_common::synthesizer::{CLOSING_REFLECTION, NO_RESOURCES, RESOURCES_HEADER};
use aero_common::{
    fingerprint_query, IntentClassifier, PolicyMediator, QueryCategory, SafetyConfig, SystemFocus,
};
use std::collections::BTreeSet;
use proptest::prelude::*;

fn classifier() -> IntentClassifier {
    IntentClassifier::new(&SafetyConfig::default()).unwrap()
}

fn focus() -> impl Strategy<Value = SystemFocus> {
    prop::sample::select(SystemFocus::all().to_vec())
}

fn verb() -> impl Strategy<Value = String> {
    prop::sample::select(SafetyConfig::default().blocked_verbs)
}

// ── Blocked verbs always redirect ─────────────────────────────────────────

proptest! {
    #[test]
    fn blocked_verb_anywhere_is_procedural(
        verb in verb(),
        prefix in "[a-z ]{0,30}",
        suffix in "[a-z ]{0,30}",
    ) {
        let question = format!("{prefix} {verb} {suffix}");
        let verdict = classifier().classify(&question);
        prop_assert_eq!(verdict.category, QueryCategory::Procedural);
        let code = verdict.reason_codes()[0].clone();
        prop_assert!(code.starts_with("blocked_verbs:"));
        prop_assert!(code.trim_start_matches("blocked_verbs:").split(',').any(|v| v == verb));
    }

    #[test]
    fn answers_never_contain_blocked_verbs(question in ".{0,120}", focus in focus()) {
        let mediator = PolicyMediator::new(classifier());
        let response = mediator.handle_question(&question, focus);
        prop_assert!(classifier().blocked_verbs_in(&response.answer).is_empty());
        prop_assert_eq!(response.system_focus, focus);
        prop_assert_eq!(response.was_redirected, response.classification.is_blocked());
    }
}

/// Every word the mediator or synthesizer can emit on its own
fn fixed_text_words() -> Vec<String> {
    let mut texts = vec![
        DISCLAIMER.to_string(),
        SHORT_DISCLAIMER.to_string(),
        WITHHELD_LINE.to_string(),
        RESOURCES_HEADER.to_string(),
        NO_RESOURCES.to_string(),
        CLOSING_REFLECTION.to_string(),
    ];
    for focus in SystemFocus::all() {
        for category in [QueryCategory::Procedural, QueryCategory::Ambiguous] {
            texts.push(redirection_message(category, focus));
        }
    }
    let words: BTreeSet<String> = texts
        .iter()
        .flat_map(|t| normalize(t).split(' ').map(String::from).collect::<Vec<_>>())
        .filter(|w| !w.is_empty())
        .collect();
    words.into_iter().collect()
}

proptest! {
    #[test]
    fn configured_verbs_never_leak_from_fixed_texts(
        extra in prop::sample::select(fixed_text_words()),
        question in prop::sample::select(vec![
            "How does the main AC bus stay powered if one generator fails?",
            "Why does hydraulic pressure drop when a pump stops?",
            "What steps should I follow to replace the generator?",
            "Should I bleed the brakes?",
        ]),
        focus in focus(),
    ) {
        let mut safety = SafetyConfig::default();
        safety.blocked_verbs.push(extra.clone());
        let classifier = IntentClassifier::new(&safety).unwrap();
        let mediator = PolicyMediator::new(classifier.clone());

        let response = mediator.handle_question(question, focus);
        prop_assert!(
            classifier.blocked_verbs_in(&response.answer).is_empty(),
            "'{}' leaked into: {}",
            extra,
            response.answer
        );
    }
}

// ── Classification is a pure function of input and vocabulary ─────────────

proptest! {
    #[test]
    fn classification_idempotent(question in ".{0,120}") {
        let c = classifier();
        prop_assert_eq!(c.classify(&question), c.classify(&question));
    }

    #[test]
    fn non_conceptual_always_has_reasons(question in ".{0,120}") {
        let verdict = classifier().classify(&question);
        if verdict.category != QueryCategory::Conceptual {
            prop_assert!(!verdict.reasons.is_empty());
        }
    }

    #[test]
    fn whitespace_only_is_ambiguous(question in "[ \t\n]{0,10}") {
        let verdict = classifier().classify(&question);
        prop_assert_eq!(verdict.category, QueryCategory::Ambiguous);
        prop_assert!(verdict.has_reason("empty_query"));
    }
}

// ── Fingerprints ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn fingerprint_reproducible_and_opaque(query in "[g-z]{6,20}", salt in "[a-z0-9]{0,12}") {
        let a = fingerprint_query(&query, &salt);
        prop_assert_eq!(&a, &fingerprint_query(&query, &salt));
        prop_assert_eq!(a.len(), 64);
        prop_assert!(!a.contains(&query));
        prop_assert_ne!(a, fingerprint_query(&query, &format!("{salt}x")));
    }

    #[test]
    fn fingerprint_distinguishes_queries(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assume!(a != b);
        prop_assert_ne!(fingerprint_query(&a, "s"), fingerprint_query(&b, "s"));
    }
}
