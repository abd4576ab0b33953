//! Keyword-overlap index.
//!
//! Score = number of distinct informative query tokens found in the
//! document. Deterministic: ties keep ingestion order.

use super::ingest::load_documents;
use super::{CorpusIndex, IngestReport};
use crate::error::Result;
use crate::types::{Document, DocumentKind, RetrievedPassage, SystemFocus};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Words too common to say anything about relevance
const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "between", "but", "by", "can", "could", "did", "do", "does", "doing",
    "during", "each", "for", "from", "had", "has", "have", "how", "if", "in", "into", "is", "it",
    "its", "me", "more", "my", "no", "not", "of", "on", "one", "or", "other", "our", "out",
    "over", "same", "should", "so", "some", "such", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "why", "will",
    "with", "would", "you", "your",
];

pub const DEFAULT_SNIPPET_CHARS: usize = 200;

/// Tokenize text into lowercase alphanumeric runs (deterministic)
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() >= 2)
        .map(String::from)
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.binary_search(&token).is_ok()
}

/// Distinct informative tokens, in first-seen order
pub fn informative_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stopword(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[derive(Debug, Clone)]
struct IndexedDocument {
    document: Document,
    tokens: HashSet<String>,
}

/// In-memory keyword index over curated documents
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    entries: Vec<IndexedDocument>,
    ids: HashSet<String>,
    snippet_chars: usize,
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars.max(1);
        self
    }

    /// Index a single document. Returns false if the identifier is taken.
    pub fn add_document(&mut self, document: Document) -> bool {
        if !self.ids.insert(document.id.clone()) {
            return false;
        }
        let tokens = tokenize(&document.body).into_iter().collect();
        self.entries.push(IndexedDocument { document, tokens });
        true
    }

    /// Documents in ingestion order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }

    pub fn count_for(&self, focus: SystemFocus) -> usize {
        self.entries
            .iter()
            .filter(|e| e.document.focus == focus)
            .count()
    }

    fn passage_for(&self, doc: &Document, query_tokens: &[String], score: usize) -> RetrievedPassage {
        let text = match doc.kind {
            DocumentKind::BinaryStub => doc.body.clone(),
            DocumentKind::Text => extract_snippet(&doc.body, query_tokens, self.snippet_chars),
        };
        RetrievedPassage {
            document_id: doc.id.clone(),
            source: doc.source_name(),
            text,
            score: score as f32,
        }
    }
}

impl CorpusIndex for LexicalIndex {
    fn ingest(&mut self, paths: &[PathBuf]) -> IngestReport {
        let mut report = IngestReport::default();
        for document in load_documents(paths, &mut report) {
            let id = document.id.clone();
            let kind = document.kind;
            if !self.add_document(document) {
                warn!("Document {} already indexed, keeping the first copy", id);
                match kind {
                    DocumentKind::Text => report.text_documents -= 1,
                    DocumentKind::BinaryStub => report.binary_stubs -= 1,
                }
                report.skip(format!("{}: duplicate identifier", id));
            }
        }
        debug!("Ingested {} documents", report.indexed());
        report
    }

    fn retrieve(
        &self,
        query: &str,
        focus: Option<SystemFocus>,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let query_tokens = informative_tokens(query);
        if query_tokens.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, &IndexedDocument)> = self
            .entries
            .iter()
            .filter(|e| focus.map_or(true, |f| e.document.focus == f))
            .map(|e| {
                let score = query_tokens.iter().filter(|t| e.tokens.contains(*t)).count();
                (score, e)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // Stable sort: equal scores keep ingestion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, e)| self.passage_for(&e.document, &query_tokens, score))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Deterministic window of about `max_chars` characters around the first
/// word carrying a query token. Whitespace is collapsed; ellipses mark
/// truncation on either side.
pub fn extract_snippet(body: &str, query_tokens: &[String], max_chars: usize) -> String {
    let words: Vec<&str> = body.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }

    let first_match = words.iter().position(|word| {
        tokenize(word)
            .iter()
            .any(|t| query_tokens.iter().any(|q| q == t))
    });

    // Lead in with roughly a quarter of the window before the match
    let start = match first_match {
        Some(pos) => {
            let lead_budget = max_chars / 4;
            let mut start = pos;
            let mut lead = 0;
            while start > 0 {
                let len = words[start - 1].chars().count() + 1;
                if lead + len > lead_budget {
                    break;
                }
                lead += len;
                start -= 1;
            }
            start
        }
        None => 0,
    };

    let mut snippet = String::new();
    let mut used = 0;
    let mut end = start;
    for word in &words[start..] {
        let len = word.chars().count() + usize::from(!snippet.is_empty());
        if used + len > max_chars && !snippet.is_empty() {
            break;
        }
        if !snippet.is_empty() {
            snippet.push(' ');
        }
        snippet.push_str(word);
        used += len;
        end += 1;
    }

    if start > 0 {
        snippet = format!("...{}", snippet);
    }
    if end < words.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, focus: SystemFocus, body: &str) -> Document {
        Document::new(id, focus, DocumentKind::Text, body, id)
    }

    #[test]
    fn test_stopwords_sorted() {
        let mut sorted = STOPWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOPWORDS);
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("AC-bus #2: the TRU's output, 28V DC.");
        assert!(tokens.contains(&"ac".to_string()));
        assert!(tokens.contains(&"bus".to_string()));
        assert!(tokens.contains(&"tru".to_string()));
        assert!(tokens.contains(&"28v".to_string()));
        // Single chars are dropped
        assert!(!tokens.contains(&"s".to_string()));
        assert!(!tokens.contains(&"2".to_string()));
    }

    #[test]
    fn test_informative_tokens_dedup_and_stopwords() {
        let tokens = informative_tokens("How does the bus stay powered, the bus?");
        assert_eq!(tokens, vec!["bus", "stay", "powered"]);
    }

    #[test]
    fn test_overlap_scoring_and_order() {
        let mut index = LexicalIndex::new();
        index.add_document(doc("a.md", SystemFocus::Electrical, "generator feeds the bus"));
        index.add_document(doc(
            "b.md",
            SystemFocus::Electrical,
            "generator feeds the ac bus through a breaker",
        ));
        index.add_document(doc("c.md", SystemFocus::Electrical, "battery"));

        let hits = index
            .retrieve("generator ac bus breaker", None, 5)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "b.md");
        assert_eq!(hits[0].score, 4.0);
        assert_eq!(hits[1].document_id, "a.md");
        assert_eq!(hits[1].score, 2.0);
    }

    #[test]
    fn test_ties_keep_ingestion_order() {
        let mut index = LexicalIndex::new();
        index.add_document(doc("z.md", SystemFocus::Hydraulic, "pump pressure"));
        index.add_document(doc("a.md", SystemFocus::Hydraulic, "pump pressure"));

        let hits = index.retrieve("pump", None, 5).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(ids, vec!["z.md", "a.md"]);
    }

    #[test]
    fn test_focus_filter() {
        let mut index = LexicalIndex::new();
        index.add_document(doc("e.md", SystemFocus::Electrical, "pressure of the bus"));
        index.add_document(doc("h.md", SystemFocus::Hydraulic, "pressure in the reservoir"));

        let hits = index
            .retrieve("pressure", Some(SystemFocus::Hydraulic), 5)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_id, "h.md");

        let all = index.retrieve("pressure", None, 5).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_empty_index_and_no_overlap() {
        let index = LexicalIndex::new();
        assert!(index.retrieve("generator", None, 3).unwrap().is_empty());

        let mut index = LexicalIndex::new();
        index.add_document(doc("a.md", SystemFocus::Other, "landing gear"));
        assert!(index.retrieve("generator", None, 3).unwrap().is_empty());
        assert!(index.retrieve("the of and", None, 3).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut index = LexicalIndex::new();
        assert!(index.add_document(doc("a.md", SystemFocus::Other, "one")));
        assert!(!index.add_document(doc("a.md", SystemFocus::Other, "two")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_snippet_window() {
        let body = format!("{} generator output {}", "lead ".repeat(100), "tail ".repeat(100));
        let tokens = vec!["generator".to_string()];
        let snippet = extract_snippet(&body, &tokens, 60);
        assert!(snippet.starts_with("..."));
        assert!(snippet.ends_with("..."));
        assert!(snippet.contains("generator output"));
        assert!(snippet.chars().count() <= 66);
    }

    #[test]
    fn test_snippet_short_body_untouched() {
        let tokens = vec!["bus".to_string()];
        assert_eq!(
            extract_snippet("The  AC\nbus is fed.", &tokens, 200),
            "The AC bus is fed."
        );
    }

    #[test]
    fn test_binary_stub_returned_whole() {
        let mut index = LexicalIndex::new().with_snippet_chars(40);
        let stub = super::super::ingest::binary_stub("electrical_schematic.pdf");
        index.add_document(Document::new(
            "electrical_schematic.pdf",
            SystemFocus::Electrical,
            DocumentKind::BinaryStub,
            stub.clone(),
            "electrical_schematic.pdf",
        ));
        let hits = index.retrieve("training diagrams", None, 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, stub);
    }
}
