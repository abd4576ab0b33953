//! Curated training corpus.
//!
//! [`CorpusIndex`] is the retrieval seam; [`LexicalIndex`] is the default
//! keyword-overlap adapter. [`SharedCorpus`] publishes an index so it can be
//! rebuilt while questions are being answered.

pub mod ingest;
pub mod lexical;

pub use lexical::{tokenize, LexicalIndex};

use crate::error::{Result, TutorError};
use crate::types::{RetrievedPassage, SystemFocus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Retrieval backend capability
pub trait CorpusIndex: Send + Sync {
    /// Add documents from files or directories. Never aborts the batch.
    fn ingest(&mut self, paths: &[PathBuf]) -> IngestReport;

    /// Top-`k` passages for `query`, restricted to `focus` when given
    fn retrieve(
        &self,
        query: &str,
        focus: Option<SystemFocus>,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>>;

    /// Number of indexed documents
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of an ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub text_documents: usize,
    pub binary_stubs: usize,
    /// Unsupported extensions and duplicate identifiers
    pub skipped: usize,
    /// Unreadable files or paths
    pub failed: usize,
    pub diagnostics: Vec<String>,
}

impl IngestReport {
    pub fn indexed(&self) -> usize {
        self.text_documents + self.binary_stubs
    }

    pub(crate) fn fail(&mut self, error: &TutorError) {
        self.failed += 1;
        self.diagnostics.push(error.to_string());
    }

    pub(crate) fn skip(&mut self, reason: String) {
        self.skipped += 1;
        self.diagnostics.push(reason);
    }
}

// ============================================================================
// Shared publication
// ============================================================================

/// Read-mostly handle to the live index.
///
/// Readers clone the `Arc` and query without holding the lock; a rebuild
/// happens off to the side and is swapped in whole.
pub struct SharedCorpus {
    current: RwLock<Arc<dyn CorpusIndex>>,
}

impl SharedCorpus {
    pub fn new<I: CorpusIndex + 'static>(index: I) -> Self {
        Self::from_arc(Arc::new(index))
    }

    pub fn from_arc(index: Arc<dyn CorpusIndex>) -> Self {
        Self {
            current: RwLock::new(index),
        }
    }

    /// An empty lexical index
    pub fn empty() -> Self {
        Self::new(LexicalIndex::new())
    }

    /// Snapshot of the live index
    pub fn current(&self) -> Arc<dyn CorpusIndex> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publish a new index, returning the previous one
    pub fn replace(&self, index: Arc<dyn CorpusIndex>) -> Arc<dyn CorpusIndex> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, index)
    }

    /// Build a fresh lexical index from `paths` and swap it in
    pub fn rebuild(&self, paths: &[PathBuf], snippet_chars: usize) -> IngestReport {
        let mut fresh = LexicalIndex::new().with_snippet_chars(snippet_chars);
        let report = fresh.ingest(paths);
        info!(
            "Corpus rebuilt: {} documents ({} stubs), {} skipped, {} failed",
            report.indexed(),
            report.binary_stubs,
            report.skipped,
            report.failed
        );
        self.replace(Arc::new(fresh));
        report
    }

    pub fn len(&self) -> usize {
        self.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SharedCorpus {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for SharedCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCorpus")
            .field("documents", &self.len())
            .finish()
    }
}
