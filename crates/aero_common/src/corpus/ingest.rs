//! Corpus file loading.
//!
//! Walks files and directories, tags each document with a system focus
//! derived from its path, and turns binary training material into stubs.

use super::IngestReport;
use crate::error::{Result, TutorError};
use crate::types::{Document, DocumentKind, SystemFocus};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions read as text
pub const TEXT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Extensions indexed as a stub pointing at the resource
pub const BINARY_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

/// What to do with a file, decided from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Binary,
    Unsupported,
}

pub fn classify_file(path: &Path) -> FileClass {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        FileClass::Text
    } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        FileClass::Binary
    } else {
        FileClass::Unsupported
    }
}

fn focus_for_component(part: &str) -> Option<SystemFocus> {
    let part = part.to_lowercase();
    if part.contains("electrical") {
        Some(SystemFocus::Electrical)
    } else if part.contains("hydraulic") {
        Some(SystemFocus::Hydraulic)
    } else {
        None
    }
}

/// Derive the focus tag from path components: the innermost tagged
/// directory wins, then the file name. Untagged material is `Other`.
pub fn focus_for_path(path: &Path) -> SystemFocus {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let Some((file_name, dirs)) = parts.split_last() else {
        return SystemFocus::Other;
    };
    dirs.iter()
        .rev()
        .chain(std::iter::once(file_name))
        .find_map(|part| focus_for_component(part))
        .unwrap_or(SystemFocus::Other)
}

fn ingest_error(path: &Path, reason: impl ToString) -> TutorError {
    TutorError::Ingest {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Stub body for a PDF or image
pub fn binary_stub(name: &str) -> String {
    format!(
        "{}: training material (PDF/image). Refer to this resource for diagrams or figures related to the queried system.",
        name
    )
}

/// Load every supported document under `paths`, in walk order.
///
/// Never aborts: unreadable entries are counted and reported.
pub fn load_documents(paths: &[PathBuf], report: &mut IngestReport) -> Vec<Document> {
    let mut documents = Vec::new();

    for root in paths {
        if !root.exists() {
            warn!("Corpus path {} does not exist", root.display());
            report.fail(&ingest_error(root, "path does not exist"));
            continue;
        }

        // A single file is identified by its name; directory members by
        // their path relative to the directory.
        let base = if root.is_dir() {
            root.clone()
        } else {
            root.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    warn!("Cannot walk {}: {}", path.display(), e);
                    report.fail(&ingest_error(&path, &e));
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let class = classify_file(path);
            if class == FileClass::Unsupported {
                debug!("Skipping unsupported file {}", path.display());
                report.skipped += 1;
                continue;
            }

            let relative = path.strip_prefix(&base).unwrap_or(path);
            let id = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            // Tag from the full path so a root like `corpus/electrical` keeps its focus
            let focus = focus_for_path(path);

            match load_one(path, class) {
                Ok((kind, body)) => {
                    match kind {
                        DocumentKind::Text => report.text_documents += 1,
                        DocumentKind::BinaryStub => report.binary_stubs += 1,
                    }
                    documents.push(Document::new(id, focus, kind, body, path));
                }
                Err(e) => {
                    warn!("Skipping unreadable corpus file: {}", e);
                    report.fail(&e);
                }
            }
        }
    }

    documents
}

fn load_one(path: &Path, class: FileClass) -> Result<(DocumentKind, String)> {
    match class {
        FileClass::Binary => {
            // Confirm the resource is actually there before pointing learners at it
            fs::metadata(path).map_err(|e| ingest_error(path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok((DocumentKind::BinaryStub, binary_stub(&name)))
        }
        _ => {
            let bytes = fs::read(path).map_err(|e| ingest_error(path, e))?;
            Ok((DocumentKind::Text, String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}
