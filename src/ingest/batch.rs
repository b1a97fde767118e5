//! Multi-document batches: files, directories and zip archives.
//!
//! A failure in one document is recorded and never aborts the batch.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{parse_document, IngestError, LogFormat};
use crate::config::LimitsConfig;
use crate::types::Sample;

/// Extensions treated as tabular log documents
const LOG_EXTENSIONS: &[&str] = &["csv", "txt", "tsv"];

/// Raw text of one log, labelled with the trip it belongs to
#[derive(Debug, Clone)]
pub struct Document {
    pub label: String,
    pub text: String,
}

impl Document {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// A document that could not be read or parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub label: String,
    pub error: String,
}

/// Per-document bookkeeping in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStats {
    pub label: String,
    pub format: LogFormat,
    pub samples: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Everything ingested from a batch
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub samples: Vec<Sample>,
    pub documents: Vec<DocumentStats>,
    pub failures: Vec<FileFailure>,
    pub notes: Vec<String>,
}

/// Parse every document; failures are recorded and skipped
pub fn ingest_batch(documents: &[Document], limits: &LimitsConfig) -> IngestReport {
    let mut report = IngestReport::default();

    for doc in documents {
        match parse_document(&doc.text, &doc.label, limits) {
            Ok(parsed) => {
                report.documents.push(DocumentStats {
                    label: parsed.label,
                    format: parsed.format,
                    samples: parsed.samples.len(),
                    rows_read: parsed.rows_read,
                    rows_skipped: parsed.rows_skipped,
                });
                report.notes.extend(parsed.notes);
                report.samples.extend(parsed.samples);
            }
            Err(e) => {
                warn!(document = %doc.label, error = %e, "Document skipped");
                report.failures.push(FileFailure {
                    label: doc.label.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        documents = documents.len(),
        parsed = report.documents.len(),
        failed = report.failures.len(),
        samples = report.samples.len(),
        "Batch ingested"
    );
    report
}

// ============================================================================
// Loading From Disk
// ============================================================================

/// Read documents from files, directories (one level, sorted) and `.zip`
/// archives. Unreadable or oversized inputs are returned as failures.
///
/// Documents are labelled by file stem; a stem seen earlier in the batch
/// gets a `_2`, `_3`, ... suffix so every document stays its own trip.
pub fn load_documents(paths: &[PathBuf], limits: &LimitsConfig) -> (Vec<Document>, Vec<FileFailure>) {
    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for path in paths {
        if path.is_dir() {
            match list_dir(path) {
                Ok(entries) => {
                    for entry in entries {
                        load_file(&entry, limits, &mut documents, &mut failures);
                    }
                }
                Err(e) => failures.push(failure_for(path, &e)),
            }
        } else {
            load_file(path, limits, &mut documents, &mut failures);
        }
    }

    dedupe_labels(&mut documents);
    (documents, failures)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let io_err = |source| IngestError::Io { path: dir.to_path_buf(), source };
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && (is_zip(p) || has_log_extension(p)))
        .collect();
    entries.sort();
    Ok(entries)
}

fn load_file(path: &Path, limits: &LimitsConfig, documents: &mut Vec<Document>, failures: &mut Vec<FileFailure>) {
    let result = if is_zip(path) {
        read_archive(path, limits).map(|(docs, entry_failures)| {
            documents.extend(docs);
            failures.extend(entry_failures);
        })
    } else {
        read_text(path, limits).map(|text| documents.push(Document::new(label_for(path), text)))
    };
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "Input skipped");
        failures.push(failure_for(path, &e));
    }
}

/// Read at most `max_bytes_per_file` bytes; anything larger is an error
fn read_capped<R: Read>(reader: R, path: &Path, limits: &LimitsConfig) -> Result<String, IngestError> {
    let cap = limits.max_bytes_per_file;
    let mut bytes = Vec::new();
    reader
        .take(u64::try_from(cap).unwrap_or(u64::MAX).saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;
    if bytes.len() > cap {
        return Err(IngestError::TooLarge { path: path.to_path_buf(), cap });
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_text(path: &Path, limits: &LimitsConfig) -> Result<String, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;
    read_capped(file, path, limits)
}

/// Every log-like entry of a zip archive becomes its own document.
///
/// Unreadable or oversized entries are reported as failures named
/// `archive.zip/entry`; the other entries are still returned.
fn read_archive(path: &Path, limits: &LimitsConfig) -> Result<(Vec<Document>, Vec<FileFailure>), IngestError> {
    let archive_err = |message: String| IngestError::Archive { path: path.to_path_buf(), message };

    let file = File::open(path).map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_err(e.to_string()))?;

    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| archive_err(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let entry_path = PathBuf::from(entry.name());
        if !has_log_extension(&entry_path) {
            continue;
        }
        let display_path = path.join(&entry_path);

        // Declared size first, then a capped read in case the header lies
        let declared_too_large = usize::try_from(entry.size()).map_or(true, |size| size > limits.max_bytes_per_file);
        let text = if declared_too_large {
            Err(IngestError::TooLarge { path: display_path.clone(), cap: limits.max_bytes_per_file })
        } else {
            read_capped(entry, &display_path, limits)
        };

        match text {
            Ok(text) => documents.push(Document::new(label_for(&entry_path), text)),
            Err(e) => {
                warn!(archive = %path.display(), entry = %entry_path.display(), error = %e, "Archive entry skipped");
                failures.push(failure_for(&display_path, &e));
            }
        }
    }

    if documents.is_empty() && failures.is_empty() {
        return Err(archive_err("no log documents inside".to_string()));
    }
    Ok((documents, failures))
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

fn has_log_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| LOG_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Trip label: file stem
fn label_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Suffix repeated labels in load order: `trip`, `trip_2`, `trip_3`
fn dedupe_labels(documents: &mut [Document]) {
    let mut seen: HashSet<String> = HashSet::new();
    for doc in documents.iter_mut() {
        if seen.insert(doc.label.clone()) {
            continue;
        }
        let mut n = 2;
        let mut candidate = format!("{}_{n}", doc.label);
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{n}", doc.label);
        }
        debug!(label = %doc.label, renamed = %candidate, "Duplicate document label");
        seen.insert(candidate.clone());
        doc.label = candidate;
    }
}

fn failure_for(path: &Path, error: &IngestError) -> FileFailure {
    FileFailure {
        label: path.display().to_string(),
        error: error.to_string(),
    }
}
