use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::tokenizer::Normalizer;
use crate::{DocId, DocMeta, Index};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDocument {
    pub filename: String,
    pub error: String,
}

/// Outcome of one build pass.
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    pub processed: usize,
    pub failed: Vec<FailedDocument>,
}

pub struct IndexBuilder<'a> {
    normalizer: &'a Normalizer,
    extension: String,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer, extension: impl Into<String>) -> Self {
        Self { normalizer, extension: extension.into() }
    }

    /// Scan the top level of `corpus_dir` and index every file with the configured
    /// extension. Entries are visited in file-name order so doc ids are stable for
    /// an unchanged corpus. Unreadable documents are reported, not fatal.
    pub fn build<P: AsRef<Path>>(&self, corpus_dir: P) -> Result<(Index, BuildReport)> {
        let corpus_dir = corpus_dir.as_ref();
        let mut index = Index::new();
        let mut report = BuildReport::default();
        let mut next_doc_id: DocId = 0;

        let walker = WalkDir::new(corpus_dir).min_depth(1).max_depth(1).sort_by_file_name();
        for entry in walker {
            let entry = entry.with_context(|| format!("reading corpus directory {}", corpus_dir.display()))?;
            let path = entry.path();
            if entry.file_type().is_dir() || !self.is_document(path) {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            let doc_id = next_doc_id;
            next_doc_id += 1;

            let content = match read_document(path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(%filename, error = %e, "failed to read document");
                    report.failed.push(FailedDocument { filename, error: e.to_string() });
                    continue;
                }
            };

            index.docs.insert(doc_id, DocMeta { filename, path: path.to_string_lossy().into_owned() });
            self.index_text(&mut index, doc_id, &content);
            report.processed += 1;
        }

        tracing::info!(
            processed = report.processed,
            failed = report.failed.len(),
            num_terms = index.num_terms(),
            "index build complete"
        );
        Ok((index, report))
    }

    /// Add one document's text to `index` under `doc_id`.
    pub fn index_text(&self, index: &mut Index, doc_id: DocId, text: &str) {
        let mut terms_in_doc: HashSet<String> = HashSet::new();
        for (term, pos) in self.normalizer.normalize(text) {
            index.add_position(&term, doc_id, pos);
            terms_in_doc.insert(term);
        }
        for term in terms_in_doc {
            index.add_posting(&term, doc_id);
        }
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension().and_then(|s| s.to_str()) == Some(self.extension.as_str())
    }
}

/// Read a document as UTF-8, falling back to Latin-1 for invalid byte sequences.
pub fn read_document(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::debug!(path = %path.display(), "document is not valid UTF-8, decoding as Latin-1");
            Ok(e.into_bytes().into_iter().map(char::from).collect())
        }
    }
}
