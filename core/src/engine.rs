use anyhow::Result;
use std::path::PathBuf;

use crate::build::{BuildReport, IndexBuilder};
use crate::eval::Evaluator;
use crate::persist::{load_snapshot, save_snapshot};
use crate::query::{parse_query, QueryError};
use crate::tokenizer::{Normalizer, StopWords};
use crate::{format, DocId, DocMeta, Index};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub corpus_dir: PathBuf,
    pub stop_words_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Extension (without the dot) of files treated as documents.
    pub extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("Abstracts"),
            stop_words_path: PathBuf::from("stop_words.txt"),
            snapshot_path: PathBuf::from("indexes.json"),
            extension: "txt".into(),
        }
    }
}

/// Owns the indexes for one corpus and answers queries against them.
pub struct SearchEngine {
    config: EngineConfig,
    normalizer: Normalizer,
    index: Index,
}

impl SearchEngine {
    /// Load the snapshot if one is present and valid, otherwise build from the
    /// corpus and write a fresh snapshot.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let stop_words = StopWords::from_file(&config.stop_words_path)?;
        Self::with_normalizer(config, Normalizer::english(stop_words))
    }

    /// Build from the corpus regardless of any existing snapshot.
    pub fn rebuilt(config: EngineConfig) -> Result<(Self, BuildReport)> {
        let stop_words = StopWords::from_file(&config.stop_words_path)?;
        let mut engine = Self { config, normalizer: Normalizer::english(stop_words), index: Index::new() };
        let report = engine.rebuild()?;
        Ok((engine, report))
    }

    pub fn with_normalizer(config: EngineConfig, normalizer: Normalizer) -> Result<Self> {
        let mut engine = Self { config, normalizer, index: Index::new() };
        if engine.config.snapshot_path.exists() {
            match load_snapshot(&engine.config.snapshot_path) {
                Ok(index) => {
                    engine.index = index;
                    return Ok(engine);
                }
                Err(e) => tracing::warn!(error = %format!("{e:#}"), "could not load snapshot, rebuilding"),
            }
        }
        engine.rebuild()?;
        Ok(engine)
    }

    /// Re-scan the corpus, replace the in-memory index and rewrite the snapshot.
    pub fn rebuild(&mut self) -> Result<BuildReport> {
        let (index, report) = self.build_index()?;
        self.replace_index(index);
        Ok(report)
    }

    /// Scan the corpus and write a fresh snapshot without touching the index
    /// being served.
    pub fn build_index(&self) -> Result<(Index, BuildReport)> {
        let builder = IndexBuilder::new(&self.normalizer, self.config.extension.clone());
        let (index, report) = builder.build(&self.config.corpus_dir)?;
        for failed in &report.failed {
            tracing::warn!(filename = %failed.filename, error = %failed.error, "document skipped");
        }
        save_snapshot(&self.config.snapshot_path, &index)?;
        Ok((index, report))
    }

    pub fn replace_index(&mut self, index: Index) { self.index = index; }

    pub fn index(&self) -> &Index { &self.index }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn document(&self, doc_id: DocId) -> Option<&DocMeta> { self.index.docs.get(&doc_id) }

    /// Evaluate a query; the result is sorted ascending by doc id.
    pub fn process_query(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        let expr = parse_query(query)?;
        tracing::debug!(?expr, "evaluating query");
        let docs = Evaluator::new(&self.index, &self.normalizer).evaluate(&expr);
        Ok(docs.into_iter().collect())
    }

    /// Like [`process_query`](Self::process_query), but malformed queries are
    /// logged and produce an empty result.
    pub fn search(&self, query: &str) -> Vec<DocId> {
        self.process_query(query).unwrap_or_else(|e| {
            tracing::warn!(query, error = %e, "malformed query");
            Vec::new()
        })
    }

    pub fn display_ids(&self, doc_ids: &[DocId]) -> Vec<u64> { format::display_ids(&self.index, doc_ids) }

    pub fn result_set_line(&self, doc_ids: &[DocId]) -> String { format::result_set_line(&self.index, doc_ids) }

    pub fn render_results(&self, doc_ids: &[DocId]) -> String { format::render_results(&self.index, doc_ids) }
}
