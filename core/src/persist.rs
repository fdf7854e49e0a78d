use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::{DocId, DocMeta, Index, Position};

#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub total_documents: usize,
    pub total_terms: usize,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostingEntry {
    pub document_frequency: usize,
    pub postings: Vec<DocId>,
}

/// On-disk JSON layout of an index. Doc-id keys are written as JSON strings and
/// parsed back into integers by serde.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: Metadata,
    pub document_mapping: BTreeMap<DocId, DocMeta>,
    pub inverted_index: BTreeMap<String, PostingEntry>,
    pub positional_index: BTreeMap<String, BTreeMap<DocId, Vec<Position>>>,
}

impl Snapshot {
    pub fn from_index(index: &Index) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into());
        Self {
            metadata: Metadata { total_documents: index.num_docs(), total_terms: index.num_terms(), created_at },
            document_mapping: index.docs.clone(),
            inverted_index: index
                .postings
                .iter()
                .map(|(term, postings)| {
                    (term.clone(), PostingEntry { document_frequency: postings.len(), postings: postings.clone() })
                })
                .collect(),
            positional_index: index
                .positions
                .iter()
                .map(|(term, by_doc)| (term.clone(), by_doc.iter().map(|(d, p)| (*d, p.clone())).collect()))
                .collect(),
        }
    }

    /// Check structural consistency before trusting a loaded snapshot.
    pub fn validate(&self) -> Result<()> {
        for (term, entry) in &self.inverted_index {
            ensure!(
                entry.document_frequency == entry.postings.len(),
                "term {term:?}: document frequency {} does not match {} postings",
                entry.document_frequency,
                entry.postings.len()
            );
            let mut seen = HashSet::new();
            for doc_id in &entry.postings {
                ensure!(seen.insert(*doc_id), "term {term:?}: duplicate posting for doc {doc_id}");
                ensure!(self.document_mapping.contains_key(doc_id), "term {term:?}: unknown doc {doc_id}");
            }
        }
        for (term, by_doc) in &self.positional_index {
            let Some(entry) = self.inverted_index.get(term) else {
                bail!("positional term {term:?} missing from inverted index");
            };
            for (doc_id, positions) in by_doc {
                ensure!(entry.postings.contains(doc_id), "term {term:?}: positions for unposted doc {doc_id}");
                ensure!(
                    positions.windows(2).all(|w| w[0] <= w[1]),
                    "term {term:?}: positions for doc {doc_id} are out of order"
                );
            }
        }
        Ok(())
    }

    pub fn into_index(self) -> Index {
        Index {
            docs: self.document_mapping,
            postings: self.inverted_index.into_iter().map(|(term, entry)| (term, entry.postings)).collect(),
            positions: self
                .positional_index
                .into_iter()
                .map(|(term, by_doc)| (term, by_doc.into_iter().collect::<HashMap<_, _>>()))
                .collect(),
        }
    }
}

/// Write the index snapshot to `path`. The file is written beside the target and
/// renamed into place, so a failed write never replaces a good snapshot.
pub fn save_snapshot(path: &Path, index: &Index) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let snapshot = Snapshot::from_index(index);
    let tmp_path = path.with_extension("json.tmp");
    {
        let f = File::create(&tmp_path).with_context(|| format!("creating {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path).with_context(|| format!("replacing {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        total_documents = snapshot.metadata.total_documents,
        total_terms = snapshot.metadata.total_terms,
        "snapshot saved"
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Index> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let snapshot: Snapshot =
        serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing {}", path.display()))?;
    snapshot.validate().with_context(|| format!("validating {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        total_documents = snapshot.document_mapping.len(),
        created_at = %snapshot.metadata.created_at,
        "snapshot loaded"
    );
    Ok(snapshot.into_index())
}
