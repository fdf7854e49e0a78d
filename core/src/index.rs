use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = u32;
pub type Position = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub filename: String,
    /// Path the document was read from at build time.
    pub path: String,
}

/// In-memory inverted and positional indexes over one corpus.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Index {
    pub docs: BTreeMap<DocId, DocMeta>,
    /// term -> distinct doc ids, in build order
    pub postings: HashMap<String, Vec<DocId>>,
    /// term -> doc id -> retained-token positions, in token order
    pub positions: HashMap<String, HashMap<DocId, Vec<Position>>>,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    /// Posting list for a term; unknown terms have an empty list.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> usize { self.postings(term).len() }

    pub fn positions(&self, term: &str, doc_id: DocId) -> &[Position] {
        self.positions
            .get(term)
            .and_then(|by_doc| by_doc.get(&doc_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record one occurrence of `term` at `pos` inside `doc_id`.
    pub fn add_position(&mut self, term: &str, doc_id: DocId, pos: Position) {
        if let Some(by_doc) = self.positions.get_mut(term) {
            by_doc.entry(doc_id).or_default().push(pos);
            return;
        }
        let mut by_doc = HashMap::new();
        by_doc.insert(doc_id, vec![pos]);
        self.positions.insert(term.to_string(), by_doc);
    }

    /// Append `doc_id` to the term's posting list unless it is already the tail.
    pub fn add_posting(&mut self, term: &str, doc_id: DocId) {
        if let Some(list) = self.postings.get_mut(term) {
            if list.last() != Some(&doc_id) {
                list.push(doc_id);
            }
            return;
        }
        self.postings.insert(term.to_string(), vec![doc_id]);
    }
}
