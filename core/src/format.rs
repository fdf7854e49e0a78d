use lazy_static::lazy_static;
use regex::Regex;

use crate::{DocId, Index};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+").expect("valid regex");
}

/// Identifier shown for a document: the first number in its filename, or the
/// doc id when the filename has none.
pub fn display_id(index: &Index, doc_id: DocId) -> u64 {
    index
        .docs
        .get(&doc_id)
        .and_then(|meta| NUMBER.find(&meta.filename))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(u64::from(doc_id))
}

/// Display identifiers for a result, sorted ascending.
pub fn display_ids(index: &Index, doc_ids: &[DocId]) -> Vec<u64> {
    let mut ids: Vec<u64> = doc_ids.iter().map(|&d| display_id(index, d)).collect();
    ids.sort_unstable();
    ids
}

pub fn result_set_line(index: &Index, doc_ids: &[DocId]) -> String {
    let ids: Vec<String> = display_ids(index, doc_ids).iter().map(u64::to_string).collect();
    format!("Result-Set: {}", ids.join(", "))
}

/// Console rendering of a result: the result-set line, or a notice when nothing matched.
pub fn render_results(index: &Index, doc_ids: &[DocId]) -> String {
    if doc_ids.is_empty() {
        return "No matching documents found.".to_string();
    }
    result_set_line(index, doc_ids)
}
