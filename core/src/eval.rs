use std::collections::BTreeSet;

use crate::query::{Expr, Op};
use crate::tokenizer::Normalizer;
use crate::{DocId, Index, Position};

/// Walks a parsed query against an index. Every node yields a sorted set of doc ids.
/// Recursion only follows parenthesized groups, whose depth the parser bounds.
pub struct Evaluator<'a> {
    index: &'a Index,
    normalizer: &'a Normalizer,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a Index, normalizer: &'a Normalizer) -> Self {
        Self { index, normalizer }
    }

    pub fn evaluate(&self, expr: &Expr) -> BTreeSet<DocId> {
        match expr {
            Expr::Term(raw) => self.term_docs(raw),
            Expr::Chain { first, rest } => {
                rest.iter().fold(self.evaluate(first), |mut acc, (op, operand)| {
                    let docs = self.evaluate(operand);
                    match op {
                        Op::And => acc.retain(|d| docs.contains(d)),
                        Op::Or => acc.extend(docs),
                        Op::Not => acc.retain(|d| !docs.contains(d)),
                    }
                    acc
                })
            }
            Expr::Proximity { left, right, distance } => self.proximity(left, right, *distance),
            Expr::Group(inner) => self.evaluate(inner),
        }
    }

    fn term_docs(&self, raw: &str) -> BTreeSet<DocId> {
        let stem = self.normalizer.term(raw);
        self.index.postings(&stem).iter().copied().collect()
    }

    fn proximity(&self, left: &str, right: &str, distance: u32) -> BTreeSet<DocId> {
        let (left, right) = (self.normalizer.term(left), self.normalizer.term(right));
        let right_docs: BTreeSet<DocId> = self.index.postings(&right).iter().copied().collect();
        self.index
            .postings(&left)
            .iter()
            .copied()
            .filter(|doc_id| right_docs.contains(doc_id))
            .filter(|&doc_id| {
                within(self.index.positions(&left, doc_id), self.index.positions(&right, doc_id), distance)
            })
            .collect()
    }
}

/// True when some pair of positions lies at most `distance` apart. Both lists
/// are in ascending token order.
fn within(a: &[Position], b: &[Position], distance: u32) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].abs_diff(b[j]) <= distance {
            return true;
        }
        if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_checks_every_closest_pair() {
        assert!(within(&[0, 10], &[13], 3));
        assert!(!within(&[0, 10], &[14], 3));
        assert!(within(&[5], &[5], 0));
        assert!(!within(&[], &[1], 5));
        assert!(within(&[1, 20], &[3, 40], 2));
    }
}
