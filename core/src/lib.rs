pub mod build;
pub mod engine;
pub mod eval;
pub mod format;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

pub use build::{BuildReport, FailedDocument, IndexBuilder};
pub use engine::{EngineConfig, SearchEngine};
pub use index::{DocId, DocMeta, Index, Position};
pub use query::{Expr, QueryError};
pub use tokenizer::{Normalizer, Stem, StopWords, Terms};
