use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::Position;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\p{L}+").expect("valid regex");
}

/// Reduces a lower-cased token to its canonical stem.
pub trait Stem: Send + Sync {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

impl Stem for Stemmer {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Stemmer::stem(self, token)
    }
}

/// Set of words dropped before stemming.
#[derive(Debug, Default, Clone)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    /// Load a newline-delimited stop-word file. A missing file yields an empty set.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let words = Self::new(text.lines());
                tracing::info!(path = %path.display(), count = words.len(), "loaded stop words");
                Ok(words)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "stop words file not found, continuing without stop words");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::Error::new(e).context(format!("reading stop words from {}", path.display()))),
        }
    }

    pub fn contains(&self, token: &str) -> bool { self.0.contains(token) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Turns raw text into `(stem, position)` pairs: NFKC normalization, lowercase,
/// letter-run tokenization, stop-word removal, and stemming. Positions count
/// retained tokens only.
pub struct Normalizer {
    stop_words: StopWords,
    stemmer: Box<dyn Stem>,
}

impl Normalizer {
    pub fn new(stop_words: StopWords, stemmer: Box<dyn Stem>) -> Self {
        Self { stop_words, stemmer }
    }

    /// English Snowball (Porter2) stemming.
    pub fn english(stop_words: StopWords) -> Self {
        Self::new(stop_words, Box::new(Stemmer::create(Algorithm::English)))
    }

    pub fn stop_words(&self) -> &StopWords { &self.stop_words }

    pub fn normalize(&self, text: &str) -> Terms<'_> {
        Terms {
            normalizer: self,
            text: text.nfkc().collect::<String>().to_lowercase(),
            offset: 0,
            position: 0,
        }
    }

    /// Normalize a single query operand: trimmed, lower-cased and stemmed as a whole,
    /// without splitting or stop-word filtering.
    pub fn term(&self, raw: &str) -> String {
        let lowered = raw.trim().nfkc().collect::<String>().to_lowercase();
        self.stemmer.stem(&lowered).into_owned()
    }
}

/// Lazy `(stem, position)` sequence over one normalized text.
pub struct Terms<'a> {
    normalizer: &'a Normalizer,
    text: String,
    offset: usize,
    position: Position,
}

impl Iterator for Terms<'_> {
    type Item = (String, Position);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(m) = WORD.find_at(&self.text, self.offset) {
            self.offset = m.end();
            let word = m.as_str();
            if self.normalizer.stop_words.contains(word) {
                continue;
            }
            let pos = self.position;
            self.position += 1;
            return Some((self.normalizer.stemmer.stem(word).into_owned(), pos));
        }
        self.offset = self.text.len();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_numbers_do_not_take_positions() {
        let n = Normalizer::english(StopWords::default());
        let t: Vec<_> = n.normalize("Deep learning, 2024: models!").collect();
        assert_eq!(
            t,
            vec![("deep".to_string(), 0), ("learn".to_string(), 1), ("model".to_string(), 2)]
        );
    }

    #[test]
    fn terms_are_produced_on_demand() {
        let n = Normalizer::english(StopWords::new(["of"]));
        let mut terms = n.normalize("survey of time series");
        assert_eq!(terms.next(), Some(("survey".to_string(), 0)));
        assert_eq!(terms.next(), Some(("time".to_string(), 1)));
        assert_eq!(terms.next().map(|(_, pos)| pos), Some(2));
        assert_eq!(terms.next(), None);
        assert_eq!(terms.next(), None);
    }

    #[test]
    fn stop_words_do_not_consume_positions() {
        let n = Normalizer::english(StopWords::new(["a", "of"]));
        let t: Vec<_> = n.normalize("a survey of time").collect();
        assert_eq!(t, vec![("survey".to_string(), 0), ("time".to_string(), 1)]);
    }

    #[test]
    fn digits_split_tokens() {
        let n = Normalizer::english(StopWords::default());
        let words: Vec<String> = n.normalize("abc123def 42").map(|(w, _)| w).collect();
        assert_eq!(words, vec!["abc", "def"]);
    }

    #[test]
    fn query_term_matches_indexed_stem() {
        let n = Normalizer::english(StopWords::default());
        let indexed: Vec<String> = n.normalize("restoration").map(|(w, _)| w).collect();
        assert_eq!(indexed, vec![n.term("  Restoration ")]);
    }
}
