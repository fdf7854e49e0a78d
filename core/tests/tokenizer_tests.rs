use lexis_core::{Normalizer, StopWords};
use std::borrow::Cow;

#[test]
fn it_normalizes_and_stems() {
    let normalizer = Normalizer::english(StopWords::default());
    let words: Vec<String> = normalizer.normalize("Running Runners RUN! The café's menu.").map(|(w, _)| w).collect();
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"menu".to_string()));
    assert!(words.iter().all(|w| w.chars().all(char::is_alphabetic)));
}

#[test]
fn it_filters_stopwords() {
    let normalizer = Normalizer::english(StopWords::new(["the", "and"]));
    let words: Vec<String> = normalizer.normalize("The quick brown fox and the lazy dog").map(|(w, _)| w).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn only_stop_words_yields_nothing() {
    let normalizer = Normalizer::english(StopWords::new(["a", "of"]));
    assert_eq!(normalizer.normalize("a of A, OF 123").count(), 0);
    assert_eq!(normalizer.normalize("").count(), 0);
}

#[test]
fn normalization_is_restartable() {
    let normalizer = Normalizer::english(StopWords::default());
    let first: Vec<_> = normalizer.normalize("image restoration").collect();
    let second: Vec<_> = normalizer.normalize("image restoration").collect();
    assert_eq!(first, second);
}

struct Identity;

impl lexis_core::Stem for Identity {
    fn stem<'a>(&self, token: &'a str) -> Cow<'a, str> { Cow::Borrowed(token) }
}

#[test]
fn stemmer_is_pluggable() {
    let normalizer = Normalizer::new(StopWords::new(["for"]), Box::new(Identity));
    let pairs: Vec<_> = normalizer.normalize("Models for Images").collect();
    assert_eq!(pairs, vec![("models".to_string(), 0), ("images".to_string(), 1)]);
}

#[test]
fn missing_stop_word_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let words = StopWords::from_file(dir.path().join("absent.txt")).unwrap();
    assert!(words.is_empty());
}

#[test]
fn stop_word_file_is_line_delimited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stop_words.txt");
    std::fs::write(&path, "a\n  for \n\nOF\n").unwrap();
    let words = StopWords::from_file(&path).unwrap();
    assert_eq!(words.len(), 3);
    assert!(words.contains("for"));
    assert!(words.contains("of"));
}
