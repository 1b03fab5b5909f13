use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{NGramStrategy, NGramType};
use crate::classifier::ClassifierError;

/// Tokens must appear in more than this many texts to enter the vocabulary.
pub const DEFAULT_MIN_FREQUENCY: usize = 3;

/// One retained token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    value: String,
    ngram_type: NGramType,
}

impl VocabularyWord {
    pub fn new(value: impl Into<String>, ngram_type: NGramType) -> Self {
        Self {
            value: value.into(),
            ngram_type,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn ngram_type(&self) -> NGramType {
        self.ngram_type
    }
}

impl PartialEq for VocabularyWord {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for VocabularyWord {}

/// Ordered vocabulary. A word's position is its feature-vector index and never
/// changes once the vocabulary is built.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: Vec<VocabularyWord>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from words in index order. Later duplicates are dropped.
    pub fn from_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = VocabularyWord>,
    {
        let mut vocabulary = Self::default();
        for word in words {
            if !vocabulary.index.contains_key(word.value()) {
                vocabulary
                    .index
                    .insert(word.value.clone(), vocabulary.words.len());
                vocabulary.words.push(word);
            }
        }
        vocabulary
    }

    /// Feature index of a token, if it is part of the vocabulary.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn words(&self) -> &[VocabularyWord] {
        &self.words
    }

    pub fn get(&self, index: usize) -> Option<&VocabularyWord> {
        self.words.get(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Counts document frequencies of n-grams over a corpus and keeps the frequent ones.
///
/// A token counts once per text. Retained words are ordered by first
/// occurrence: record order, then token order within the record.
#[derive(Debug, Clone)]
pub struct VocabularyBuilder {
    strategy: Arc<dyn NGramStrategy>,
    min_frequency: usize,
}

impl VocabularyBuilder {
    pub fn new(strategy: Arc<dyn NGramStrategy>) -> Self {
        Self {
            strategy,
            min_frequency: DEFAULT_MIN_FREQUENCY,
        }
    }

    /// Overrides the threshold; tokens need a count strictly greater than it.
    pub fn with_min_frequency(mut self, min_frequency: usize) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    pub fn build<I, S>(&self, texts: I) -> Result<Vocabulary, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        let mut num_texts = 0usize;

        for text in texts {
            num_texts += 1;
            for token in self.strategy.ngrams(text.as_ref()) {
                let count = counts.entry(token).or_insert_with_key(|token| {
                    first_seen.push(token.clone());
                    0
                });
                *count += 1;
            }
        }

        if num_texts == 0 {
            return Err(ClassifierError::InvalidInput(
                "Cannot build a vocabulary from an empty corpus".into(),
            ));
        }

        let ngram_type = self.strategy.ngram_type();
        let vocabulary = Vocabulary::from_words(
            first_seen
                .into_iter()
                .filter(|token| counts[token] > self.min_frequency)
                .map(|token| VocabularyWord::new(token, ngram_type)),
        );

        debug!(
            "{} distinct {} tokens over {} texts, {} kept",
            counts.len(),
            ngram_type,
            num_texts,
            vocabulary.len()
        );

        if vocabulary.is_empty() {
            return Err(ClassifierError::InvalidInput(format!(
                "No {} token appears in more than {} texts; the vocabulary would be empty",
                ngram_type, self.min_frequency
            )));
        }

        info!("Built {} vocabulary of {} words", ngram_type, vocabulary.len());
        Ok(vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram::NGramType;

    fn builder() -> VocabularyBuilder {
        VocabularyBuilder::new(NGramType::Unigram.strategy())
    }

    #[test]
    fn test_frequency_threshold_boundary() {
        // "four" appears in 4 texts, "three" in 3, "filler" in every text
        let texts = [
            "four three filler",
            "four three filler",
            "four three filler",
            "four filler",
            "filler",
        ];
        let vocabulary = builder().build(texts).unwrap();
        assert!(vocabulary.contains("four"));
        assert!(vocabulary.contains("filler"));
        assert!(!vocabulary.contains("three"));
        assert_eq!(vocabulary.len(), 2);
    }

    #[test]
    fn test_token_counts_once_per_text() {
        let texts = ["word word word word word", "other", "other", "other", "other"];
        let vocabulary = builder().build(texts).unwrap();
        assert!(!vocabulary.contains("word"));
        assert!(vocabulary.contains("other"));
    }

    #[test]
    fn test_order_is_first_occurrence() {
        let texts = ["b a", "a b c", "c b a", "a c b", "c a b"];
        let vocabulary = builder().build(texts).unwrap();
        let words: Vec<_> = vocabulary.words().iter().map(|w| w.value()).collect();
        assert_eq!(words, vec!["b", "a", "c"]);
        assert_eq!(vocabulary.index_of("c"), Some(2));
        assert_eq!(vocabulary.get(0).unwrap().ngram_type(), NGramType::Unigram);
    }

    #[test]
    fn test_order_is_stable_across_builds() {
        let texts: Vec<String> = (0..20).map(|i| format!("w{} shared common text{}", i % 3, i % 2)).collect();
        let first = builder().build(&texts).unwrap();
        let second = builder().build(&texts).unwrap();
        assert_eq!(first.words(), second.words());
    }

    #[test]
    fn test_empty_corpus_is_rejected() {
        let result = builder().build(Vec::<String>::new());
        assert!(matches!(result, Err(ClassifierError::InvalidInput(_))));
    }

    #[test]
    fn test_all_tokens_filtered_is_rejected() {
        let result = builder().build(["rare words", "only once"]);
        assert!(matches!(result, Err(ClassifierError::InvalidInput(_))));
    }

    #[test]
    fn test_custom_min_frequency() {
        let vocabulary = builder()
            .with_min_frequency(0)
            .build(["rare words"])
            .unwrap();
        assert_eq!(vocabulary.len(), 2);
    }
}
