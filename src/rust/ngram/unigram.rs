use lazy_static::lazy_static;
use regex::Regex;

use super::{dedup_ordered, NGramStrategy, NGramType, PorterStemmer};

lazy_static! {
    // Whitespace, punctuation and the symbols commonly glued to words in records.
    static ref WORD_SEPARATORS: Regex = Regex::new(r"[\s\p{P}$+<>№=]+").unwrap();
    static ref NOISE: Regex = Regex::new(r"[\p{P}\p{S}\p{N}]").unwrap();
}

/// Lowercased words split on whitespace and punctuation. Digits are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unigram;

impl Unigram {
    pub fn new() -> Self {
        Self
    }
}

impl NGramStrategy for Unigram {
    fn ngrams(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        dedup_ordered(WORD_SEPARATORS.split(&lowered).map(str::to_string))
    }

    fn ngram_type(&self) -> NGramType {
        NGramType::Unigram
    }
}

/// Lowercased words with digits, punctuation and symbols removed, reduced to
/// their stems.
#[derive(Debug, Clone, Default)]
pub struct FilteredUnigram {
    stemmer: PorterStemmer,
}

impl FilteredUnigram {
    pub fn new() -> Self {
        Self {
            stemmer: PorterStemmer::new(),
        }
    }

    fn clean(text: &str) -> String {
        NOISE.replace_all(&text.to_lowercase(), " ").into_owned()
    }
}

impl NGramStrategy for FilteredUnigram {
    fn ngrams(&self, text: &str) -> Vec<String> {
        let cleaned = Self::clean(text);
        dedup_ordered(
            cleaned
                .split_whitespace()
                .map(|word| self.stemmer.stem(word)),
        )
    }

    fn ngram_type(&self) -> NGramType {
        NGramType::FilteredUnigram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigram_splits_and_lowercases() {
        let tokens = Unigram::new().ngrams("Hello, World! hello again=2024 $5");
        assert_eq!(tokens, vec!["hello", "world", "again", "2024", "5"]);
    }

    #[test]
    fn test_unigram_empty_input() {
        assert!(Unigram::new().ngrams("").is_empty());
        assert!(Unigram::new().ngrams(" ,.;! ").is_empty());
    }

    #[test]
    fn test_filtered_unigram_strips_digits_and_punctuation() {
        let tokens = FilteredUnigram::new().ngrams("Caresses, ponies & 42 cats! (running) e-mail: x@y.z");
        for token in &tokens {
            assert!(
                token.chars().all(|c| !c.is_ascii_punctuation() && !c.is_numeric()),
                "unexpected character in {:?}",
                token
            );
        }
        assert_eq!(tokens[..4], ["caress", "poni", "cat", "run"]);
    }

    #[test]
    fn test_filtered_unigram_is_deterministic() {
        let strategy = FilteredUnigram::new();
        let text = "The connections were connected, connecting 3 connectors.";
        assert_eq!(strategy.ngrams(text), strategy.ngrams(text));
        assert_eq!(strategy.ngrams(text), vec!["the", "connect", "were", "connector"]);
    }

    #[test]
    fn test_filtered_unigram_keeps_non_latin_words() {
        let tokens = FilteredUnigram::new().ngrams("Звонок №5 принят");
        assert_eq!(tokens, vec!["звонок", "принят"]);
    }
}
