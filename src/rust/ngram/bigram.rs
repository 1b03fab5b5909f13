use super::{dedup_ordered, NGramStrategy, NGramType};

/// Pairs adjacent tokens of an inner strategy: "how are you" -> {"how are", "are you"}.
#[derive(Debug, Clone)]
pub struct Bigram<S> {
    inner: S,
    ngram_type: NGramType,
}

impl<S: NGramStrategy> Bigram<S> {
    pub fn new(inner: S, ngram_type: NGramType) -> Self {
        Self { inner, ngram_type }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: NGramStrategy> NGramStrategy for Bigram<S> {
    fn ngrams(&self, text: &str) -> Vec<String> {
        let tokens = self.inner.ngrams(text);
        dedup_ordered(
            tokens
                .windows(2)
                .map(|pair| format!("{} {}", pair[0], pair[1])),
        )
    }

    fn ngram_type(&self) -> NGramType {
        self.ngram_type
    }
}
