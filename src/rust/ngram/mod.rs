//! N-gram extraction strategies and vocabulary construction.

mod bigram;
mod stemmer;
mod unigram;
mod vocabulary;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use bigram::Bigram;
pub use stemmer::PorterStemmer;
pub use unigram::{FilteredUnigram, Unigram};
pub use vocabulary::{Vocabulary, VocabularyBuilder, VocabularyWord, DEFAULT_MIN_FREQUENCY};

/// Maps text to an ordered set of tokens.
///
/// Implementations must be deterministic: the same text always yields the same
/// tokens in the same order, without duplicates.
pub trait NGramStrategy: Send + Sync + fmt::Debug {
    fn ngrams(&self, text: &str) -> Vec<String>;

    fn ngram_type(&self) -> NGramType;
}

/// The available strategy combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NGramType {
    Unigram,
    FilteredUnigram,
    Bigram,
    FilteredBigram,
}

impl NGramType {
    pub const ALL: [NGramType; 4] = [
        NGramType::Unigram,
        NGramType::FilteredUnigram,
        NGramType::Bigram,
        NGramType::FilteredBigram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unigram => "unigram",
            Self::FilteredUnigram => "filtered_unigram",
            Self::Bigram => "bigram",
            Self::FilteredBigram => "filtered_bigram",
        }
    }

    /// Builds the strategy for this type. Bigram types decorate the matching unigram.
    pub fn strategy(&self) -> Arc<dyn NGramStrategy> {
        match self {
            Self::Unigram => Arc::new(Unigram::new()),
            Self::FilteredUnigram => Arc::new(FilteredUnigram::new()),
            Self::Bigram => Arc::new(Bigram::new(Unigram::new(), NGramType::Bigram)),
            Self::FilteredBigram => Arc::new(Bigram::new(
                FilteredUnigram::new(),
                NGramType::FilteredBigram,
            )),
        }
    }
}

impl fmt::Display for NGramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NGramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NGramType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown n-gram type '{}', expected one of: unigram, filtered_unigram, bigram, filtered_bigram",
                    s
                )
            })
    }
}

/// Keeps the first occurrence of every token, preserving order.
pub(crate) fn dedup_ordered<I>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| !token.is_empty() && seen.insert(token.clone()))
        .collect()
}
