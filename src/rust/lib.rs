//! A multi-characteristic text classifier built on n-gram bag-of-words features.
//!
//! Each characteristic of interest (e.g. "Module" or "Priority" of a support
//! ticket) gets its own classifier unit: an n-gram strategy, a vocabulary of
//! frequent n-grams and a trainable model. The [`Classifier`] fans calls out to
//! all of its units and collects their answers.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use textclassifier::{ClassifierBuilder, CorpusBuilder, MemoryDataSource, NGramType};
//!
//! let mut corpus = CorpusBuilder::new();
//! for _ in 0..5 {
//!     corpus.add_record("the printer is jammed", [("Category", "hardware")])?;
//!     corpus.add_record("reset my password", [("Category", "account")])?;
//! }
//! let data = corpus.finish();
//!
//! let classifier = ClassifierBuilder::new(Box::new(MemoryDataSource::new(data.clone())))
//!     .add_unit("Category", NGramType::Unigram)?
//!     .build()?;
//!
//! let values = classifier.classify("printer jammed again")?;
//! println!("{:?}", values);
//!
//! for report in classifier.check_accuracy(data.texts())? {
//!     println!("{}: {:.1}%", report.characteristic, report.accuracy);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! A built classifier is `Send + Sync`; `classify` and `check_accuracy` take
//! `&self` and can be called from several threads through an `Arc`.

pub mod classifier;
pub mod data;
pub mod model_store;
pub mod ngram;
mod runtime;

pub use classifier::{
    AccuracyReport, BuildStage, Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo,
    ClassifierUnit, ModelFactory, NeuralNetwork, NeuralNetworkFactory, TrainableModel,
    TrainingReport, UnitFailure, UnitInfo, UnitRequest, UnitState,
};
pub use data::{
    Characteristic, CharacteristicValue, ClassifiableData, ClassifiableText, CorpusBuilder,
    CsvDataSource, MemoryDataSource, TrainingDataSource,
};
pub use model_store::{ModelStore, StoreError};
pub use ngram::{NGramStrategy, NGramType, Vocabulary, VocabularyBuilder, VocabularyWord};
pub use runtime::TrainingConfig;

pub fn init_logger() {
    env_logger::init();
}
