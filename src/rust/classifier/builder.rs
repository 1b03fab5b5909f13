use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};

use super::classifier::Classifier;
use super::error::{BuildStage, ClassifierError};
use super::model::ModelFactory;
use super::network::NeuralNetworkFactory;
use super::unit::ClassifierUnit;
use crate::data::{Characteristic, ClassifiableData, CsvDataSource, TrainingDataSource};
use crate::ngram::{NGramStrategy, NGramType, Vocabulary, VocabularyBuilder, DEFAULT_MIN_FREQUENCY};

/// One requested classifier unit: which characteristic, which n-gram type, and
/// optionally a directory holding its pre-trained state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRequest {
    pub characteristic: String,
    pub ngram_type: NGramType,
    pub pretrained: Option<PathBuf>,
}

impl UnitRequest {
    pub fn new(characteristic: impl Into<String>, ngram_type: NGramType) -> Self {
        Self {
            characteristic: characteristic.into(),
            ngram_type,
            pretrained: None,
        }
    }

    pub fn with_pretrained(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pretrained = Some(dir.into());
        self
    }
}

/// Everything a unit needs before a model is attached to it.
#[derive(Debug)]
pub struct ResolvedUnit {
    pub characteristic: Characteristic,
    pub vocabulary: Vocabulary,
    pub strategy: Arc<dyn NGramStrategy>,
}

/// Builds the vocabulary of a request and looks its characteristic up in the
/// corpus. The corpus is only read.
///
/// # Errors
/// - `Stage { Vocabulary }` if no vocabulary survives the frequency filter
/// - `Stage { CharacteristicResolution }` wrapping `CharacteristicNotFound`
///   if the characteristic never occurs in the corpus
pub fn resolve(
    request: &UnitRequest,
    corpus: &ClassifiableData,
    min_frequency: usize,
) -> Result<ResolvedUnit, ClassifierError> {
    let name = request.characteristic.as_str();
    let strategy = request.ngram_type.strategy();

    let vocabulary = VocabularyBuilder::new(Arc::clone(&strategy))
        .with_min_frequency(min_frequency)
        .build(corpus.texts().iter().map(|text| text.text()))
        .map_err(|e| e.at_stage(BuildStage::Vocabulary, name))?;

    let characteristic = corpus
        .characteristic(name)
        .filter(|characteristic| !characteristic.is_empty())
        .cloned()
        .ok_or_else(|| {
            ClassifierError::CharacteristicNotFound(name.to_string())
                .at_stage(BuildStage::CharacteristicResolution, name)
        })?;

    Ok(ResolvedUnit {
        characteristic,
        vocabulary,
        strategy,
    })
}

/// A builder for constructing a [`Classifier`] with a fluent interface.
///
/// Unit requests are collected first; nothing is read until [`ClassifierBuilder::build`].
pub struct ClassifierBuilder {
    source: Box<dyn TrainingDataSource>,
    factory: Arc<dyn ModelFactory>,
    min_word_frequency: usize,
    requests: Vec<UnitRequest>,
}

impl fmt::Debug for ClassifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierBuilder")
            .field("factory", &self.factory)
            .field("min_word_frequency", &self.min_word_frequency)
            .field("requests", &self.requests)
            .finish()
    }
}

impl ClassifierBuilder {
    /// Creates a builder over any training data source, training neural
    /// network units with the default configuration.
    pub fn new(source: Box<dyn TrainingDataSource>) -> Self {
        Self {
            source,
            factory: Arc::new(NeuralNetworkFactory::default()),
            min_word_frequency: DEFAULT_MIN_FREQUENCY,
            requests: Vec::new(),
        }
    }

    /// Creates a builder reading its corpus from a CSV file
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use textclassifier::{ClassifierBuilder, NGramType};
    ///
    /// let classifier = ClassifierBuilder::from_csv("data/tickets.csv")
    ///     .add_unit("Module", NGramType::FilteredUnigram)?
    ///     .add_unit("Handler", NGramType::FilteredBigram)?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Self {
        Self::new(Box::new(CsvDataSource::new(path)))
    }

    /// Replaces the factory creating and restoring the units' models
    pub fn with_model_factory(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Overrides the vocabulary frequency threshold. Tokens are kept when they
    /// occur in more than `min_frequency` texts.
    pub fn with_min_word_frequency(mut self, min_frequency: usize) -> Self {
        self.min_word_frequency = min_frequency;
        self
    }

    /// Requests a unit trained from scratch.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if the name is empty or the same
    ///   (characteristic, n-gram type) pair was already requested
    pub fn add_unit(self, characteristic: &str, ngram_type: NGramType) -> Result<Self, ClassifierError> {
        self.add_request(UnitRequest::new(characteristic, ngram_type))
    }

    /// Requests a unit whose model state is loaded from `dir` instead of trained.
    /// The vocabulary is still rebuilt from the corpus, so the corpus must be
    /// the one the state was trained on.
    pub fn add_pretrained_unit<P: AsRef<Path>>(
        self,
        characteristic: &str,
        ngram_type: NGramType,
        dir: P,
    ) -> Result<Self, ClassifierError> {
        self.add_request(UnitRequest::new(characteristic, ngram_type).with_pretrained(dir.as_ref()))
    }

    pub fn add_request(mut self, request: UnitRequest) -> Result<Self, ClassifierError> {
        if request.characteristic.trim().is_empty() {
            return Err(ClassifierError::InvalidConfiguration(
                "Characteristic name cannot be empty".into(),
            ));
        }
        if self
            .requests
            .iter()
            .any(|r| r.characteristic == request.characteristic && r.ngram_type == request.ngram_type)
        {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "Unit for characteristic '{}' with {} n-grams already requested",
                request.characteristic, request.ngram_type
            )));
        }
        self.requests.push(request);
        Ok(self)
    }

    pub fn requests(&self) -> &[UnitRequest] {
        &self.requests
    }

    /// Reads the corpus once, then resolves, constructs and trains (or loads)
    /// every requested unit in request order.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if no unit was requested; checked before the
    ///   data source is touched
    /// - `Stage { DataRead }` if the source fails, `InvalidConfiguration` if it
    ///   yields no records
    /// - the first failing unit's error, wrapped in a `Stage` naming the step
    ///   and characteristic. Units built before it are shut down first.
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        if self.requests.is_empty() {
            return Err(ClassifierError::InvalidConfiguration(
                "At least one classifier unit must be requested".into(),
            ));
        }

        let corpus = self.source.read_all().map_err(|e| {
            error!("Failed to read training data: {}", e);
            let names: Vec<&str> = self.requests.iter().map(|r| r.characteristic.as_str()).collect();
            e.at_stage(BuildStage::DataRead, &names.join(", "))
        })?;
        if corpus.is_empty() {
            return Err(ClassifierError::InvalidConfiguration(
                "Training data source yielded no records".into(),
            ));
        }
        info!(
            "Read {} records with {} characteristics",
            corpus.len(),
            corpus.characteristics().len()
        );

        let mut units: Vec<ClassifierUnit> = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            match self.build_unit(request, &corpus) {
                Ok(unit) => units.push(unit),
                Err(e) => {
                    error!("{}", e);
                    release_units(&mut units);
                    return Err(e);
                }
            }
        }

        info!("Classifier built with {} units", units.len());
        Ok(Classifier::from_units(units))
    }

    fn build_unit(
        &self,
        request: &UnitRequest,
        corpus: &ClassifiableData,
    ) -> Result<ClassifierUnit, ClassifierError> {
        let name = request.characteristic.as_str();
        let resolved = resolve(request, corpus, self.min_word_frequency)?;
        info!(
            "Unit '{}' ({}): {} vocabulary words, {} values",
            name,
            request.ngram_type,
            resolved.vocabulary.len(),
            resolved.characteristic.len()
        );

        if let Some(dir) = &request.pretrained {
            return ClassifierUnit::load_from_dir(
                resolved.characteristic,
                resolved.vocabulary,
                resolved.strategy,
                self.factory.as_ref(),
                dir,
            )
            .map_err(|e| e.at_stage(BuildStage::ModelLoad, name));
        }

        let mut unit = ClassifierUnit::new(
            resolved.characteristic,
            resolved.vocabulary,
            resolved.strategy,
            self.factory.as_ref(),
        )
        .map_err(|e| e.at_stage(BuildStage::UnitConstruction, name))?;

        unit.build(corpus.texts())
            .map_err(|e| e.at_stage(BuildStage::Training, name))?;
        Ok(unit)
    }
}

/// Shuts down the units a failed build already produced. Failures are logged
/// and do not replace the build error.
fn release_units(units: &mut [ClassifierUnit]) {
    for unit in units.iter_mut() {
        if let Err(e) = unit.shutdown() {
            warn!(
                "Failed to release unit '{}' after aborted build: {}",
                unit.characteristic().name(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CorpusBuilder;

    fn corpus() -> ClassifiableData {
        let mut builder = CorpusBuilder::new();
        for _ in 0..4 {
            builder
                .add_record("printer is out of paper", [("Category", "hardware")])
                .unwrap();
            builder
                .add_record("password reset request", [("Category", "account")])
                .unwrap();
        }
        builder.finish()
    }

    #[test]
    fn test_resolve() {
        let request = UnitRequest::new("Category", NGramType::Unigram);
        let resolved = resolve(&request, &corpus(), DEFAULT_MIN_FREQUENCY).unwrap();
        assert_eq!(resolved.characteristic.len(), 2);
        assert_eq!(resolved.vocabulary.len(), 8);
        assert_eq!(resolved.strategy.ngram_type(), NGramType::Unigram);
    }

    #[test]
    fn test_resolve_unknown_characteristic() {
        let request = UnitRequest::new("Priority", NGramType::Unigram);
        let err = resolve(&request, &corpus(), DEFAULT_MIN_FREQUENCY).unwrap_err();
        assert_eq!(err.stage(), Some(BuildStage::CharacteristicResolution));
        assert!(matches!(err.root_cause(), ClassifierError::CharacteristicNotFound(name) if name == "Priority"));
    }

    #[test]
    fn test_resolve_empty_vocabulary() {
        let request = UnitRequest::new("Category", NGramType::Unigram);
        let err = resolve(&request, &corpus(), 10).unwrap_err();
        assert_eq!(err.stage(), Some(BuildStage::Vocabulary));
        assert!(matches!(err.root_cause(), ClassifierError::InvalidInput(_)));
    }

    #[test]
    fn test_request_validation() {
        let builder = ClassifierBuilder::from_csv("unused.csv");
        assert!(matches!(
            builder.add_unit("", NGramType::Unigram),
            Err(ClassifierError::InvalidConfiguration(_))
        ));

        let builder = ClassifierBuilder::from_csv("unused.csv")
            .add_unit("Category", NGramType::Unigram)
            .unwrap()
            .add_unit("Category", NGramType::Bigram)
            .unwrap();
        assert_eq!(builder.requests().len(), 2);
        assert!(matches!(
            builder.add_unit("Category", NGramType::Unigram),
            Err(ClassifierError::InvalidConfiguration(_))
        ));
    }
}
