use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use super::error::{ClassifierError, UnitFailure};
use super::model::TrainingReport;
use super::unit::ClassifierUnit;
use super::{AccuracyReport, ClassifierInfo, UnitInfo};
use crate::data::{CharacteristicValue, ClassifiableData, ClassifiableText};

/// A multi-characteristic text classifier.
///
/// Owns one [`ClassifierUnit`] per characteristic of interest, in registration
/// order. Every fan-out call visits the units in that order and every result
/// list follows it.
///
/// # Thread Safety
///
/// This type is `Send + Sync`: units own their state exclusively and the
/// model and strategy trait objects are required to be thread-safe.
/// `classify` and `check_accuracy` only need `&self`, so a built classifier
/// can be shared through an `Arc`.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use textclassifier::{ClassifierBuilder, CorpusBuilder, MemoryDataSource, NGramType};
///
/// let mut corpus = CorpusBuilder::new();
/// for _ in 0..5 {
///     corpus.add_record("refund my order please", [("Intent", "refund")])?;
///     corpus.add_record("where is my parcel", [("Intent", "tracking")])?;
/// }
///
/// let classifier = ClassifierBuilder::new(Box::new(MemoryDataSource::new(corpus.finish())))
///     .with_min_word_frequency(1)
///     .add_unit("Intent", NGramType::Unigram)?
///     .build()?;
///
/// for value in classifier.classify("refund please")? {
///     println!("{}: {}", value.characteristic(), value.value());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Classifier {
    units: Vec<ClassifierUnit>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    /// Creates a new ClassifierBuilder reading its corpus from a CSV file
    pub fn builder<P: AsRef<Path>>(csv_path: P) -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::from_csv(csv_path)
    }

    pub(crate) fn from_units(units: Vec<ClassifierUnit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[ClassifierUnit] {
        &self.units
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            num_units: self.units.len(),
            units: self
                .units
                .iter()
                .map(|unit| UnitInfo {
                    characteristic: unit.characteristic().name().to_string(),
                    num_values: unit.characteristic().len(),
                    vocabulary_size: unit.vocabulary().len(),
                    ngram_type: unit.ngram_type(),
                    state: unit.state(),
                })
                .collect(),
        }
    }

    /// Trains every unit on `data`. Units are trained independently: a failing
    /// unit does not stop the others.
    ///
    /// # Errors
    /// `Units` listing every unit whose training failed
    pub fn build(&mut self, data: &ClassifiableData) -> Result<Vec<TrainingReport>, ClassifierError> {
        let mut reports = Vec::with_capacity(self.units.len());
        let mut failures = Vec::new();
        for unit in &mut self.units {
            match unit.build(data.texts()) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Failed to train unit '{}': {}", unit.characteristic().name(), e);
                    failures.push(UnitFailure {
                        characteristic: unit.characteristic().name().to_string(),
                        error: e,
                    });
                }
            }
        }
        if failures.is_empty() {
            Ok(reports)
        } else {
            Err(ClassifierError::Units(failures))
        }
    }

    /// Classifies `text` with every unit. Units without an answer contribute
    /// nothing, so the result may be shorter than the number of units.
    pub fn classify(&self, text: &str) -> Result<Vec<CharacteristicValue>, ClassifierError> {
        let mut values = Vec::new();
        for unit in &self.units {
            if let Some(value) = unit.classify(text)? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Measures how often each unit predicts the value a record already carries.
    ///
    /// Only records that carry a value of a unit's characteristic count toward
    /// that unit's total. Predictions are matched on the value text alone. An
    /// empty total yields an accuracy of `0.0`.
    pub fn check_accuracy(&self, texts: &[ClassifiableText]) -> Result<Vec<AccuracyReport>, ClassifierError> {
        let mut reports = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            let name = unit.characteristic().name();
            let mut correct = 0;
            let mut total = 0;
            for text in texts {
                let Some(expected) = text.characteristic_value(name) else {
                    continue;
                };
                total += 1;
                if let Some(predicted) = unit.classify(text.text())? {
                    if predicted.value() == expected.value() {
                        correct += 1;
                    }
                }
            }

            let report = AccuracyReport::new(name, correct, total);
            if total == 0 {
                warn!("No labeled records for characteristic '{}'", name);
            }
            info!(
                "Accuracy of '{}': {:.2}% ({}/{})",
                name, report.accuracy, correct, total
            );
            reports.push(report);
        }
        Ok(reports)
    }

    /// Saves every unit into `dir`, continuing past failing units.
    ///
    /// # Errors
    /// `Units` listing every unit that could not be saved
    pub fn save_all<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>, ClassifierError> {
        let dir = dir.as_ref();
        let mut paths = Vec::with_capacity(self.units.len());
        let mut failures = Vec::new();
        for unit in &self.units {
            match unit.save_to_dir(dir) {
                Ok(path) => paths.push(path),
                Err(e) => {
                    error!("Failed to save unit '{}': {}", unit.characteristic().name(), e);
                    failures.push(UnitFailure {
                        characteristic: unit.characteristic().name().to_string(),
                        error: e,
                    });
                }
            }
        }
        if failures.is_empty() {
            Ok(paths)
        } else {
            Err(ClassifierError::Units(failures))
        }
    }

    /// Saves every unit into the writer `open` returns for it, continuing past
    /// failing units. Each unit's state can be restored with
    /// [`ClassifierUnit::load_from_reader`].
    ///
    /// # Errors
    /// `Units` listing every unit whose writer could not be opened or written
    pub fn save_with<W, F>(&self, mut open: F) -> Result<(), ClassifierError>
    where
        W: Write,
        F: FnMut(&ClassifierUnit) -> io::Result<W>,
    {
        let mut failures = Vec::new();
        for unit in &self.units {
            let result = open(unit)
                .map_err(|e| ClassifierError::Persistence(format!("Failed to open writer: {}", e)))
                .and_then(|mut writer| unit.save_to_writer(&mut writer));
            if let Err(e) = result {
                error!("Failed to save unit '{}': {}", unit.characteristic().name(), e);
                failures.push(UnitFailure {
                    characteristic: unit.characteristic().name().to_string(),
                    error: e,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ClassifierError::Units(failures))
        }
    }

    /// Shuts every unit down. Every unit is attempted even when an earlier one
    /// fails; the failures are reported together.
    pub fn shutdown(&mut self) -> Result<(), ClassifierError> {
        let mut failures = Vec::new();
        for unit in &mut self.units {
            if let Err(e) = unit.shutdown() {
                error!("Failed to shut down unit '{}': {}", unit.characteristic().name(), e);
                failures.push(UnitFailure {
                    characteristic: unit.characteristic().name().to_string(),
                    error: e,
                });
            }
        }
        if failures.is_empty() {
            info!("Classifier shut down ({} units)", self.units.len());
            Ok(())
        } else {
            Err(ClassifierError::Units(failures))
        }
    }
}
