use std::fmt;

use crate::model_store::StoreError;

/// Stage of [`ClassifierBuilder::build`](super::ClassifierBuilder::build) in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    DataRead,
    Vocabulary,
    CharacteristicResolution,
    UnitConstruction,
    ModelLoad,
    Training,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataRead => "data read",
            Self::Vocabulary => "vocabulary build",
            Self::CharacteristicResolution => "characteristic resolution",
            Self::UnitConstruction => "unit construction",
            Self::ModelLoad => "model load",
            Self::Training => "training",
        };
        f.write_str(name)
    }
}

/// A failure of one classifier unit during a best-effort fan-out.
#[derive(Debug)]
pub struct UnitFailure {
    pub characteristic: String,
    pub error: ClassifierError,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.characteristic, self.error)
    }
}

fn join_failures(failures: &[UnitFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Represents the different types of errors that can occur in the text classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Missing or malformed builder/unit configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Input data that cannot produce a usable result (e.g. empty corpus)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A requested characteristic was never observed in the data
    #[error("Characteristic not found: {0}")]
    CharacteristicNotFound(String),
    /// A training label the unit cannot map onto one of its `size` targets
    #[error("Invalid label '{value}' for '{characteristic}' (order number {order_number}, {size} known values)")]
    InvalidLabel {
        characteristic: String,
        value: String,
        order_number: usize,
        size: usize,
    },
    /// The training data could not be read
    #[error("Data source error: {0}")]
    DataSource(String),
    /// Model state could not be written or restored
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// An operation was called in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Error reported by a trainable model
    #[error("Model error: {0}")]
    Model(String),
    #[error("{stage} failed for characteristic '{characteristic}': {source}")]
    Stage {
        stage: BuildStage,
        characteristic: String,
        #[source]
        source: Box<ClassifierError>,
    },
    #[error("{} classifier unit(s) failed: {}", .0.len(), join_failures(.0))]
    Units(Vec<UnitFailure>),
}

impl ClassifierError {
    pub(crate) fn at_stage(self, stage: BuildStage, characteristic: &str) -> Self {
        Self::Stage {
            stage,
            characteristic: characteristic.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any [`ClassifierError::Stage`] wrappers.
    pub fn root_cause(&self) -> &ClassifierError {
        match self {
            Self::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the build stage this error was raised in, if it was wrapped with one.
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<StoreError> for ClassifierError {
    fn from(err: StoreError) -> Self {
        ClassifierError::Persistence(err.to_string())
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::DataSource(err.to_string())
    }
}
