mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod encoding;
mod error;
mod model;
mod network;
mod unit;
mod utils;

use serde::Serialize;

pub use builder::{resolve, ClassifierBuilder, ResolvedUnit, UnitRequest};
pub use classifier::Classifier;
pub use error::{BuildStage, ClassifierError, UnitFailure};
pub use model::{ModelFactory, TrainableModel, TrainingReport};
pub use network::{NeuralNetwork, NeuralNetworkFactory};
pub use unit::{ClassifierUnit, UnitState};

use crate::ngram::NGramType;

/// Information about a classifier's units
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    pub num_units: usize,
    /// Per-unit details, in registration order
    pub units: Vec<UnitInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitInfo {
    pub characteristic: String,
    pub num_values: usize,
    pub vocabulary_size: usize,
    pub ngram_type: NGramType,
    #[serde(serialize_with = "serialize_state")]
    pub state: UnitState,
}

fn serialize_state<S: serde::Serializer>(state: &UnitState, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(state)
}

/// Result of [`Classifier::check_accuracy`] for one characteristic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub characteristic: String,
    pub correct: usize,
    pub total: usize,
    /// Percentage in `0.0..=100.0`; `0.0` when `total` is zero
    pub accuracy: f64,
}

impl AccuracyReport {
    pub fn new(characteristic: impl Into<String>, correct: usize, total: usize) -> Self {
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };
        Self {
            characteristic: characteristic.into(),
            correct,
            total,
            accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_report() {
        assert_eq!(AccuracyReport::new("a", 3, 4).accuracy, 75.0);
        assert_eq!(AccuracyReport::new("a", 10, 10).accuracy, 100.0);
        let empty = AccuracyReport::new("a", 0, 0);
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.total, 0);
    }
}
