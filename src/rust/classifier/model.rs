use std::fmt;

use ndarray::{Array1, Array2};

use super::error::ClassifierError;

/// Outcome of one [`TrainableModel::train`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub iterations: usize,
    /// Final value of the model's error metric
    pub error: f64,
    pub converged: bool,
}

/// The capability set a classification backend has to provide.
///
/// Rows of `inputs` and `targets` are paired samples. The output of
/// [`TrainableModel::predict`] has `output_size()` entries.
pub trait TrainableModel: Send + Sync + fmt::Debug {
    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    /// Optimizes the model until its own convergence criterion is met.
    fn train(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
    ) -> Result<TrainingReport, ClassifierError>;

    fn predict(&self, input: &Array1<f64>) -> Result<Array1<f64>, ClassifierError>;

    /// Opaque model state, restorable through [`ModelFactory::deserialize`].
    fn serialize(&self) -> Result<Vec<u8>, ClassifierError>;

    /// Releases held resources. Must be safe to call more than once.
    fn release(&mut self) -> Result<(), ClassifierError> {
        Ok(())
    }
}

/// Creates fresh or restored models for classifier units.
pub trait ModelFactory: Send + Sync + fmt::Debug {
    fn create(
        &self,
        input_size: usize,
        output_size: usize,
    ) -> Result<Box<dyn TrainableModel>, ClassifierError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn TrainableModel>, ClassifierError>;
}
