use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Training parameters of the neural network backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Training stops once the mean squared error is at or below this value
    pub max_error: f64,
    /// Upper bound on training iterations; reaching it is reported, not fatal
    pub max_iterations: usize,
    /// Hidden layer sizes; `None` derives them from the input size
    pub hidden_layers: Option<Vec<usize>>,
    /// Seed for weight initialization
    pub seed: u64,
    /// Initial per-weight step of resilient propagation
    pub initial_update: f64,
    pub max_step: f64,
    pub min_step: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_error: 0.01,
            max_iterations: 1000,
            hidden_layers: None,
            seed: 42,
            initial_update: 0.1,
            max_step: 50.0,
            min_step: 1e-6,
        }
    }
}

impl TrainingConfig {
    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = max_error;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_hidden_layers(mut self, hidden_layers: Vec<usize>) -> Self {
        self.hidden_layers = Some(hidden_layers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that training can make progress with these parameters.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "max_error must be a finite non-negative number, got {}",
                self.max_error
            )));
        }
        if !(self.min_step > 0.0 && self.min_step.is_finite()) || !self.max_step.is_finite() {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "Step bounds must be finite and positive, got {}..{}",
                self.min_step, self.max_step
            )));
        }
        if self.min_step > self.max_step {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "min_step {} exceeds max_step {}",
                self.min_step, self.max_step
            )));
        }
        if !(self.min_step..=self.max_step).contains(&self.initial_update) {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "initial_update {} is outside {}..={}",
                self.initial_update, self.min_step, self.max_step
            )));
        }
        Ok(())
    }

    /// Layer sizes from input to output. Derived hidden layers are `input / 6`
    /// and `input / 6 / 4`, each at least one neuron wide.
    pub fn layer_sizes(&self, input_size: usize, output_size: usize) -> Vec<usize> {
        let hidden = match &self.hidden_layers {
            Some(layers) => layers.iter().map(|&n| n.max(1)).collect(),
            None => {
                let first = (input_size / 6).max(1);
                let second = (input_size / 6 / 4).max(1);
                vec![first, second]
            }
        };

        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(input_size);
        sizes.extend(hidden);
        sizes.push(output_size);
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layer_sizes() {
        let config = TrainingConfig::default();
        assert_eq!(config.layer_sizes(120, 3), vec![120, 20, 5, 3]);
        assert_eq!(config.layer_sizes(4, 2), vec![4, 1, 1, 2]);
    }

    #[test]
    fn test_validate() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(TrainingConfig::default().with_max_error(0.0).validate().is_ok());

        for max_error in [f64::NAN, f64::INFINITY, -0.5] {
            let config = TrainingConfig::default().with_max_error(max_error);
            assert!(matches!(
                config.validate(),
                Err(ClassifierError::InvalidConfiguration(_))
            ));
        }

        let inverted = TrainingConfig {
            min_step: 10.0,
            max_step: 1.0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ClassifierError::InvalidConfiguration(_))
        ));

        let zero_update = TrainingConfig {
            initial_update: 0.0,
            ..TrainingConfig::default()
        };
        assert!(zero_update.validate().is_err());
    }

    #[test]
    fn test_explicit_hidden_layers() {
        let config = TrainingConfig::default().with_hidden_layers(vec![8, 0]);
        assert_eq!(config.layer_sizes(10, 2), vec![10, 8, 1, 2]);
    }
}
