//! Fully connected sigmoid network trained with resilient propagation.
//!
//! Training is full-batch iRprop-: every weight keeps its own step size, which
//! grows while the gradient sign is stable and shrinks when it flips. Only the
//! sign of the gradient is used, so the error scale does not matter.

use log::{debug, info, warn};
use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::model::{ModelFactory, TrainableModel, TrainingReport};
use crate::runtime::TrainingConfig;

const STEP_INCREASE: f64 = 1.2;
const STEP_DECREASE: f64 = 0.5;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Layer {
    /// Shape `(outputs, inputs)`
    weights: Array2<f64>,
    biases: Array1<f64>,
}

struct Gradients {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
}

struct RpropState {
    weight_steps: Vec<Array2<f64>>,
    weight_previous: Vec<Array2<f64>>,
    bias_steps: Vec<Array1<f64>>,
    bias_previous: Vec<Array1<f64>>,
}

impl RpropState {
    fn new(layers: &[Layer], initial_update: f64) -> Self {
        Self {
            weight_steps: layers
                .iter()
                .map(|l| Array2::from_elem(l.weights.raw_dim(), initial_update))
                .collect(),
            weight_previous: layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect(),
            bias_steps: layers
                .iter()
                .map(|l| Array1::from_elem(l.biases.len(), initial_update))
                .collect(),
            bias_previous: layers.iter().map(|l| Array1::zeros(l.biases.len())).collect(),
        }
    }
}

fn rprop_update<D: Dimension>(
    params: &mut Array<f64, D>,
    gradients: &Array<f64, D>,
    previous: &mut Array<f64, D>,
    steps: &mut Array<f64, D>,
    config: &TrainingConfig,
) {
    Zip::from(params)
        .and(gradients)
        .and(previous)
        .and(steps)
        .for_each(|w, &g, prev, step| {
            let change = g * *prev;
            if change > 0.0 {
                *step = (*step * STEP_INCREASE).min(config.max_step);
                *w -= g.signum() * *step;
                *prev = g;
            } else if change < 0.0 {
                *step = (*step * STEP_DECREASE).max(config.min_step);
                *prev = 0.0;
            } else {
                if g != 0.0 {
                    *w -= g.signum() * *step;
                }
                *prev = g;
            }
        });
}

/// The default trainable model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetwork {
    layers: Vec<Layer>,
    config: TrainingConfig,
}

impl NeuralNetwork {
    /// Creates a randomly initialized network. `sizes` lists the layer widths
    /// from input to output.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if `config` fails [`TrainingConfig::validate`]
    /// - `Model` if a layer is empty or fewer than two layers are given
    pub fn new(sizes: &[usize], config: TrainingConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        if sizes.len() < 2 {
            return Err(ClassifierError::Model(
                "A network needs at least an input and an output layer".into(),
            ));
        }
        if let Some(pos) = sizes.iter().position(|&n| n == 0) {
            return Err(ClassifierError::Model(format!("Layer {} has no neurons", pos)));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let layers = sizes
            .windows(2)
            .map(|pair| {
                let (inputs, outputs) = (pair[0], pair[1]);
                let range = 1.0 / (inputs as f64).sqrt();
                Layer {
                    weights: Array2::from_shape_fn((outputs, inputs), |_| {
                        rng.random_range(-range..range)
                    }),
                    biases: Array1::from_shape_fn(outputs, |_| rng.random_range(-range..range)),
                }
            })
            .collect();

        Ok(Self { layers, config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Layer widths from input to output.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|l| l.weights.nrows()));
        sizes
    }

    fn check_structure(&self) -> Result<(), ClassifierError> {
        if self.layers.is_empty() {
            return Err(ClassifierError::Persistence("Network has no layers".into()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.biases.len() != layer.weights.nrows() {
                return Err(ClassifierError::Persistence(format!(
                    "Layer {} has {} biases for {} neurons",
                    i,
                    layer.biases.len(),
                    layer.weights.nrows()
                )));
            }
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].weights.nrows() != pair[1].weights.ncols() {
                return Err(ClassifierError::Persistence(format!(
                    "Layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].weights.nrows(),
                    i + 1,
                    pair[1].weights.ncols()
                )));
            }
        }
        Ok(())
    }

    /// Activations of every layer for a batch, input included.
    fn forward(&self, inputs: &Array2<f64>) -> Vec<Array2<f64>> {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut current = inputs.clone();
        for layer in &self.layers {
            let next = (current.dot(&layer.weights.t()) + &layer.biases).mapv(sigmoid);
            activations.push(current);
            current = next;
        }
        activations.push(current);
        activations
    }

    /// Gradients of the squared error, and the mean squared error before the update.
    fn gradients(&self, inputs: &Array2<f64>, targets: &Array2<f64>) -> (Gradients, f64) {
        let activations = self.forward(inputs);
        let output = &activations[self.layers.len()];
        let diff = output - targets;
        let error = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        let mut delta = &diff * &output.mapv(|o| o * (1.0 - o));
        let mut weights = Vec::with_capacity(self.layers.len());
        let mut biases = Vec::with_capacity(self.layers.len());
        for l in (0..self.layers.len()).rev() {
            let previous = &activations[l];
            weights.push(delta.t().dot(previous));
            biases.push(delta.sum_axis(Axis(0)));
            if l > 0 {
                delta = delta.dot(&self.layers[l].weights) * &previous.mapv(|a| a * (1.0 - a));
            }
        }
        weights.reverse();
        biases.reverse();

        (Gradients { weights, biases }, error)
    }

    fn apply(&mut self, gradients: &Gradients, state: &mut RpropState) {
        for (l, layer) in self.layers.iter_mut().enumerate() {
            rprop_update(
                &mut layer.weights,
                &gradients.weights[l],
                &mut state.weight_previous[l],
                &mut state.weight_steps[l],
                &self.config,
            );
            rprop_update(
                &mut layer.biases,
                &gradients.biases[l],
                &mut state.bias_previous[l],
                &mut state.bias_steps[l],
                &self.config,
            );
        }
    }
}

impl TrainableModel for NeuralNetwork {
    fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weights.ncols())
    }

    fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.weights.nrows())
    }

    fn train(
        &mut self,
        inputs: &Array2<f64>,
        targets: &Array2<f64>,
    ) -> Result<TrainingReport, ClassifierError> {
        if inputs.nrows() == 0 || inputs.nrows() != targets.nrows() {
            return Err(ClassifierError::Model(format!(
                "Expected the same non-zero number of inputs and targets, got {} and {}",
                inputs.nrows(),
                targets.nrows()
            )));
        }
        if inputs.ncols() != self.input_size() || targets.ncols() != self.output_size() {
            return Err(ClassifierError::Model(format!(
                "Network maps {} inputs to {} outputs, training data has {} and {}",
                self.input_size(),
                self.output_size(),
                inputs.ncols(),
                targets.ncols()
            )));
        }

        let mut state = RpropState::new(&self.layers, self.config.initial_update);
        let mut iterations = 0;
        let (mut gradients, mut error) = self.gradients(inputs, targets);
        while error > self.config.max_error && iterations < self.config.max_iterations {
            self.apply(&gradients, &mut state);
            iterations += 1;
            (gradients, error) = self.gradients(inputs, targets);
            debug!("Iteration {}: error {:.2}%", iterations, error * 100.0);
        }

        let converged = error <= self.config.max_error;
        if converged {
            info!(
                "Network trained in {} iterations, error {:.2}%",
                iterations,
                error * 100.0
            );
        } else {
            warn!(
                "Network did not reach error {:.2}% within {} iterations (error {:.2}%)",
                self.config.max_error * 100.0,
                self.config.max_iterations,
                error * 100.0
            );
        }

        Ok(TrainingReport {
            iterations,
            error,
            converged,
        })
    }

    fn predict(&self, input: &Array1<f64>) -> Result<Array1<f64>, ClassifierError> {
        if input.len() != self.input_size() {
            return Err(ClassifierError::Model(format!(
                "Expected an input vector of length {}, got {}",
                self.input_size(),
                input.len()
            )));
        }
        let output = self.layers.iter().fold(input.clone(), |a, layer| {
            (layer.weights.dot(&a) + &layer.biases).mapv(sigmoid)
        });
        Ok(output)
    }

    fn serialize(&self) -> Result<Vec<u8>, ClassifierError> {
        serde_json::to_vec(self).map_err(|e| ClassifierError::Persistence(e.to_string()))
    }
}

/// Creates [`NeuralNetwork`] models sized from a [`TrainingConfig`].
#[derive(Debug, Clone, Default)]
pub struct NeuralNetworkFactory {
    config: TrainingConfig,
}

impl NeuralNetworkFactory {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

impl ModelFactory for NeuralNetworkFactory {
    fn create(
        &self,
        input_size: usize,
        output_size: usize,
    ) -> Result<Box<dyn TrainableModel>, ClassifierError> {
        let sizes = self.config.layer_sizes(input_size, output_size);
        debug!("Creating network with layers {:?}", sizes);
        Ok(Box::new(NeuralNetwork::new(&sizes, self.config.clone())?))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn TrainableModel>, ClassifierError> {
        let network: NeuralNetwork = serde_json::from_slice(bytes)
            .map_err(|e| ClassifierError::Persistence(format!("Invalid network state: {}", e)))?;
        network.check_structure()?;
        Ok(Box::new(network))
    }
}
