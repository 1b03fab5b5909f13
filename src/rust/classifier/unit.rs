use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use super::encoding::FeatureEncoding;
use super::error::ClassifierError;
use super::model::{ModelFactory, TrainableModel, TrainingReport};
use crate::data::{Characteristic, CharacteristicValue, ClassifiableText};
use crate::model_store::ModelStore;
use crate::ngram::{NGramStrategy, NGramType, Vocabulary};

/// Lifecycle of a [`ClassifierUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Unbuilt,
    Trained,
    ShutDown,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbuilt => "unbuilt",
            Self::Trained => "trained",
            Self::ShutDown => "shut down",
        };
        f.write_str(name)
    }
}

/// Classifies texts along a single characteristic.
///
/// A unit owns its characteristic snapshot, its vocabulary, its n-gram strategy
/// and one trainable model whose input width is the vocabulary size and whose
/// output width is the number of possible values.
#[derive(Debug)]
pub struct ClassifierUnit {
    characteristic: Characteristic,
    vocabulary: Vocabulary,
    strategy: Arc<dyn NGramStrategy>,
    model: Box<dyn TrainableModel>,
    state: UnitState,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ClassifierUnit>();
    }
};

impl FeatureEncoding for ClassifierUnit {
    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn strategy(&self) -> &dyn NGramStrategy {
        self.strategy.as_ref()
    }

    fn characteristic(&self) -> &Characteristic {
        &self.characteristic
    }
}

impl ClassifierUnit {
    /// Creates an untrained unit with a fresh model from `factory`.
    ///
    /// # Errors
    /// - `InvalidConfiguration` if the characteristic has no name or no values,
    ///   if its order numbers are not exactly `1..=N`, or if the vocabulary is empty
    pub fn new(
        characteristic: Characteristic,
        vocabulary: Vocabulary,
        strategy: Arc<dyn NGramStrategy>,
        factory: &dyn ModelFactory,
    ) -> Result<Self, ClassifierError> {
        Self::validate(&characteristic, &vocabulary)?;
        let model = factory.create(vocabulary.len(), characteristic.len())?;
        Self::check_model_shape(model.as_ref(), &characteristic, &vocabulary)
            .map_err(|e| ClassifierError::InvalidConfiguration(e.to_string()))?;
        debug!(
            "Created unit '{}' with {} inputs and {} outputs",
            characteristic.name(),
            vocabulary.len(),
            characteristic.len()
        );
        Ok(Self {
            characteristic,
            vocabulary,
            strategy,
            model,
            state: UnitState::Unbuilt,
        })
    }

    /// Wraps an already trained model, e.g. one restored from disk.
    ///
    /// # Errors
    /// - `InvalidConfiguration` as for [`ClassifierUnit::new`]
    /// - `Persistence` if the model's sizes do not match the vocabulary and characteristic
    pub fn from_trained(
        characteristic: Characteristic,
        vocabulary: Vocabulary,
        strategy: Arc<dyn NGramStrategy>,
        model: Box<dyn TrainableModel>,
    ) -> Result<Self, ClassifierError> {
        Self::validate(&characteristic, &vocabulary)?;
        Self::check_model_shape(model.as_ref(), &characteristic, &vocabulary)?;
        Ok(Self {
            characteristic,
            vocabulary,
            strategy,
            model,
            state: UnitState::Trained,
        })
    }

    /// Restores a unit from state previously written by [`ClassifierUnit::save_to_writer`].
    pub fn load_from_reader<R: Read>(
        characteristic: Characteristic,
        vocabulary: Vocabulary,
        strategy: Arc<dyn NGramStrategy>,
        factory: &dyn ModelFactory,
        reader: &mut R,
    ) -> Result<Self, ClassifierError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ClassifierError::Persistence(format!("Failed to read model state: {}", e)))?;
        let model = factory.deserialize(&bytes)?;
        Self::from_trained(characteristic, vocabulary, strategy, model)
    }

    /// Restores a unit from the state file [`ClassifierUnit::save_to_dir`] writes.
    pub fn load_from_dir<P: AsRef<Path>>(
        characteristic: Characteristic,
        vocabulary: Vocabulary,
        strategy: Arc<dyn NGramStrategy>,
        factory: &dyn ModelFactory,
        dir: P,
    ) -> Result<Self, ClassifierError> {
        let store = ModelStore::new(dir.as_ref())
            .map_err(|e| ClassifierError::Persistence(e.to_string()))?;
        let path = store.unit_path(characteristic.name(), strategy.ngram_type());
        let bytes = store.read_blob(&path)?;
        info!("Loading unit '{}' from {:?}", characteristic.name(), path);
        let model = factory.deserialize(&bytes)?;
        Self::from_trained(characteristic, vocabulary, strategy, model)
    }

    fn validate(characteristic: &Characteristic, vocabulary: &Vocabulary) -> Result<(), ClassifierError> {
        if characteristic.name().is_empty() {
            return Err(ClassifierError::InvalidConfiguration(
                "Characteristic name cannot be empty".into(),
            ));
        }
        if characteristic.is_empty() {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "Characteristic '{}' has no possible values",
                characteristic.name()
            )));
        }
        for order_number in 1..=characteristic.len() {
            if characteristic.value_by_order(order_number).is_none() {
                return Err(ClassifierError::InvalidConfiguration(format!(
                    "Characteristic '{}' is missing order number {}",
                    characteristic.name(),
                    order_number
                )));
            }
        }
        if vocabulary.is_empty() {
            return Err(ClassifierError::InvalidConfiguration(format!(
                "Vocabulary for characteristic '{}' is empty",
                characteristic.name()
            )));
        }
        Ok(())
    }

    fn check_model_shape(
        model: &dyn TrainableModel,
        characteristic: &Characteristic,
        vocabulary: &Vocabulary,
    ) -> Result<(), ClassifierError> {
        if model.input_size() != vocabulary.len() || model.output_size() != characteristic.len() {
            return Err(ClassifierError::Persistence(format!(
                "Model shape {}x{} does not match unit '{}' ({} words, {} values)",
                model.input_size(),
                model.output_size(),
                characteristic.name(),
                vocabulary.len(),
                characteristic.len()
            )));
        }
        Ok(())
    }

    pub fn characteristic(&self) -> &Characteristic {
        &self.characteristic
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn ngram_type(&self) -> NGramType {
        self.strategy.ngram_type()
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Trains the model on every record carrying a value of this unit's
    /// characteristic. May be called again on a trained unit to retrain.
    ///
    /// # Errors
    /// - `InvalidState` if the unit was shut down
    /// - `InvalidInput` if no record carries a value for the characteristic
    /// - `InvalidLabel` if a record's value is not one of the characteristic's values
    /// - any error the model reports while training
    pub fn build(&mut self, texts: &[ClassifiableText]) -> Result<TrainingReport, ClassifierError> {
        if self.state == UnitState::ShutDown {
            return Err(ClassifierError::InvalidState(format!(
                "Unit '{}' has been shut down",
                self.characteristic.name()
            )));
        }

        let (inputs, targets) = self.encode_training_set(texts)?;
        info!(
            "Training unit '{}' ({}) on {} records",
            self.characteristic.name(),
            self.ngram_type(),
            inputs.nrows()
        );
        let report = self.model.train(&inputs, &targets)?;
        self.state = UnitState::Trained;
        Ok(report)
    }

    /// Predicts the characteristic value of `text`. Returns `None` when the
    /// model output cannot be mapped to a value.
    pub fn classify(&self, text: &str) -> Result<Option<CharacteristicValue>, ClassifierError> {
        self.ensure_trained()?;
        let output = self.model.predict(&self.encode_text(text))?;
        if output.len() != self.characteristic.len() {
            return Err(ClassifierError::Model(format!(
                "Model produced {} outputs, expected {}",
                output.len(),
                self.characteristic.len()
            )));
        }
        Ok(self.decode_output(&output))
    }

    pub fn save_to_writer<W: Write>(&self, writer: &mut W) -> Result<(), ClassifierError> {
        self.ensure_trained()?;
        let bytes = self.model.serialize()?;
        writer
            .write_all(&bytes)
            .and_then(|_| writer.flush())
            .map_err(|e| ClassifierError::Persistence(format!("Failed to write model state: {}", e)))
    }

    /// Writes the model state into `dir` and returns the file path.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, ClassifierError> {
        self.ensure_trained()?;
        let store = ModelStore::new(dir.as_ref())
            .map_err(|e| ClassifierError::Persistence(e.to_string()))?;
        let path = store.unit_path(self.characteristic.name(), self.ngram_type());
        let bytes = self.model.serialize()?;
        store.write_blob(&path, &bytes)?;
        info!("Saved unit '{}' to {:?}", self.characteristic.name(), path);
        Ok(path)
    }

    /// Releases the model. Calling it again is a no-op.
    pub fn shutdown(&mut self) -> Result<(), ClassifierError> {
        if self.state == UnitState::ShutDown {
            return Ok(());
        }
        self.model.release()?;
        self.state = UnitState::ShutDown;
        debug!("Unit '{}' shut down", self.characteristic.name());
        Ok(())
    }

    fn ensure_trained(&self) -> Result<(), ClassifierError> {
        match self.state {
            UnitState::Trained => Ok(()),
            state => Err(ClassifierError::InvalidState(format!(
                "Unit '{}' is {}",
                self.characteristic.name(),
                state
            ))),
        }
    }
}
