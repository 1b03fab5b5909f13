use ndarray::{Array1, Array2};

use super::error::ClassifierError;
use super::utils::{argmax, one_hot};
use crate::data::{Characteristic, CharacteristicValue, ClassifiableText};
use crate::ngram::{NGramStrategy, Vocabulary};

/// Conversion between texts, labels and the numeric vectors a model consumes.
///
/// - Text to input: a multi-hot vector over the vocabulary. Tokens that are not
///   in the vocabulary are ignored.
/// - Label to target: a one-hot vector at `order_number - 1`, where the order
///   number is the one this unit's characteristic assigns to the label text.
///   The record's own numbering is not trusted, so a corpus that numbers its
///   values differently still trains the positions `decode_output` reads.
/// - Output to label: the argmax entry, with the first maximum winning ties.
pub(crate) trait FeatureEncoding {
    fn vocabulary(&self) -> &Vocabulary;

    fn strategy(&self) -> &dyn NGramStrategy;

    fn characteristic(&self) -> &Characteristic;

    fn encode_text(&self, text: &str) -> Array1<f64> {
        let vocabulary = self.vocabulary();
        let mut input = Array1::zeros(vocabulary.len());
        for token in self.strategy().ngrams(text) {
            if let Some(index) = vocabulary.index_of(&token) {
                input[index] = 1.0;
            }
        }
        input
    }

    fn encode_label(&self, value: &CharacteristicValue) -> Result<Array1<f64>, ClassifierError> {
        let characteristic = self.characteristic();
        let size = characteristic.len();
        let order_number = characteristic
            .value(value.value())
            .map(CharacteristicValue::order_number)
            .filter(|n| (1..=size).contains(n))
            .ok_or_else(|| ClassifierError::InvalidLabel {
                characteristic: characteristic.name().to_string(),
                value: value.value().to_string(),
                order_number: value.order_number(),
                size,
            })?;
        Ok(one_hot(size, order_number - 1))
    }

    /// Builds the input and target matrices for the records that carry a value
    /// of this unit's characteristic.
    fn encode_training_set(
        &self,
        texts: &[ClassifiableText],
    ) -> Result<(Array2<f64>, Array2<f64>), ClassifierError> {
        let characteristic = self.characteristic();
        let labeled: Vec<(&ClassifiableText, &CharacteristicValue)> = texts
            .iter()
            .filter_map(|text| {
                text.characteristic_value(characteristic.name())
                    .map(|value| (text, value))
            })
            .collect();

        if labeled.is_empty() {
            return Err(ClassifierError::InvalidInput(format!(
                "No record carries a value for characteristic '{}'",
                characteristic.name()
            )));
        }

        let mut inputs = Array2::zeros((labeled.len(), self.vocabulary().len()));
        let mut targets = Array2::zeros((labeled.len(), characteristic.len()));
        for (row, (text, value)) in labeled.into_iter().enumerate() {
            inputs.row_mut(row).assign(&self.encode_text(text.text()));
            targets.row_mut(row).assign(&self.encode_label(value)?);
        }
        Ok((inputs, targets))
    }

    fn decode_output(&self, output: &Array1<f64>) -> Option<CharacteristicValue> {
        let index = argmax(output)?;
        self.characteristic().value_by_order(index + 1).cloned()
    }
}
