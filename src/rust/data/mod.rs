//! Records, labels and the training corpus.
//!
//! Identity is explicit: a [`Characteristic`] is keyed by its name and a
//! [`CharacteristicValue`] by its value text (see [`characteristic_key`] and
//! [`value_key`]). A value keeps the name of its owning characteristic, so two
//! characteristics may share a label string without colliding inside a
//! [`ClassifiableText`].

mod corpus;
mod source;

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub use corpus::{ClassifiableData, CorpusBuilder};
pub use source::{CsvDataSource, MemoryDataSource, TrainingDataSource};

/// Key under which a characteristic is indexed. Names are case-sensitive.
pub fn characteristic_key(name: &str) -> &str {
    name
}

/// Key under which a characteristic value is indexed within its characteristic.
pub fn value_key(value: &str) -> &str {
    value
}

/// One concrete label of a [`Characteristic`].
///
/// `order_number` is 1-based and is the index basis of target vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacteristicValue {
    value: String,
    order_number: usize,
    characteristic: String,
}

impl CharacteristicValue {
    pub fn new(
        characteristic: impl Into<String>,
        value: impl Into<String>,
        order_number: usize,
    ) -> Self {
        Self {
            value: value.into(),
            order_number,
            characteristic: characteristic.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn order_number(&self) -> usize {
        self.order_number
    }

    /// Name of the owning characteristic.
    pub fn characteristic(&self) -> &str {
        &self.characteristic
    }

    pub fn key(&self) -> &str {
        value_key(&self.value)
    }
}

// Equality deliberately ignores the owning characteristic and the order number.
impl PartialEq for CharacteristicValue {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CharacteristicValue {}

impl Hash for CharacteristicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// A named categorical label dimension, e.g. "Result".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Characteristic {
    name: String,
    possible_values: Vec<CharacteristicValue>,
}

impl Characteristic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            possible_values: Vec::new(),
        }
    }

    /// Creates a characteristic whose values are numbered 1..N in the given order.
    pub fn with_values<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let possible_values = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| CharacteristicValue::new(name.clone(), value, i + 1))
            .collect();
        Self {
            name,
            possible_values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        characteristic_key(&self.name)
    }

    pub fn possible_values(&self) -> &[CharacteristicValue] {
        &self.possible_values
    }

    pub fn len(&self) -> usize {
        self.possible_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.possible_values.is_empty()
    }

    /// Looks a value up by its label text.
    pub fn value(&self, value: &str) -> Option<&CharacteristicValue> {
        self.possible_values
            .iter()
            .find(|v| v.key() == value_key(value))
    }

    /// Looks a value up by its 1-based order number.
    pub fn value_by_order(&self, order_number: usize) -> Option<&CharacteristicValue> {
        self.possible_values
            .iter()
            .find(|v| v.order_number == order_number)
    }

    /// Appends a value if no value with the same key exists yet. Order numbers
    /// are left at 0 until [`Characteristic::finalize_order`] runs.
    pub(crate) fn add_possible_value(&mut self, value: &str) {
        if self.value(value).is_none() {
            self.possible_values
                .push(CharacteristicValue::new(self.name.clone(), value, 0));
        }
    }

    /// Numbers the values 1..N in their current order.
    pub(crate) fn finalize_order(&mut self) {
        for (i, value) in self.possible_values.iter_mut().enumerate() {
            value.order_number = i + 1;
        }
    }
}

impl PartialEq for Characteristic {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Characteristic {}

impl Hash for Characteristic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// One training or inference record.
///
/// Holds at most one value per characteristic: values are indexed by
/// [`characteristic_key`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassifiableText {
    text: String,
    characteristics: BTreeMap<String, CharacteristicValue>,
}

impl ClassifiableText {
    /// A record without known labels, used for classification.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            characteristics: BTreeMap::new(),
        }
    }

    /// Attaches a value, replacing any earlier value of the same characteristic.
    pub fn with_value(mut self, value: CharacteristicValue) -> Self {
        self.characteristics
            .insert(characteristic_key(value.characteristic()).to_string(), value);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The value this record carries for the named characteristic.
    pub fn characteristic_value(&self, name: &str) -> Option<&CharacteristicValue> {
        self.characteristics.get(characteristic_key(name))
    }

    pub fn characteristic_values(&self) -> impl Iterator<Item = &CharacteristicValue> {
        self.characteristics.values()
    }
}

impl From<&str> for ClassifiableText {
    fn from(text: &str) -> Self {
        ClassifiableText::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_value_equality_is_by_value_only() {
        let a = CharacteristicValue::new("Result", "yes", 1);
        let b = CharacteristicValue::new("Approved", "yes", 2);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_shared_value_string_does_not_collide_in_text() {
        let text = ClassifiableText::new("some text")
            .with_value(CharacteristicValue::new("Result", "yes", 1))
            .with_value(CharacteristicValue::new("Approved", "yes", 2));

        assert_eq!(text.characteristic_values().count(), 2);
        assert_eq!(text.characteristic_value("Result").unwrap().order_number(), 1);
        assert_eq!(text.characteristic_value("Approved").unwrap().order_number(), 2);
    }

    #[test]
    fn test_one_value_per_characteristic() {
        let text = ClassifiableText::new("t")
            .with_value(CharacteristicValue::new("Result", "yes", 1))
            .with_value(CharacteristicValue::new("Result", "no", 2));
        assert_eq!(text.characteristic_values().count(), 1);
        assert_eq!(text.characteristic_value("Result").unwrap().value(), "no");
    }

    #[test]
    fn test_characteristic_equality_by_name() {
        let a = Characteristic::with_values("Result", ["yes"]);
        let b = Characteristic::new("Result");
        assert_eq!(a, b);
        assert_ne!(a, Characteristic::new("result"));
    }

    #[test]
    fn test_finalize_order_is_contiguous() {
        let mut c = Characteristic::new("Result");
        c.add_possible_value("b");
        c.add_possible_value("a");
        c.add_possible_value("b");
        c.finalize_order();

        let orders: Vec<_> = c.possible_values().iter().map(|v| v.order_number()).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(c.value_by_order(1).unwrap().value(), "b");
        assert_eq!(c.value("a").unwrap().order_number(), 2);
        assert!(c.value_by_order(3).is_none());
    }
}
