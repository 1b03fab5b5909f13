use std::collections::HashMap;

use log::debug;

use super::{characteristic_key, Characteristic, CharacteristicValue, ClassifiableText};
use crate::classifier::ClassifierError;

/// The training corpus: ordered records plus every characteristic and value
/// observed in them. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ClassifiableData {
    texts: Vec<ClassifiableText>,
    characteristics: Vec<Characteristic>,
    index: HashMap<String, usize>,
}

impl ClassifiableData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> &[ClassifiableText] {
        &self.texts
    }

    /// Characteristics in the order they were first registered.
    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    /// Resolves a characteristic by name, with its finalized values.
    pub fn characteristic(&self, name: &str) -> Option<&Characteristic> {
        self.index
            .get(characteristic_key(name))
            .map(|&i| &self.characteristics[i])
    }

    /// Every value of every characteristic.
    pub fn characteristic_values(&self) -> impl Iterator<Item = &CharacteristicValue> {
        self.characteristics
            .iter()
            .flat_map(|c| c.possible_values().iter())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

struct PendingRecord {
    text: String,
    labels: Vec<(usize, String)>,
}

/// Assembles a [`ClassifiableData`] in two phases: records are collected first,
/// and order numbers are assigned only in [`CorpusBuilder::finish`], once every
/// value of every characteristic is known.
///
/// Values are numbered in order of first appearance.
#[derive(Default)]
pub struct CorpusBuilder {
    characteristics: Vec<Characteristic>,
    index: HashMap<String, usize>,
    records: Vec<PendingRecord>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a characteristic even if no record carries it yet, fixing its
    /// position in [`ClassifiableData::characteristics`].
    pub fn declare_characteristic(&mut self, name: &str) -> Result<usize, ClassifierError> {
        if name.trim().is_empty() {
            return Err(ClassifierError::InvalidInput(
                "Characteristic name cannot be empty".into(),
            ));
        }
        let key = characteristic_key(name);
        if let Some(&i) = self.index.get(key) {
            return Ok(i);
        }
        let i = self.characteristics.len();
        self.characteristics.push(Characteristic::new(name));
        self.index.insert(key.to_string(), i);
        Ok(i)
    }

    /// Adds one labeled record. Records with empty text are skipped, as are
    /// labels with an empty value.
    pub fn add_record<I, N, V>(&mut self, text: &str, labels: I) -> Result<&mut Self, ClassifierError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        if text.trim().is_empty() {
            debug!("Skipping record with empty text");
            return Ok(self);
        }

        let mut seen: Vec<usize> = Vec::new();
        let mut resolved: Vec<(usize, String)> = Vec::new();
        for (name, value) in labels {
            let (name, value) = (name.as_ref(), value.as_ref());
            let i = self.declare_characteristic(name)?;
            if seen.contains(&i) {
                return Err(ClassifierError::InvalidInput(format!(
                    "Record carries more than one value for characteristic '{}'",
                    name
                )));
            }
            seen.push(i);
            if !value.is_empty() {
                resolved.push((i, value.to_string()));
            }
        }

        for (i, value) in &resolved {
            self.characteristics[*i].add_possible_value(value);
        }
        self.records.push(PendingRecord {
            text: text.to_string(),
            labels: resolved,
        });
        Ok(self)
    }

    pub fn finish(mut self) -> ClassifiableData {
        for characteristic in &mut self.characteristics {
            characteristic.finalize_order();
        }

        let characteristics = self.characteristics;
        let texts = self
            .records
            .into_iter()
            .map(|record| {
                record
                    .labels
                    .iter()
                    .filter_map(|(i, value)| characteristics[*i].value(value).cloned())
                    .fold(ClassifiableText::new(record.text), ClassifiableText::with_value)
            })
            .collect();

        ClassifiableData {
            texts,
            characteristics,
            index: self.index,
        }
    }
}
