//! Training data sources.
//!
//! The CSV layout mirrors a spreadsheet with one record per row:
//! ```csv
//! text,Result,Duration
//! Customer asked for a refund,refund,short
//! Device stopped working after update,repair,long
//! ```

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::info;

use super::{ClassifiableData, CorpusBuilder};
use crate::classifier::ClassifierError;

/// Produces the whole training corpus in one call.
pub trait TrainingDataSource: Send + Sync {
    /// Reads every record. Fails with [`ClassifierError::DataSource`] when the
    /// underlying source is missing or malformed.
    fn read_all(&self) -> Result<ClassifiableData, ClassifierError>;
}

/// Reads labeled records from a delimited text file.
///
/// The first row is the header: its first column names the text field and
/// every further column names a characteristic.
pub struct CsvDataSource {
    path: PathBuf,
    /// CSV delimiter character (default: ',')
    delimiter: u8,
    /// Whether to trim whitespace from fields
    trim: bool,
}

impl fmt::Debug for CsvDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvDataSource")
            .field("path", &self.path)
            .field("delimiter", &(self.delimiter as char))
            .field("trim", &self.trim)
            .finish()
    }
}

impl CsvDataSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: b',',
            trim: true,
        }
    }

    /// Set a custom delimiter character.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter as u8;
        self
    }

    /// Set whether to trim whitespace from fields.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrainingDataSource for CsvDataSource {
    fn read_all(&self) -> Result<ClassifiableData, ClassifierError> {
        let file = File::open(&self.path).map_err(|e| {
            ClassifierError::DataSource(format!(
                "Cannot open data file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim {
                csv::Trim::All
            } else {
                csv::Trim::None
            })
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(ClassifierError::DataSource(format!(
                "Data file {} must have a text column followed by at least one characteristic column",
                self.path.display()
            )));
        }

        let names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
        let mut builder = CorpusBuilder::new();
        for name in &names {
            builder.declare_characteristic(name).map_err(|e| {
                ClassifierError::DataSource(format!("Invalid header in {}: {}", self.path.display(), e))
            })?;
        }

        for record in reader.records() {
            let record = record?;
            let text = record.get(0).unwrap_or_default();
            let labels = names
                .iter()
                .zip(record.iter().skip(1))
                .map(|(name, value)| (name.as_str(), value));
            builder.add_record(text, labels).map_err(|e| {
                ClassifierError::DataSource(format!(
                    "Malformed record at line {}: {}",
                    record.position().map(|p| p.line()).unwrap_or_default(),
                    e
                ))
            })?;
        }

        let data = builder.finish();
        info!(
            "Read {} records with {} characteristics from {}",
            data.len(),
            data.characteristics().len(),
            self.path.display()
        );
        Ok(data)
    }
}

/// A data source over a corpus that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataSource {
    data: ClassifiableData,
}

impl MemoryDataSource {
    pub fn new(data: ClassifiableData) -> Self {
        Self { data }
    }
}

impl TrainingDataSource for MemoryDataSource {
    fn read_all(&self) -> Result<ClassifiableData, ClassifierError> {
        Ok(self.data.clone())
    }
}
