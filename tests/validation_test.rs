mod common;

use std::io::Write;
use std::sync::Arc;

use common::{init_logging, Behavior, StubFactory};
use tempfile::NamedTempFile;
use textclassifier::{
    BuildStage, Classifier, ClassifierBuilder, ClassifierError, CsvDataSource, NGramType,
    TrainingDataSource,
};

fn csv(content: &str) -> NamedTempFile {
    init_logging();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_duplicate_unit_request() {
    let result = Classifier::builder("tickets.csv")
        .add_unit("Category", NGramType::Unigram)
        .and_then(|builder| builder.add_unit("Category", NGramType::Unigram));
    assert!(matches!(result, Err(ClassifierError::InvalidConfiguration(_))));
}

#[test]
fn test_empty_characteristic_name() {
    let result = Classifier::builder("tickets.csv").add_unit("  ", NGramType::Bigram);
    assert!(matches!(result, Err(ClassifierError::InvalidConfiguration(_))));
}

#[test]
fn test_missing_data_file() -> Result<(), ClassifierError> {
    let err = ClassifierBuilder::from_csv("/definitely/not/here.csv")
        .add_unit("Category", NGramType::Unigram)?
        .build()
        .unwrap_err();
    assert_eq!(err.stage(), Some(BuildStage::DataRead));
    assert!(matches!(err.root_cause(), ClassifierError::DataSource(_)));
    Ok(())
}

#[test]
fn test_malformed_row() {
    let file = csv("text,Category\nprinter jammed,hardware\nextra,fields,here\n");
    let result = CsvDataSource::new(file.path()).read_all();
    assert!(matches!(result, Err(ClassifierError::DataSource(_))));
}

#[test]
fn test_header_without_characteristics() {
    let file = csv("text\nprinter jammed\n");
    let result = CsvDataSource::new(file.path()).read_all();
    assert!(matches!(result, Err(ClassifierError::DataSource(_))));
}

#[test]
fn test_csv_values_are_numbered_by_first_appearance() -> Result<(), ClassifierError> {
    let file = csv("text;Priority;Team\n\
                    printer jammed;low;desk\n\
                    server down;critical;ops\n\
                    ;high;ops\n\
                    login locked;high;\n\
                    printer offline;low;desk\n");
    let data = CsvDataSource::new(file.path()).with_delimiter(';').read_all()?;

    // The record without text is skipped
    assert_eq!(data.len(), 4);

    let priority = data.characteristic("Priority").unwrap();
    let values: Vec<(&str, usize)> = priority
        .possible_values()
        .iter()
        .map(|v| (v.value(), v.order_number()))
        .collect();
    assert_eq!(values, vec![("low", 1), ("critical", 2), ("high", 3)]);

    let team = data.characteristic("Team").unwrap();
    assert_eq!(team.len(), 2);
    assert!(data.texts()[2].characteristic_value("Team").is_none());
    Ok(())
}

#[test]
fn test_vocabulary_too_small() -> Result<(), ClassifierError> {
    let file = csv("text,Category\nprinter jammed,hardware\nlogin locked,account\n");
    let err = ClassifierBuilder::from_csv(file.path())
        .with_model_factory(Arc::new(StubFactory::new(Behavior::Lookup)))
        .add_unit("Category", NGramType::Unigram)?
        .build()
        .unwrap_err();
    assert_eq!(err.stage(), Some(BuildStage::Vocabulary));
    assert!(matches!(err.root_cause(), ClassifierError::InvalidInput(_)));
    assert!(err.to_string().contains("Category"));
    Ok(())
}

#[test]
fn test_lower_frequency_threshold() -> Result<(), ClassifierError> {
    let file = csv("text,Category\nprinter jammed,hardware\nlogin locked,account\n");
    let classifier = ClassifierBuilder::from_csv(file.path())
        .with_model_factory(Arc::new(StubFactory::new(Behavior::Lookup)))
        .with_min_word_frequency(0)
        .add_unit("Category", NGramType::Unigram)?
        .build()?;
    assert_eq!(classifier.info().units[0].vocabulary_size, 4);
    assert_eq!(classifier.classify("login")?[0].value(), "account");
    Ok(())
}
