use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use textclassifier::{
    ClassifierBuilder, CsvDataSource, NGramType, NeuralNetworkFactory, TrainingConfig,
    TrainingDataSource,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file with a text column followed by one column per characteristic
    #[arg(short, long, env = "TEXTCLASSIFIER_DATA")]
    data: PathBuf,

    /// Classifier unit as NAME or NAME:NGRAM_TYPE (may be repeated)
    #[arg(short, long = "unit", required = true, value_parser = parse_unit)]
    units: Vec<(String, NGramType)>,

    /// Save the trained units into this directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Load previously saved units from this directory instead of training
    #[arg(long, conflicts_with = "save_dir")]
    load_dir: Option<PathBuf>,

    /// Report per-characteristic accuracy on the training data
    #[arg(long)]
    check_accuracy: bool,

    #[arg(long, default_value_t = 1000)]
    max_iterations: usize,

    #[arg(long, default_value_t = 0.01)]
    max_error: f64,

    /// Tokens must occur in more than this many texts to enter a vocabulary
    #[arg(long, default_value_t = 3)]
    min_word_frequency: usize,

    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Texts to classify
    texts: Vec<String>,
}

fn parse_unit(s: &str) -> Result<(String, NGramType), String> {
    let (name, ngram_type) = match s.rsplit_once(':') {
        Some((name, ngram_type)) => (name, ngram_type.parse()?),
        None => (s, NGramType::FilteredUnigram),
    };
    if name.trim().is_empty() {
        return Err(format!("Missing characteristic name in '{}'", s));
    }
    Ok((name.to_string(), ngram_type))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be an ASCII character, got '{}'", args.delimiter);
    }

    info!("=== Starting Text Classifier ===");
    let start_time = Instant::now();

    let config = TrainingConfig::default()
        .with_max_iterations(args.max_iterations)
        .with_max_error(args.max_error);
    config.validate()?;
    let source = CsvDataSource::new(&args.data).with_delimiter(args.delimiter);

    let mut builder = ClassifierBuilder::new(Box::new(source))
        .with_model_factory(Arc::new(NeuralNetworkFactory::new(config)))
        .with_min_word_frequency(args.min_word_frequency);
    for (name, ngram_type) in &args.units {
        builder = match &args.load_dir {
            Some(dir) => builder.add_pretrained_unit(name, *ngram_type, dir)?,
            None => builder.add_unit(name, *ngram_type)?,
        };
    }

    let mut classifier = builder
        .build()
        .with_context(|| format!("Failed to build classifier from {:?}", args.data))?;
    info!("Classifier built in {:.2?}", start_time.elapsed());

    for unit in classifier.info().units {
        println!(
            "{} ({}): {} words, {} values",
            unit.characteristic, unit.ngram_type, unit.vocabulary_size, unit.num_values
        );
    }

    if let Some(dir) = &args.save_dir {
        let paths = classifier.save_all(dir)?;
        println!("Saved {} unit(s) to {}", paths.len(), dir.display());
    }

    if args.check_accuracy {
        // The corpus is read again so the builder keeps sole ownership of its source.
        let data = CsvDataSource::new(&args.data)
            .with_delimiter(args.delimiter)
            .read_all()?;
        for report in classifier.check_accuracy(data.texts())? {
            println!(
                "Accuracy of '{}': {:.2}% ({}/{})",
                report.characteristic, report.accuracy, report.correct, report.total
            );
        }
    }

    for text in &args.texts {
        let values = classifier.classify(text)?;
        if values.is_empty() {
            println!("{}\n  (no match)", text);
            continue;
        }
        println!("{}", text);
        for value in values {
            println!("  {}: {}", value.characteristic(), value.value());
        }
    }

    classifier.shutdown()?;
    info!("=== Done in {:.2?} ===", start_time.elapsed());
    Ok(())
}
