#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{Array1, Array2};
use textclassifier::{
    ClassifiableData, ClassifierError, CorpusBuilder, ModelFactory, TrainableModel,
    TrainingDataSource, TrainingReport,
};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answers with the target of the most similar training input
    Lookup,
    /// Never produces a usable answer
    NoAnswer,
    /// Works like `Lookup` but fails to release
    FailRelease,
}

/// A deterministic stand-in for a real network.
#[derive(Debug)]
pub struct StubModel {
    inputs: usize,
    outputs: usize,
    behavior: Behavior,
    memory: Vec<(Array1<f64>, Array1<f64>)>,
    releases: Arc<AtomicUsize>,
}

impl TrainableModel for StubModel {
    fn input_size(&self) -> usize {
        self.inputs
    }

    fn output_size(&self) -> usize {
        self.outputs
    }

    fn train(&mut self, inputs: &Array2<f64>, targets: &Array2<f64>) -> Result<TrainingReport, ClassifierError> {
        self.memory = inputs
            .rows()
            .into_iter()
            .zip(targets.rows())
            .map(|(i, t)| (i.to_owned(), t.to_owned()))
            .collect();
        Ok(TrainingReport {
            iterations: 1,
            error: 0.0,
            converged: true,
        })
    }

    fn predict(&self, input: &Array1<f64>) -> Result<Array1<f64>, ClassifierError> {
        if self.behavior == Behavior::NoAnswer {
            return Ok(Array1::from_elem(self.outputs, f64::NAN));
        }
        let mut best: Option<(f64, &Array1<f64>)> = None;
        for (stored, target) in &self.memory {
            let score = stored.dot(input);
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, target));
            }
        }
        Ok(best
            .map(|(_, target)| target.clone())
            .unwrap_or_else(|| Array1::zeros(self.outputs)))
    }

    fn serialize(&self) -> Result<Vec<u8>, ClassifierError> {
        let memory: Vec<(Vec<f64>, Vec<f64>)> = self
            .memory
            .iter()
            .map(|(i, t)| (i.to_vec(), t.to_vec()))
            .collect();
        serde_json::to_vec(&(self.inputs, self.outputs, memory))
            .map_err(|e| ClassifierError::Persistence(e.to_string()))
    }

    fn release(&mut self) -> Result<(), ClassifierError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.behavior == Behavior::FailRelease {
            return Err(ClassifierError::Model("release failed".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StubFactory {
    pub behavior: Behavior,
    pub releases: Arc<AtomicUsize>,
}

impl StubFactory {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl ModelFactory for StubFactory {
    fn create(&self, input_size: usize, output_size: usize) -> Result<Box<dyn TrainableModel>, ClassifierError> {
        Ok(Box::new(StubModel {
            inputs: input_size,
            outputs: output_size,
            behavior: self.behavior,
            memory: Vec::new(),
            releases: Arc::clone(&self.releases),
        }))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn TrainableModel>, ClassifierError> {
        let (inputs, outputs, memory): (usize, usize, Vec<(Vec<f64>, Vec<f64>)>) =
            serde_json::from_slice(bytes).map_err(|e| ClassifierError::Persistence(e.to_string()))?;
        Ok(Box::new(StubModel {
            inputs,
            outputs,
            behavior: self.behavior,
            memory: memory
                .into_iter()
                .map(|(i, t)| (Array1::from(i), Array1::from(t)))
                .collect(),
            releases: Arc::clone(&self.releases),
        }))
    }
}

/// Serves a fixed corpus and counts how often it was read.
pub struct CountingSource {
    data: ClassifiableData,
    pub reads: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(data: ClassifiableData) -> Self {
        Self {
            data,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TrainingDataSource for CountingSource {
    fn read_all(&self) -> Result<ClassifiableData, ClassifierError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

/// Ten support tickets with two characteristics.
pub fn tickets() -> ClassifiableData {
    let mut corpus = CorpusBuilder::new();
    for _ in 0..5 {
        corpus
            .add_record(
                "printer paper jammed in the tray",
                [("Category", "hardware"), ("Priority", "low")],
            )
            .unwrap();
        corpus
            .add_record(
                "cannot login, account password locked",
                [("Category", "account"), ("Priority", "high")],
            )
            .unwrap();
    }
    corpus.finish()
}

pub const TICKETS_CSV: &str = "\
text,Category,Priority
printer paper jammed in the tray,hardware,low
cannot login; account password locked,account,high
printer paper jammed in the tray,hardware,low
cannot login; account password locked,account,high
printer paper jammed in the tray,hardware,low
cannot login; account password locked,account,high
printer paper jammed in the tray,hardware,low
cannot login; account password locked,account,high
printer paper jammed in the tray,hardware,low
cannot login; account password locked,account,high
";
