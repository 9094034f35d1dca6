//! Fit the linear sentence classifier from a labelled table.

use std::{collections::HashMap, path::Path};

use indexmap::IndexMap;
use linfa::{
    dataset::DatasetBase,
    prelude::{Fit, Predict},
};
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::{PipelineError, PipelineResult},
    nlp::model::{tokenize, LinearModel},
};

/// One labelled sentence.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingExample {
    pub sentence_text: String,
    pub label: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub vocab_size: usize,
    pub holdout: f64,
    pub seed: u64,
    pub max_iterations: u64,
    pub max_tokens: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            vocab_size: 2000,
            holdout: 0.2,
            seed: 42,
            max_iterations: 150,
            max_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub vocabulary: usize,
    pub holdout_accuracy: Option<f64>,
}

pub fn read_examples(path: &Path) -> PipelineResult<Vec<TrainingExample>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for result in reader.deserialize::<TrainingExample>() {
        let example = result?;
        if example.label != 0 && example.label != 1 {
            return Err(PipelineError::Training(format!(
                "label {} is not 0 or 1",
                example.label
            )));
        }
        out.push(example);
    }
    Ok(out)
}

/// Shuffle, hold out a fraction, fit a logistic regression and export its weights.
pub fn fit(
    mut examples: Vec<TrainingExample>,
    options: TrainOptions,
) -> PipelineResult<(LinearModel, TrainReport)> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    examples.shuffle(&mut rng);
    let holdout_rows = ((examples.len() as f64) * options.holdout.clamp(0.0, 0.9)) as usize;
    let train = examples.split_off(holdout_rows);
    let holdout = examples;
    if train.is_empty() {
        return Err(PipelineError::Training("no training rows".into()));
    }

    let vocabulary = build_vocabulary(&train, options.vocab_size, options.max_tokens);
    if vocabulary.is_empty() {
        return Err(PipelineError::Training("empty vocabulary".into()));
    }
    let mut model = LinearModel {
        vocabulary,
        weights: Vec::new(),
        intercept: 0.0,
        max_tokens: options.max_tokens,
    };

    let x = feature_matrix(&model, &train)?;
    let y = Array1::from(train.iter().map(|e| e.label).collect::<Vec<_>>());
    let dataset: DatasetBase<_, _> = DatasetBase::new(x.clone(), y);
    let fitted = LogisticRegression::default()
        .max_iterations(options.max_iterations)
        .fit(&dataset)
        .map_err(|err| PipelineError::Training(err.to_string()))?;

    model.weights = fitted.params().to_vec();
    model.intercept = fitted.intercept();
    align_orientation(&mut model, &train, fitted.predict(&x).to_vec());

    let holdout_accuracy = if holdout.is_empty() {
        None
    } else {
        let correct = holdout
            .iter()
            .filter(|e| (model.score(&e.sentence_text) > 0.0) == (e.label == 1))
            .count();
        Some(correct as f64 / holdout.len() as f64)
    };
    let report = TrainReport {
        train_rows: train.len(),
        holdout_rows: holdout.len(),
        vocabulary: model.vocabulary.len(),
        holdout_accuracy,
    };
    info!(?report, "fitted sentence classifier");
    Ok((model, report))
}

/// Most frequent tokens by document frequency, ties broken alphabetically.
fn build_vocabulary(
    examples: &[TrainingExample],
    size: usize,
    max_tokens: usize,
) -> IndexMap<String, usize> {
    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    for example in examples {
        let mut tokens = tokenize(&example.sentence_text, max_tokens);
        tokens.sort_unstable();
        tokens.dedup();
        for token in tokens {
            *doc_freq.entry(token).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = doc_freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(size)
        .enumerate()
        .map(|(col, (token, _))| (token, col))
        .collect()
}

fn feature_matrix(model: &LinearModel, examples: &[TrainingExample]) -> PipelineResult<Array2<f64>> {
    let cols = model.vocabulary.len();
    let mut matrix = vec![0.0; examples.len() * cols];
    for (row, example) in examples.iter().enumerate() {
        for col in model.active_features(&example.sentence_text) {
            matrix[row * cols + col] = 1.0;
        }
    }
    Array2::from_shape_vec((examples.len(), cols), matrix)
        .map_err(|err| PipelineError::Training(err.to_string()))
}

/// The fitted parameters may score toward either label; flip them so a
/// positive score agrees with the fitted model's class 1.
fn align_orientation(model: &mut LinearModel, train: &[TrainingExample], predicted: Vec<usize>) {
    let agree = train
        .iter()
        .zip(&predicted)
        .filter(|(e, label)| (model.score(&e.sentence_text) > 0.0) == (**label == 1))
        .count();
    if agree * 2 < predicted.len() {
        warn!("fitted parameters score class 0; flipping sign");
        model.weights.iter_mut().for_each(|w| *w = -*w);
        model.intercept = -model.intercept;
    }
}
