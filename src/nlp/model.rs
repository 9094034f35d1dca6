//! Sentence classifier seam and the bag-of-words linear model behind it.

use std::{path::Path, sync::Arc};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::Settings,
    errors::{PipelineError, PipelineResult},
};

/// Anything that can score a batch of sentences with two-class logits.
pub trait SentenceClassifier: Send + Sync {
    /// One `[negative, positive]` logit pair per input sentence.
    fn logits(&self, texts: &[String]) -> PipelineResult<Vec<[f64; 2]>>;
}

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));

/// Lower-cased word tokens, truncated to `max_tokens`.
pub fn tokenize(text: &str, max_tokens: usize) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .take(max_tokens)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Logistic model over binary token-presence features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub vocabulary: IndexMap<String, usize>,
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub max_tokens: usize,
}

impl LinearModel {
    /// Column index of every vocabulary token present in `text`.
    pub fn active_features(&self, text: &str) -> Vec<usize> {
        let mut columns: Vec<usize> = tokenize(text, self.max_tokens)
            .iter()
            .filter_map(|token| self.vocabulary.get(token).copied())
            .collect();
        columns.sort_unstable();
        columns.dedup();
        columns
    }

    /// Decision value: positive means class 1.
    pub fn score(&self, text: &str) -> f64 {
        self.intercept
            + self
                .active_features(text)
                .into_iter()
                .filter_map(|col| self.weights.get(col))
                .sum::<f64>()
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::ModelUnavailable(path.to_path_buf()));
        }
        let model: Self = serde_json::from_slice(&std::fs::read(path)?)?;
        if model.weights.len() != model.vocabulary.len() {
            return Err(PipelineError::Model(format!(
                "{} weights for {} vocabulary entries",
                model.weights.len(),
                model.vocabulary.len()
            )));
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

impl SentenceClassifier for LinearModel {
    fn logits(&self, texts: &[String]) -> PipelineResult<Vec<[f64; 2]>> {
        Ok(texts.iter().map(|text| [0.0, self.score(text)]).collect())
    }
}

/// Load the configured model weights; `MAX_TOKENS` governs truncation at
/// inference regardless of the value recorded at training time.
pub fn load_model(settings: &Settings) -> PipelineResult<Arc<dyn SentenceClassifier>> {
    let mut model = LinearModel::load(&settings.model_path)?;
    if model.max_tokens != settings.max_tokens {
        info!(
            trained = model.max_tokens,
            configured = settings.max_tokens,
            "overriding model token limit"
        );
        model.max_tokens = settings.max_tokens;
    }
    info!(
        path = %settings.model_path.display(),
        vocabulary = model.vocabulary.len(),
        max_tokens = model.max_tokens,
        "loaded sentence classifier"
    );
    Ok(Arc::new(model) as Arc<dyn SentenceClassifier>)
}

/// Numerically stable softmax over one logit pair.
pub fn softmax(logits: [f64; 2]) -> [f64; 2] {
    let max = logits[0].max(logits[1]);
    let e0 = (logits[0] - max).exp();
    let e1 = (logits[1] - max).exp();
    let total = e0 + e1;
    [e0 / total, e1 / total]
}

/// Index of the larger value; ties resolve to class 0.
pub fn argmax(values: [f64; 2]) -> u8 {
    if values[1] > values[0] {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_for_large_logits() {
        let proba = softmax([1000.0, 1001.0]);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert_eq!(argmax(proba), 1);
    }

    #[test]
    fn tokenizer_truncates() {
        assert_eq!(tokenize("Can't SLEEP, at all", 3), vec!["can't", "sleep", "at"]);
    }

    #[test]
    fn score_counts_each_token_once() {
        let model = LinearModel {
            vocabulary: IndexMap::from([("pain".to_string(), 0)]),
            weights: vec![1.5],
            intercept: -1.0,
            max_tokens: 16,
        };
        assert!((model.score("pain pain pain") - 0.5).abs() < 1e-12);
    }
}
