//! Merge classified chunks back onto the sentence table.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    data::{
        records::{ClassifiedSentence, SentenceKey, SentenceRecord},
        store::ChunkStore,
    },
    errors::{PipelineError, PipelineResult},
};

/// Loosely typed result row; the prediction is validated during partitioning.
#[derive(Debug, Clone, Deserialize)]
struct RawPrediction {
    #[serde(rename = "PersonID")]
    person_id: String,
    #[serde(rename = "DocumentID")]
    document_id: String,
    #[serde(rename = "SentenceID")]
    sentence_id: String,
    prediction: serde_json::Value,
    #[serde(default)]
    proba: Vec<f64>,
}

#[derive(Debug, Clone)]
struct Prediction {
    key: SentenceKey,
    label: u8,
    proba_0: Option<f64>,
    proba_1: Option<f64>,
}

/// Final labelled table plus the chunks that could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct Assembly {
    pub records: Vec<ClassifiedSentence>,
    pub problems: Vec<String>,
}

/// Collect every readable classified chunk and left-join it onto `sentences`.
pub fn assemble(
    classified: &dyn ChunkStore,
    sentences: &[SentenceRecord],
) -> PipelineResult<Assembly> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    let mut problems = Vec::new();

    for index in classified.indices()? {
        let Some(chunk) = read_chunk(classified, index) else {
            problems.push(classified.locate(index));
            continue;
        };
        let (pos, neg) = partition_chunk(chunk)?;
        positives.extend(pos);
        negatives.extend(neg);
    }
    if !problems.is_empty() {
        warn!(count = problems.len(), files = ?problems, "problems reading classified chunks");
    }
    info!(
        positives = positives.len(),
        negatives = negatives.len(),
        "partitioned predictions"
    );

    let mut predictions = positives;
    predictions.extend(negatives);
    let records = join_with_text(sentences, predictions);
    Ok(Assembly { records, problems })
}

/// Assemble and persist the labelled table as indented JSON at `out_path`.
pub fn prepare_output(
    classified: &dyn ChunkStore,
    sentences: &[SentenceRecord],
    out_path: &Path,
) -> PipelineResult<Assembly> {
    let assembly = assemble(classified, sentences)?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    assembly.records.serialize(&mut serializer)?;
    fs::write(out_path, buf)?;
    info!(path = %out_path.display(), rows = assembly.records.len(), "wrote labelled sentences");
    Ok(assembly)
}

fn read_chunk(store: &dyn ChunkStore, index: usize) -> Option<Vec<RawPrediction>> {
    let bytes = store.read(index).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn partition_chunk(chunk: Vec<RawPrediction>) -> PipelineResult<(Vec<Prediction>, Vec<Prediction>)> {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for raw in chunk {
        let label = match raw.prediction.as_u64() {
            Some(0) => 0,
            Some(1) => 1,
            _ => {
                return Err(PipelineError::InvalidPrediction {
                    person_id: raw.person_id,
                    document_id: raw.document_id,
                    sentence_id: raw.sentence_id,
                    value: raw.prediction.to_string(),
                })
            }
        };
        let prediction = Prediction {
            key: SentenceKey {
                person_id: raw.person_id,
                document_id: raw.document_id,
                sentence_id: raw.sentence_id,
            },
            label,
            proba_0: raw.proba.first().copied(),
            proba_1: raw.proba.get(1).copied(),
        };
        if label == 1 {
            positives.push(prediction);
        } else {
            negatives.push(prediction);
        }
    }
    Ok((positives, negatives))
}

/// Left join: every sentence is kept, once per matching prediction.
fn join_with_text(
    sentences: &[SentenceRecord],
    predictions: Vec<Prediction>,
) -> Vec<ClassifiedSentence> {
    let mut by_key: HashMap<SentenceKey, Vec<Prediction>> = HashMap::new();
    for prediction in predictions {
        by_key
            .entry(prediction.key.clone())
            .or_default()
            .push(prediction);
    }

    let mut rows = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let row = |prediction: Option<&Prediction>| ClassifiedSentence {
            person_id: sentence.person_id.clone(),
            date: sentence.date.clone(),
            document_id: sentence.document_id.clone(),
            sentence_id: sentence.sentence_id.clone(),
            sentence_text: sentence.sentence_text.clone(),
            prediction: prediction.map(|p| p.label),
            proba_0: prediction.and_then(|p| p.proba_0),
            proba_1: prediction.and_then(|p| p.proba_1),
        };
        match by_key.get(&sentence.key()) {
            Some(matches) => rows.extend(matches.iter().map(|p| row(Some(p)))),
            None => rows.push(row(None)),
        }
    }
    rows
}
