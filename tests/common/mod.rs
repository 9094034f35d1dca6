#![allow(dead_code)]

use note_classifier::{
    data::{
        records::ChunkSentence,
        store::{self, ChunkStore},
    },
    errors::{PipelineError, PipelineResult},
    nlp::model::SentenceClassifier,
};

/// Scores sentences mentioning "pain" as positive; fails on "boom".
pub struct KeywordClassifier;

impl SentenceClassifier for KeywordClassifier {
    fn logits(&self, texts: &[String]) -> PipelineResult<Vec<[f64; 2]>> {
        texts
            .iter()
            .map(|text| {
                if text.contains("boom") {
                    Err(PipelineError::Model("tokenizer exploded".into()))
                } else if text.to_lowercase().contains("pain") {
                    Ok([-1.0, 2.0])
                } else {
                    Ok([1.5, -0.5])
                }
            })
            .collect()
    }
}

pub fn sentence(doc: &str, idx: usize, text: &str) -> ChunkSentence {
    ChunkSentence {
        person_id: "p1".into(),
        document_id: doc.into(),
        sentence_id: format!("{doc}_{idx}"),
        sentence_text: text.into(),
    }
}

pub fn seed_chunks(store: &dyn ChunkStore, chunks: &[Vec<ChunkSentence>]) {
    for (index, chunk) in chunks.iter().enumerate() {
        store::write_json(store, index, chunk).unwrap();
    }
}
