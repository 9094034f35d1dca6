//! Row types flowing between the pipeline stages.

use serde::{Deserialize, Serialize};

/// One uploaded note before masking and sentence splitting.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteRow {
    #[serde(rename = "PersonID")]
    pub person_id: String,
    pub date: String,
    #[serde(rename = "DocumentID")]
    pub document_id: String,
    pub response: String,
}

/// A single sentence produced by splitting a masked note.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentenceRecord {
    #[serde(rename = "PersonID")]
    pub person_id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "DocumentID")]
    pub document_id: String,
    #[serde(rename = "SentenceID")]
    pub sentence_id: String,
    pub sentence_text: String,
}

impl SentenceRecord {
    pub fn key(&self) -> SentenceKey {
        SentenceKey {
            person_id: self.person_id.clone(),
            document_id: self.document_id.clone(),
            sentence_id: self.sentence_id.clone(),
        }
    }
}

/// Sentence identifiers used to join predictions back onto text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentenceKey {
    pub person_id: String,
    pub document_id: String,
    pub sentence_id: String,
}

/// Chunk payload: the four columns the model consumes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChunkSentence {
    #[serde(rename = "PersonID")]
    pub person_id: String,
    #[serde(rename = "DocumentID")]
    pub document_id: String,
    #[serde(rename = "SentenceID")]
    pub sentence_id: String,
    pub sentence_text: String,
}

/// Model output for one sentence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassificationResult {
    #[serde(rename = "PersonID")]
    pub person_id: String,
    #[serde(rename = "DocumentID")]
    pub document_id: String,
    #[serde(rename = "SentenceID")]
    pub sentence_id: String,
    pub prediction: u8,
    pub proba: [f64; 2],
}

/// Final labelled row: the sentence plus its prediction, if any.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClassifiedSentence {
    #[serde(rename = "PersonID")]
    pub person_id: String,
    pub date: Option<String>,
    #[serde(rename = "DocumentID")]
    pub document_id: String,
    #[serde(rename = "SentenceID")]
    pub sentence_id: String,
    pub sentence_text: String,
    pub prediction: Option<u8>,
    pub proba_0: Option<f64>,
    pub proba_1: Option<f64>,
}
