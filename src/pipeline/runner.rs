//! Resumable per-chunk classification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    data::{
        error_log::{chunk_status, ChunkStatus, ErrorLog},
        records::{ChunkSentence, ClassificationResult},
        store::{self, ChunkStore},
    },
    errors::{PipelineError, PipelineResult},
    nlp::model::{argmax, softmax, SentenceClassifier},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Start from chunk zero and discard earlier results.
    pub overwrite: bool,
    /// Re-attempt chunks whose result is a failure tombstone.
    pub retry_failed: bool,
}

/// What happened to one chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChunkOutcome {
    Classified { index: usize, sentences: usize },
    Failed { index: usize, error: String },
}

impl ChunkOutcome {
    pub fn index(&self) -> usize {
        match self {
            Self::Classified { index, .. } | Self::Failed { index, .. } => *index,
        }
    }
}

/// Summary of one classification pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub start: usize,
    pub end: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ChunkOutcome>,
}

impl RunReport {
    pub fn classified(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ChunkOutcome::Classified { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.classified()
    }
}

/// Walks unclassified input chunks and writes one result per chunk.
pub struct ClassifierRunner<'a> {
    input: &'a dyn ChunkStore,
    output: &'a dyn ChunkStore,
    errors: &'a ErrorLog,
    model: &'a dyn SentenceClassifier,
}

impl<'a> ClassifierRunner<'a> {
    pub fn new(
        input: &'a dyn ChunkStore,
        output: &'a dyn ChunkStore,
        errors: &'a ErrorLog,
        model: &'a dyn SentenceClassifier,
    ) -> Self {
        Self {
            input,
            output,
            errors,
            model,
        }
    }

    /// Classify `[first unclassified, last input]`; failures are tombstoned
    /// and logged so the pass always moves forward.
    pub fn run(&self, options: RunOptions) -> PipelineResult<RunReport> {
        let started_at = Utc::now();
        let retries = if options.retry_failed && !options.overwrite {
            chunk_status(self.input, self.output, self.errors)?
                .into_iter()
                .filter(|(_, status)| *status == ChunkStatus::Failed)
                .map(|(index, _)| index)
                .collect()
        } else {
            Vec::new()
        };

        let start = if options.overwrite {
            let removed = self.output.clear()?;
            if removed > 0 {
                info!(removed, "overwrite set; discarded earlier results");
            }
            0
        } else {
            self.output.next_index()?
        };
        let end = self.input.next_index()?;
        info!(start, end, retries = retries.len(), "classification range");

        let mut outcomes = Vec::new();
        if start >= end && retries.is_empty() {
            info!("all chunks have already been classified");
        }
        for index in retries.into_iter().chain(start..end) {
            outcomes.push(self.process(index)?);
        }

        let report = RunReport {
            start,
            end,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            classified = report.classified(),
            failed = report.failed(),
            "classification pass finished"
        );
        Ok(report)
    }

    /// Only the tombstone and log writes can fail the whole pass.
    fn process(&self, index: usize) -> PipelineResult<ChunkOutcome> {
        info!(index, "processing chunk");
        match self.classify_chunk(index) {
            Ok(sentences) => Ok(ChunkOutcome::Classified { index, sentences }),
            Err(err) => {
                let error = err.to_string();
                warn!(index, %error, "chunk failed; writing tombstone");
                store::write_tombstone(self.output, index)?;
                self.errors.record(index, &error)?;
                Ok(ChunkOutcome::Failed { index, error })
            }
        }
    }

    fn classify_chunk(&self, index: usize) -> PipelineResult<usize> {
        let sentences: Vec<ChunkSentence> = serde_json::from_slice(&self.input.read(index)?)?;
        let texts: Vec<String> = sentences.iter().map(|s| s.sentence_text.clone()).collect();
        let logits = self.model.logits(&texts)?;
        if logits.len() != sentences.len() {
            return Err(PipelineError::Model(format!(
                "{} scores returned for {} sentences",
                logits.len(),
                sentences.len()
            )));
        }
        if logits.iter().flatten().any(|v| !v.is_finite()) {
            return Err(PipelineError::Model("non-finite logits".into()));
        }

        let results: Vec<ClassificationResult> = sentences
            .into_iter()
            .zip(logits)
            .map(|(sentence, logit)| {
                let proba = softmax(logit);
                ClassificationResult {
                    person_id: sentence.person_id,
                    document_id: sentence.document_id,
                    sentence_id: sentence.sentence_id,
                    prediction: argmax(proba),
                    proba,
                }
            })
            .collect();
        store::write_json(self.output, index, &results)?;
        Ok(results.len())
    }
}
