//! Upload pipeline: mask, split, chunk, classify, assemble.

use std::{collections::HashSet, sync::Arc};

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{
        self,
        assemble::{self, Assembly},
        chunker::{self, ChunkSummary, ChunkerOptions},
        error_log::ErrorLog,
        records::{ClassifiedSentence, NoteRow, SentenceRecord},
        store::FsChunkStore,
    },
    errors::{PipelineError, PipelineResult},
    nlp::{
        mask::{self, AnonMask},
        model::SentenceClassifier,
        sentences::{self, SentenceSplitter},
    },
    pipeline::runner::{ClassifierRunner, RunOptions, RunReport},
};

/// Columns expected in an uploaded notes table.
pub const NOTE_COLUMNS: [&str; 4] = ["PersonID", "date", "DocumentID", "response"];

/// Values of the `overwrite` form field that count as true.
const TRUTHY: &[&str] = &["true", "1", "t", "y", "yes"];

pub fn parse_flag(value: &str) -> bool {
    TRUTHY.contains(&value.trim().to_lowercase().as_str())
}

/// Everything a pipeline run needs besides its input.
#[derive(Clone)]
pub struct PipelineContext {
    pub settings: Settings,
    pub model: Arc<dyn SentenceClassifier>,
    pub splitter: Arc<dyn SentenceSplitter>,
}

impl PipelineContext {
    pub fn input_store(&self) -> FsChunkStore {
        FsChunkStore::new(self.settings.chunks_dir())
    }

    pub fn output_store(&self) -> FsChunkStore {
        FsChunkStore::new(self.settings.classified_dir())
    }

    pub fn error_log(&self) -> ErrorLog {
        ErrorLog::new(self.settings.errors_dir())
    }
}

/// Echo of the run's inputs and headline counts.
#[derive(Debug, Clone, Serialize)]
pub struct RunParameters {
    pub sentences_written: String,
    pub person_count: usize,
    pub document_count: usize,
    pub sentence_count: usize,
    pub model_input_created: bool,
    pub classification_run: bool,
    pub output_prepared: bool,
    pub anon_mask: AnonMask,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub parameters: RunParameters,
    pub chunks: ChunkSummary,
    pub run: RunReport,
    pub problems: Vec<String>,
    pub predictions: Vec<ClassifiedSentence>,
}

/// Parse an uploaded notes CSV. Malformed bytes are the client's fault.
pub fn parse_notes(bytes: &[u8]) -> PipelineResult<Vec<NoteRow>> {
    let unreadable = |err: csv::Error| PipelineError::BadUpload(err.to_string());
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let positions =
        chunker::column_positions(reader.byte_headers().map_err(unreadable)?, &NOTE_COLUMNS)?;
    let mut notes = Vec::new();
    for result in reader.records() {
        let record = result.map_err(unreadable)?;
        let cell = |pos: usize| record.get(positions[pos]).unwrap_or_default().to_string();
        notes.push(NoteRow {
            person_id: cell(0),
            date: cell(1),
            document_id: cell(2),
            response: cell(3),
        });
    }
    Ok(notes)
}

/// Run every stage for one batch of notes.
#[instrument(skip_all, fields(notes = notes.len(), overwrite = overwrite))]
pub fn run_pipeline(
    ctx: &PipelineContext,
    notes: &[NoteRow],
    anon_mask: AnonMask,
    overwrite: bool,
) -> PipelineResult<PipelineOutput> {
    let masked = mask::mask_notes(notes, &anon_mask);
    let sentence_rows = sentences::split_notes(&masked, ctx.splitter.as_ref());
    if sentence_rows.is_empty() {
        return Err(PipelineError::NoSentences);
    }
    let sentence_csv = ctx.settings.sentence_csv();
    data::write_sentence_csv(&sentence_csv, &sentence_rows)?;

    let input = ctx.input_store();
    let output = ctx.output_store();
    let errors = ctx.error_log();

    let chunks = chunker::create_model_input(
        &sentence_csv,
        &input,
        ChunkerOptions {
            chunk_size: ctx.settings.chunk_size,
            overwrite,
        },
    )?;
    let run = ClassifierRunner::new(&input, &output, &errors, ctx.model.as_ref()).run(
        RunOptions {
            overwrite,
            retry_failed: false,
        },
    )?;
    let sentence_table = data::read_sentence_csv(&sentence_csv)?;
    let Assembly { records, problems } =
        assemble::prepare_output(&output, &sentence_table, &ctx.settings.output_json())?;

    let parameters = RunParameters {
        sentences_written: sentence_csv.display().to_string(),
        person_count: distinct(&sentence_rows, |s| &s.person_id),
        document_count: distinct(&sentence_rows, |s| &s.document_id),
        sentence_count: distinct(&sentence_rows, |s| &s.sentence_id),
        model_input_created: true,
        classification_run: true,
        output_prepared: true,
        anon_mask,
    };
    info!(?parameters, problems = problems.len(), "pipeline finished");
    Ok(PipelineOutput {
        parameters,
        chunks,
        run,
        problems,
        predictions: records,
    })
}

fn distinct<'a>(
    rows: &'a [SentenceRecord],
    field: impl Fn(&'a SentenceRecord) -> &'a String,
) -> usize {
    rows.iter().map(field).collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_flags() {
        for value in ["true", "TRUE", "1", "t", "Y", "yes"] {
            assert!(parse_flag(value), "{value}");
        }
        for value in ["false", "0", "no", "", "on"] {
            assert!(!parse_flag(value), "{value}");
        }
    }

    #[test]
    fn notes_require_response_column() {
        let err = parse_notes(b"PersonID,date,DocumentID,text\n1,2020,d1,hi\n").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumns { .. }));
    }
}
