//! Sentence tables, chunk storage and output assembly.

pub mod assemble;
pub mod chunker;
pub mod error_log;
pub mod records;
pub mod store;

use std::{fs, path::Path};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::errors::{PipelineError, PipelineResult};
use records::SentenceRecord;

/// Header of the sentence table, in `SentenceRecord` field order.
pub const SENTENCE_COLUMNS: [&str; 5] = [
    "PersonID",
    "date",
    "DocumentID",
    "SentenceID",
    "sentence_text",
];

/// Write the sentence table that feeds the chunker and the final join.
pub fn write_sentence_csv(path: &Path, sentences: &[SentenceRecord]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(SENTENCE_COLUMNS)?;
    for sentence in sentences {
        writer.serialize(sentence)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = sentences.len(), "wrote sentence table");
    Ok(())
}

/// Read a sentence table back; the `date` column is optional.
pub fn read_sentence_csv(path: &Path) -> PipelineResult<Vec<SentenceRecord>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    chunker::column_positions(reader.byte_headers()?, &chunker::CHUNK_COLUMNS)?;
    let mut out = Vec::new();
    for result in reader.deserialize::<SentenceRecord>() {
        out.push(result?);
    }
    Ok(out)
}
