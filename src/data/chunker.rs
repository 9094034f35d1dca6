//! Turn the sentence table into numbered model-input chunks.

use std::{collections::BTreeMap, path::Path};

use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    data::{
        records::ChunkSentence,
        store::{self, ChunkStore},
    },
    errors::{PipelineError, PipelineResult},
};

/// Columns the chunker requires in its input table.
pub const CHUNK_COLUMNS: [&str; 4] = ["PersonID", "DocumentID", "SentenceID", "sentence_text"];

/// Cell values treated as missing text, mirroring the usual CSV NA markers.
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, Copy)]
pub struct ChunkerOptions {
    pub chunk_size: usize,
    pub overwrite: bool,
}

/// What a chunking pass read and wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkSummary {
    pub rows_read: usize,
    pub dropped_missing: usize,
    pub chunk_sizes: Vec<usize>,
}

impl ChunkSummary {
    pub fn chunks(&self) -> usize {
        self.chunk_sizes.len()
    }

    pub fn sentences(&self) -> usize {
        self.chunk_sizes.iter().sum()
    }
}

/// Read `csv_path`, validate it and write its rows to `store` in chunks.
pub fn create_model_input(
    csv_path: &Path,
    store: &dyn ChunkStore,
    options: ChunkerOptions,
) -> PipelineResult<ChunkSummary> {
    if options.chunk_size == 0 {
        return Err(PipelineError::InvalidChunkSize);
    }
    let (rows, rows_read, dropped_missing) = read_sentences(csv_path)?;
    if rows.is_empty() {
        return Err(PipelineError::NoSentences);
    }

    prepare_store(store, options.overwrite)?;

    let chunks = split_into_chunks(rows, options.chunk_size);
    let chunk_sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    info!(
        chunks = chunks.len(),
        rows_per_chunk = ?size_histogram(&chunk_sizes),
        "file chunked; saving chunks"
    );
    for (index, chunk) in chunks.iter().enumerate() {
        store::write_json(store, index, chunk)?;
    }

    Ok(ChunkSummary {
        rows_read,
        dropped_missing,
        chunk_sizes,
    })
}

/// Refuse to mix runs: an occupied store is only cleared when overwriting.
fn prepare_store(store: &dyn ChunkStore, overwrite: bool) -> PipelineResult<()> {
    let existing = store.indices()?;
    if existing.is_empty() {
        return Ok(());
    }
    if !overwrite {
        return Err(PipelineError::OutputConflict {
            location: store.locate(existing[0]),
            existing: existing.len(),
        });
    }
    let removed = store.clear()?;
    info!(removed, "overwrite set; removed previous chunks");
    Ok(())
}

fn read_sentences(csv_path: &Path) -> PipelineResult<(Vec<ChunkSentence>, usize, usize)> {
    if !csv_path.exists() {
        return Err(PipelineError::MissingInput(csv_path.to_path_buf()));
    }
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(csv_path)?;
    let positions = column_positions(reader.byte_headers()?, &CHUNK_COLUMNS)?;

    let mut rows = Vec::new();
    let mut rows_read = 0usize;
    let mut dropped = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        rows_read += 1;
        let row = rows_read;
        let raw_text = record.get(positions[3]).unwrap_or_default();
        if NA_VALUES.iter().any(|na| na.as_bytes() == raw_text) {
            dropped.push(row);
            continue;
        }
        let cell = |pos: usize, column: &str| -> PipelineResult<String> {
            let bytes = record.get(pos).unwrap_or_default();
            String::from_utf8(bytes.to_vec()).map_err(|_| PipelineError::NotText {
                row,
                column: column.to_string(),
            })
        };
        rows.push(ChunkSentence {
            person_id: cell(positions[0], CHUNK_COLUMNS[0])?,
            document_id: cell(positions[1], CHUNK_COLUMNS[1])?,
            sentence_id: cell(positions[2], CHUNK_COLUMNS[2])?,
            sentence_text: cell(positions[3], CHUNK_COLUMNS[3])?,
        });
    }

    if dropped.is_empty() {
        info!(rows = rows_read, "file read; no missing sentences");
    } else {
        warn!(
            removed = dropped.len(),
            rows = ?dropped,
            "removing sentences with missing text prior to classification"
        );
    }
    Ok((rows, rows_read, dropped.len()))
}

/// Locate `expected` columns in a header row.
pub(crate) fn column_positions(
    headers: &ByteRecord,
    expected: &[&str],
) -> PipelineResult<Vec<usize>> {
    let mut positions = Vec::with_capacity(expected.len());
    let mut missing = Vec::new();
    for column in expected {
        match headers.iter().position(|h| h == column.as_bytes()) {
            Some(pos) => positions.push(pos),
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            expected: expected.iter().map(|c| c.to_string()).collect(),
            missing,
        });
    }
    Ok(positions)
}

/// Split `rows` into `ceil(len / max_size)` contiguous chunks whose sizes
/// differ by at most one, larger chunks first.
pub fn split_into_chunks<T>(rows: Vec<T>, max_size: usize) -> Vec<Vec<T>> {
    if rows.is_empty() || max_size == 0 {
        return Vec::new();
    }
    let total = rows.len();
    let num_chunks = total.div_ceil(max_size);
    let base = total / num_chunks;
    let extra = total % num_chunks;

    let mut chunks = Vec::with_capacity(num_chunks);
    let mut iter = rows.into_iter();
    for idx in 0..num_chunks {
        let size = if idx < extra { base + 1 } else { base };
        chunks.push(iter.by_ref().take(size).collect());
    }
    chunks
}

fn size_histogram(sizes: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for size in sizes {
        *counts.entry(*size).or_insert(0) += 1;
    }
    counts
}
