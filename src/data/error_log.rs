//! Append-only failure logs and per-chunk completion status.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::warn;

use crate::{
    data::{records::ClassificationResult, store::ChunkStore},
    errors::PipelineResult,
};

const INDEX_LOG: &str = "chunk_num.log";
const DETAIL_LOG: &str = "exception_details.log";
const LINE_WIDTH: usize = 80;

/// Pair of logs recording which chunks failed and why.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn index_log(&self) -> PathBuf {
        self.dir.join(INDEX_LOG)
    }

    pub fn detail_log(&self) -> PathBuf {
        self.dir.join(DETAIL_LOG)
    }

    /// Append one entry to both logs.
    pub fn record(&self, index: usize, message: &str) -> PipelineResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut index_log = append(&self.index_log())?;
        writeln!(index_log, "{index}")?;

        let mut details = append(&self.detail_log())?;
        write!(
            details,
            "{index}:\n    {message}\n{}\n\n\n",
            "-".repeat(LINE_WIDTH)
        )?;
        Ok(())
    }

    /// Indices listed in the index log, in the order they failed.
    pub fn failed_indices(&self) -> PipelineResult<Vec<usize>> {
        let path = self.index_log();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut indices = Vec::new();
        for line in fs::read_to_string(&path)?.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse() {
                Ok(index) => indices.push(index),
                Err(_) => warn!(%line, "unreadable entry in chunk index log"),
            }
        }
        Ok(indices)
    }
}

fn append(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Completion state of one input chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStatus {
    Pending,
    Done,
    Failed,
}

/// Status of every input chunk, derived from the stores and the error log.
pub fn chunk_status(
    input: &dyn ChunkStore,
    output: &dyn ChunkStore,
    log: &ErrorLog,
) -> PipelineResult<Vec<(usize, ChunkStatus)>> {
    let finished = output.indices()?;
    let logged = log.failed_indices()?;
    let mut statuses = Vec::new();
    for index in input.indices()? {
        let status = if !finished.contains(&index) {
            ChunkStatus::Pending
        } else if holds_results(output, index) {
            ChunkStatus::Done
        } else {
            if !logged.contains(&index) {
                warn!(index, "unreadable result without a logged failure");
            }
            ChunkStatus::Failed
        };
        statuses.push((index, status));
    }
    Ok(statuses)
}

fn holds_results(output: &dyn ChunkStore, index: usize) -> bool {
    output
        .read(index)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Vec<ClassificationResult>>(&bytes).ok())
        .is_some()
}
