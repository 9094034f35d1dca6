//! Typed failures raised by the chunking, classification and assembly stages.

use std::{io, path::PathBuf};

use axum::http::StatusCode;
use thiserror::Error;

/// Error type shared by every pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("expecting file {0}; file does not exist")]
    MissingInput(PathBuf),
    #[error("expecting columns {expected:?}; missing {missing:?}")]
    MissingColumns {
        expected: Vec<String>,
        missing: Vec<String>,
    },
    #[error("value in column '{column}' at row {row} could not be converted to text")]
    NotText { row: usize, column: String },
    #[error("no sentences left to classify")]
    NoSentences,
    #[error(
        "{existing} chunk files already present in {location} and overwrite is not set"
    )]
    OutputConflict { location: String, existing: usize },
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    #[error(
        "incorrect classification {value} (must be 0 or 1) for PersonID {person_id}, DocumentID {document_id}, SentenceID {sentence_id}"
    )]
    InvalidPrediction {
        person_id: String,
        document_id: String,
        sentence_id: String,
        value: String,
    },
    #[error("unreadable notes upload: {0}")]
    BadUpload(String),
    #[error("invalid anon mask: {0}")]
    InvalidMask(String),
    #[error("model weights not found at {0}")]
    ModelUnavailable(PathBuf),
    #[error("model failure: {0}")]
    Model(String),
    #[error("training failure: {0}")]
    Training(String),
    #[error("chunk store failure: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// HTTP status reported when this error aborts an upload.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingInput(_)
            | Self::MissingColumns { .. }
            | Self::NotText { .. }
            | Self::NoSentences
            | Self::BadUpload(_)
            | Self::InvalidMask(_) => StatusCode::BAD_REQUEST,
            Self::OutputConflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_side_failures_are_internal_errors() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            PipelineError::Csv(csv::Error::from(io)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::InvalidChunkSize.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PipelineError::BadUpload("bad quoting".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
