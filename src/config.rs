//! Runtime configuration utilities for note-classifier.

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder for chunk directories and error logs.
    pub data_dir: PathBuf,
    /// Root folder for the sentence table and the final labelled output.
    pub outputs_dir: PathBuf,
    /// Maximum sentences written to a single chunk.
    pub chunk_size: usize,
    /// Location of the linear model weights.
    pub model_path: PathBuf,
    /// Tokens kept per sentence before scoring.
    pub max_tokens: usize,
    /// Optional JSON file replacing the built-in anon mask.
    pub anon_mask_path: Option<PathBuf>,
    /// Upper bound on multipart upload bodies.
    pub max_upload_bytes: usize,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./csv_out"));
        let chunk_size = env::var("CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./model/classifier.json"));
        let max_tokens = env::var("MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(512);
        let anon_mask_path = env::var("ANON_MASK_PATH").ok().map(PathBuf::from);
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(64 * 1024 * 1024);

        let settings = Self {
            data_dir,
            outputs_dir,
            chunk_size,
            model_path,
            max_tokens,
            anon_mask_path,
            max_upload_bytes,
        };
        settings.ensure_dirs()?;
        Ok(settings)
    }

    /// Default layout rooted under `root`, used by tests and scratch runs.
    pub fn rooted<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let settings = Self {
            data_dir: root.join("data"),
            outputs_dir: root.join("csv_out"),
            chunk_size: 100,
            model_path: root.join("model/classifier.json"),
            max_tokens: 512,
            anon_mask_path: None,
            max_upload_bytes: 64 * 1024 * 1024,
        };
        settings.ensure_dirs()?;
        Ok(settings)
    }

    fn ensure_dirs(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir).context("creating data dir")?;
        std::fs::create_dir_all(&self.outputs_dir).context("creating outputs dir")?;
        Ok(())
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }

    /// Directory holding unclassified sentence chunks.
    pub fn chunks_dir(&self) -> PathBuf {
        self.join_data("chunks_for_model")
    }

    /// Directory holding classified chunks and tombstones.
    pub fn classified_dir(&self) -> PathBuf {
        self.join_data("classified_chunks")
    }

    pub fn errors_dir(&self) -> PathBuf {
        self.join_data("errors")
    }

    pub fn sentence_csv(&self) -> PathBuf {
        self.join_output("sentence_df.csv")
    }

    pub fn output_json(&self) -> PathBuf {
        self.join_output("classified_sentences.json")
    }
}
