//! CLI entry-point for writing model-input chunks.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{
        chunker::{self, ChunkerOptions},
        store::FsChunkStore,
    },
};

/// Args for the `chunk` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Sentence CSV; defaults to the configured sentence table.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Override the configured chunk size.
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Replace chunks already on disk.
    #[arg(long)]
    pub overwrite: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let input = args.input.unwrap_or_else(|| settings.sentence_csv());
    let store = FsChunkStore::new(settings.chunks_dir());
    let summary = chunker::create_model_input(
        &input,
        &store,
        ChunkerOptions {
            chunk_size: args.chunk_size.unwrap_or(settings.chunk_size),
            overwrite: args.overwrite,
        },
    )?;
    info!(
        chunks = summary.chunks(),
        sentences = summary.sentences(),
        dropped = summary.dropped_missing,
        dir = %store.dir().display(),
        "chunks written"
    );
    Ok(())
}
