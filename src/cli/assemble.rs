//! CLI entry-point for assembling the labelled output.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{self, assemble, store::FsChunkStore},
};

/// Args for the `assemble` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Sentence CSV to join onto; defaults to the configured sentence table.
    #[arg(long)]
    pub sentences: Option<PathBuf>,
    /// Output JSON path; defaults to the configured output.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let sentences_path = args.sentences.unwrap_or_else(|| settings.sentence_csv());
    let out_path = args.output.unwrap_or_else(|| settings.output_json());
    let sentences = data::read_sentence_csv(&sentences_path)?;
    let classified = FsChunkStore::new(settings.classified_dir());
    let assembly = assemble::prepare_output(&classified, &sentences, &out_path)?;
    info!(
        rows = assembly.records.len(),
        problems = assembly.problems.len(),
        path = %out_path.display(),
        "output prepared"
    );
    Ok(())
}
