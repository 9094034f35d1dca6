//! CLI entry-point for classifying pending chunks.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{error_log::ErrorLog, store::FsChunkStore},
    nlp::model,
    pipeline::{ClassifierRunner, RunOptions},
};

/// Args for the `classify` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Reclassify from chunk zero.
    #[arg(long)]
    pub overwrite: bool,
    /// Also retry chunks that previously failed.
    #[arg(long)]
    pub retry_failed: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let model = model::load_model(&settings)?;
    let input = FsChunkStore::new(settings.chunks_dir());
    let output = FsChunkStore::new(settings.classified_dir());
    let errors = ErrorLog::new(settings.errors_dir());
    let report = ClassifierRunner::new(&input, &output, &errors, model.as_ref()).run(RunOptions {
        overwrite: args.overwrite,
        retry_failed: args.retry_failed,
    })?;
    if report.failed() > 0 {
        info!(log = %errors.detail_log().display(), "see exception log for failed chunks");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
