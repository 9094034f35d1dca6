//! CLI entry-point for an offline end-to-end run over a notes CSV.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    nlp::{mask::AnonMask, model, sentences::RuleSplitter},
    pipeline::{self, PipelineContext},
};

/// Args for the `run` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Notes CSV with PersonID, date, DocumentID and response columns.
    #[arg(long)]
    pub input: PathBuf,
    /// JSON object of phrase to replacement token.
    #[arg(long)]
    pub mask: Option<PathBuf>,
    /// Replace existing chunks and results.
    #[arg(long)]
    pub overwrite: bool,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let notes = pipeline::parse_notes(&bytes)?;
    let mask_path = args.mask.as_deref().or(settings.anon_mask_path.as_deref());
    let anon_mask = AnonMask::load_or_default(mask_path)?;
    let ctx = PipelineContext {
        model: model::load_model(&settings)?,
        splitter: Arc::new(RuleSplitter),
        settings,
    };
    let output = pipeline::run_pipeline(&ctx, &notes, anon_mask, args.overwrite)?;
    info!(
        sentences = output.parameters.sentence_count,
        classified = output.run.classified(),
        failed = output.run.failed(),
        problems = output.problems.len(),
        path = %ctx.settings.output_json().display(),
        "run complete"
    );
    Ok(())
}
