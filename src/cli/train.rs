//! CLI entry-point for fitting the sentence classifier.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    nlp::train::{self, TrainOptions},
};

/// Args for the `train` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// CSV with `sentence_text` and `label` (0 or 1) columns.
    #[arg(long)]
    pub input: PathBuf,
    /// Vocabulary entries kept as features.
    #[arg(long, default_value_t = 2000)]
    pub vocab_size: usize,
    /// Fraction of rows held out for accuracy reporting.
    #[arg(long, default_value_t = 0.2)]
    pub holdout: f64,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    #[arg(long, default_value_t = 150)]
    pub max_iterations: u64,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let examples = train::read_examples(&args.input)?;
    let (model, report) = train::fit(
        examples,
        TrainOptions {
            vocab_size: args.vocab_size,
            holdout: args.holdout,
            seed: args.seed,
            max_iterations: args.max_iterations,
            max_tokens: settings.max_tokens,
        },
    )?;
    model.save(&settings.model_path)?;
    info!(path = %settings.model_path.display(), ?report, "model written");
    Ok(())
}
