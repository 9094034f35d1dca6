//! Sub-commands for running pipeline stages individually or end to end.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod assemble;
pub mod chunk;
pub mod classify;
pub mod run;
pub mod serve;
pub mod status;
pub mod train;

#[derive(Debug, Parser)]
#[command(author, version, about = "Chunked sentence classification for free-text notes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Run the chosen stage against the directories in `settings`.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Serve(args) => serve::run(args, settings).await,
            Commands::Run(args) => run::run(args, settings).await,
            Commands::Chunk(args) => chunk::run(args, settings).await,
            Commands::Classify(args) => classify::run(args, settings).await,
            Commands::Assemble(args) => assemble::run(args, settings).await,
            Commands::Status => status::run(settings).await,
            Commands::Train(args) => train::run(args, settings).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the upload API.
    Serve(serve::Args),
    /// Mask, split, chunk, classify and assemble a notes CSV in one go.
    Run(run::Args),
    /// Write model-input chunks from a sentence CSV.
    Chunk(chunk::Args),
    /// Classify every chunk not yet classified.
    Classify(classify::Args),
    /// Merge classified chunks back onto the sentence table.
    Assemble(assemble::Args),
    /// Show per-chunk completion status.
    Status,
    /// Fit the sentence classifier from labelled sentences.
    Train(train::Args),
}
