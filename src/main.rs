//! `note-classifier` binary: parse arguments, then hand off to the library.

use anyhow::Result;
use clap::Parser;
use note_classifier::{cli::Cli, config::Settings, logging};
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing()?;
    let settings = Settings::load()?;

    info!(command = ?cli.command, data_dir = %settings.data_dir.display(), "running");
    cli.dispatch(settings).await
}
