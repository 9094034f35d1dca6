//! CLI entry-point for serving the upload API.

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    api::{self, AppState},
    config::Settings,
    nlp::model,
};

/// Run the Axum server.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Port to bind (default 8080).
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Host address, defaults to localhost.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let model = model::load_model(&settings)?;
    let state = AppState::new(settings, model)?;
    api::serve(state, args.host, args.port).await
}
