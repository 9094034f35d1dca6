//! Log output for the pipeline and the upload server.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directives used when `RUST_LOG` is unset: pipeline stages at `info`,
/// request spans from the HTTP layer included.
const DEFAULT_DIRECTIVES: &str = "info,note_classifier=info,tower_http=info";

/// Route `tracing` events to stderr with UTC timestamps. A second call is a no-op.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVES)?,
    };

    // stdout is reserved for command output such as JSON run reports
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_layer).try_init()?;
    tracing::debug!(directives = DEFAULT_DIRECTIVES, "logging ready");
    Ok(())
}
