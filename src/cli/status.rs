//! CLI entry-point for reporting per-chunk progress.

use anyhow::Result;
use tracing::instrument;

use crate::{
    config::Settings,
    data::{
        error_log::{chunk_status, ChunkStatus, ErrorLog},
        store::FsChunkStore,
    },
};

#[instrument(skip(settings))]
pub async fn run(settings: Settings) -> Result<()> {
    let input = FsChunkStore::new(settings.chunks_dir());
    let output = FsChunkStore::new(settings.classified_dir());
    let errors = ErrorLog::new(settings.errors_dir());
    let statuses = chunk_status(&input, &output, &errors)?;

    let (mut pending, mut done, mut failed) = (0, 0, 0);
    for (index, status) in &statuses {
        match status {
            ChunkStatus::Pending => pending += 1,
            ChunkStatus::Done => done += 1,
            ChunkStatus::Failed => failed += 1,
        }
        println!("{index:>6}  {status:?}");
    }
    println!("done {done}, failed {failed}, pending {pending}");
    Ok(())
}
