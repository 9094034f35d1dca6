//! Stage wiring shared by the HTTP service and the CLI.

pub mod orchestrate;
pub mod runner;

pub use orchestrate::{parse_flag, parse_notes, run_pipeline, PipelineContext, PipelineOutput};
pub use runner::{ChunkOutcome, ClassifierRunner, RunOptions, RunReport};
