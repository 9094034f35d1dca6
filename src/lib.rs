//! Chunked, resumable sentence classification for free-text notes.
//!
//! Notes are masked, split into sentences, written as numbered chunks,
//! classified chunk by chunk and finally joined back onto the sentence
//! table. See the `pipeline` module for the stage wiring.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod errors;
pub mod logging;
pub mod nlp;
pub mod pipeline;
