use std::{fs, path::Path};

use note_classifier::{
    data::{
        chunker::{create_model_input, split_into_chunks, ChunkerOptions},
        records::ChunkSentence,
        store::{ChunkStore, FsChunkStore, MemoryChunkStore},
    },
    errors::PipelineError,
};
use proptest::prelude::*;

const HEADER: &str = "PersonID,DocumentID,SentenceID,sentence_text\n";

fn write_csv(dir: &Path, rows: usize) -> std::path::PathBuf {
    let mut body = String::from(HEADER);
    for i in 0..rows {
        body.push_str(&format!("p{},d{},d{}_0,sentence number {i}\n", i % 3, i, i));
    }
    let path = dir.join("sentences.csv");
    fs::write(&path, body).unwrap();
    path
}

fn options(chunk_size: usize, overwrite: bool) -> ChunkerOptions {
    ChunkerOptions {
        chunk_size,
        overwrite,
    }
}

#[test]
fn writes_ceil_n_over_c_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), 250);
    let store = FsChunkStore::new(dir.path().join("chunks"));

    let summary = create_model_input(&csv, &store, options(100, false)).unwrap();

    assert_eq!(summary.chunk_sizes, vec![84, 83, 83]);
    assert_eq!(store.indices().unwrap(), vec![0, 1, 2]);
    let total: usize = (0..3)
        .map(|i| {
            serde_json::from_slice::<Vec<ChunkSentence>>(&store.read(i).unwrap())
                .unwrap()
                .len()
        })
        .sum();
    assert_eq!(total, 250);
    assert!(dir.path().join("chunks/2.json").exists());
}

#[test]
fn drops_rows_without_text() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("in.csv");
    fs::write(
        &csv,
        format!("{HEADER}p1,d1,d1_0,hello\np1,d1,d1_1,\np1,d1,d1_2,NA\np1,d1,d1_3,world\n"),
    )
    .unwrap();
    let store = MemoryChunkStore::new();

    let summary = create_model_input(&csv, &store, options(10, false)).unwrap();

    assert_eq!(summary.rows_read, 4);
    assert_eq!(summary.dropped_missing, 2);
    assert_eq!(summary.sentences(), 2);
}

#[test]
fn refuses_to_overwrite_without_flag() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), 5);
    let store = MemoryChunkStore::new();
    create_model_input(&csv, &store, options(2, false)).unwrap();

    let err = create_model_input(&csv, &store, options(2, false)).unwrap_err();
    assert!(matches!(err, PipelineError::OutputConflict { existing: 3, .. }));
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

    let summary = create_model_input(&csv, &store, options(5, true)).unwrap();
    assert_eq!(summary.chunks(), 1);
    assert_eq!(store.indices().unwrap(), vec![0]);
}

#[test]
fn missing_columns_abort_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("in.csv");
    fs::write(&csv, "PersonID,DocumentID,text\np1,d1,hello\n").unwrap();
    let store = MemoryChunkStore::new();

    let err = create_model_input(&csv, &store, options(10, false)).unwrap_err();
    match err {
        PipelineError::MissingColumns { missing, .. } => {
            assert_eq!(missing, vec!["SentenceID", "sentence_text"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(store.indices().unwrap().is_empty());
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryChunkStore::new();
    let err =
        create_model_input(&dir.path().join("nope.csv"), &store, options(10, false)).unwrap_err();
    assert!(matches!(err, PipelineError::MissingInput(_)));
}

#[test]
fn non_text_values_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("in.csv");
    let mut body = format!("{HEADER}p1,d1,d1_0,fine\np1,d1,d1_1,").into_bytes();
    body.extend_from_slice(&[0xff, 0xfe, b'\n']);
    fs::write(&csv, body).unwrap();
    let store = MemoryChunkStore::new();

    let err = create_model_input(&csv, &store, options(10, false)).unwrap_err();
    assert!(matches!(err, PipelineError::NotText { row: 2, .. }));
    assert!(store.indices().unwrap().is_empty());
}

proptest! {
    #[test]
    fn partition_covers_every_row(rows in 1usize..500, max in 1usize..60) {
        let chunks = split_into_chunks((0..rows).collect::<Vec<_>>(), max);
        prop_assert_eq!(chunks.len(), rows.div_ceil(max));
        prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= max));
        let largest = chunks.iter().map(Vec::len).max().unwrap();
        let smallest = chunks.iter().map(Vec::len).min().unwrap();
        prop_assert!(largest - smallest <= 1);
        let flat: Vec<usize> = chunks.into_iter().flatten().collect();
        prop_assert_eq!(flat, (0..rows).collect::<Vec<_>>());
    }
}
