mod common;

use common::{seed_chunks, sentence, KeywordClassifier};
use note_classifier::{
    data::{
        assemble::{assemble, prepare_output},
        error_log::ErrorLog,
        records::{ClassifiedSentence, SentenceRecord},
        store::{ChunkStore, MemoryChunkStore},
    },
    errors::PipelineError,
    pipeline::{ClassifierRunner, RunOptions},
};

fn table() -> Vec<SentenceRecord> {
    ["Neck pain today.", "Walked the dog.", "Boom box noise."]
        .iter()
        .enumerate()
        .map(|(idx, text)| SentenceRecord {
            person_id: "p1".into(),
            date: Some("2021-03-04".into()),
            document_id: "d1".into(),
            sentence_id: format!("d1_{idx}"),
            sentence_text: (*text).into(),
        })
        .collect()
}

#[test]
fn every_sentence_is_returned_when_no_chunk_is_a_problem() {
    let dir = tempfile::tempdir().unwrap();
    let input = MemoryChunkStore::new();
    let output = MemoryChunkStore::new();
    seed_chunks(
        &input,
        &[
            vec![sentence("d1", 0, "Neck pain today."), sentence("d1", 1, "Walked the dog.")],
            vec![sentence("d1", 2, "Boom box noise.")],
        ],
    );
    ClassifierRunner::new(&input, &output, &ErrorLog::new(dir.path()), &KeywordClassifier)
        .run(RunOptions::default())
        .unwrap();

    let assembly = assemble(&output, &table()).unwrap();

    assert!(assembly.problems.is_empty());
    assert_eq!(assembly.records.len(), 3);
    let ids: Vec<&str> = assembly.records.iter().map(|r| r.sentence_id.as_str()).collect();
    assert_eq!(ids, vec!["d1_0", "d1_1", "d1_2"]);
    assert_eq!(assembly.records[0].prediction, Some(1));
    assert_eq!(assembly.records[1].prediction, Some(0));
    let p = &assembly.records[0];
    assert!((p.proba_0.unwrap() + p.proba_1.unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn tombstones_are_problems_and_leave_null_predictions() {
    let output = MemoryChunkStore::new();
    output
        .write(
            0,
            br#"[{"PersonID":"p1","DocumentID":"d1","SentenceID":"d1_0","prediction":1,"proba":[0.2,0.8]}]"#,
        )
        .unwrap();
    output.write(1, b"").unwrap();

    let assembly = assemble(&output, &table()).unwrap();

    assert_eq!(assembly.problems, vec!["memory://1".to_string()]);
    assert_eq!(assembly.records.len(), 3);
    assert_eq!(assembly.records[0].proba_1, Some(0.8));
    let missing: &ClassifiedSentence = &assembly.records[2];
    assert_eq!(missing.prediction, None);
    assert_eq!(missing.proba_0, None);
    assert_eq!(missing.proba_1, None);
    assert_eq!(missing.sentence_text, "Boom box noise.");
}

#[test]
fn out_of_range_prediction_is_fatal() {
    let output = MemoryChunkStore::new();
    output
        .write(
            0,
            br#"[{"PersonID":"p1","DocumentID":"d1","SentenceID":"d1_0","prediction":2,"proba":[0.5,0.5]}]"#,
        )
        .unwrap();

    let err = assemble(&output, &table()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidPrediction { ref sentence_id, ref value, .. }
            if sentence_id == "d1_0" && value == "2"
    ));
}

#[test]
fn output_is_persisted_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = MemoryChunkStore::new();
    output.write(0, b"[]").unwrap();
    let path = dir.path().join("out/classified_sentences.json");

    let assembly = prepare_output(&output, &table(), &path).unwrap();

    let written: Vec<ClassifiedSentence> =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written, assembly.records);
    assert!(written.iter().all(|r| r.prediction.is_none()));
}
