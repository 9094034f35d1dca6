use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("note-classifier").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn classify_without_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("note-classifier").expect("binary exists");
    cmd.env("DATA_DIR", dir.path().join("data"))
        .env("OUTPUTS_DIR", dir.path().join("out"))
        .env("MODEL_PATH", dir.path().join("missing.json"))
        .arg("classify")
        .assert()
        .failure();
}
