//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MCQ_CSV: &str = "Question,A,B,C,D,Answer\n\
                       She ___ to school every day.,go,goes,going,gone,b\n\
                       They ___ finished.,has,have,having,is,B\n\
                       I ___ a book yesterday.,read,reads,reading,readed,a\n";

/// A `qbank` command isolated in `dir`: its own store, config and reports.
fn qbank(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("qbank").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("QBANK_STORE_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    std::fs::write(dir.path().join(name), contents).unwrap();
    name.to_string()
}

fn create_topic(dir: &TempDir, module: &str, name: &str) -> String {
    let out = qbank(dir)
        .args(["topic", "create", "--module", module, "--name", name])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    stdout.trim().rsplit(' ').next().unwrap().to_string()
}

#[test]
fn template_mcq() {
    let dir = TempDir::new().unwrap();
    qbank(&dir)
        .args(["template", "--type", "mcq"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Question,A,B,C,D,Answer"));
}

#[test]
fn template_coding_has_requested_groups() {
    let dir = TempDir::new().unwrap();
    qbank(&dir)
        .args(["template", "--type", "compiler", "--test-cases", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TestCase3IsSample"))
        .stdout(predicate::str::contains("TestCase4Input").not());
}

#[test]
fn init_creates_config_and_templates() {
    let dir = TempDir::new().unwrap();
    qbank(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created qbank.toml"));
    assert!(dir.path().join("qbank.toml").exists());
    assert!(dir.path().join("templates/mcq.csv").exists());
    assert!(dir.path().join("templates/coding.csv").exists());

    qbank(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));

    // The generated config is loadable.
    qbank(&dir).arg("modules").assert().success();
}

#[test]
fn modules_lists_catalog() {
    let dir = TempDir::new().unwrap();
    qbank(&dir)
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("GRAMMAR"))
        .stdout(predicate::str::contains("CRT_TECHNICAL"))
        .stdout(predicate::str::contains("compiler"));
}

#[test]
fn ingest_then_reingest_reports_duplicates() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "grammar.csv", MCQ_CSV);

    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("total 3, valid 3, duplicate 0, invalid 0"));

    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--file", &file])
        .args(["--report", "none"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid 0, duplicate 3"));

    let reports: Vec<_> = std::fs::read_dir(dir.path().join("qbank-reports"))
        .unwrap()
        .collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn validate_reports_bad_rows_without_storing() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "bad.csv",
        "Question,A,B,C,D,Answer\nGood one?,1,2,3,4,A\nBad answer?,1,2,3,4,E\n",
    );

    qbank(&dir)
        .args(["validate", "--module", "GRAMMAR", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid 1"))
        .stdout(predicate::str::contains("A, B, C, D"))
        .stdout(predicate::str::contains("(dry run)"));

    qbank(&dir)
        .args(["export", "--module", "GRAMMAR"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Good one?").not());
}

#[test]
fn unknown_extension_needs_format() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "questions.txt", MCQ_CSV);

    qbank(&dir)
        .args(["validate", "--module", "GRAMMAR", "--file", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));

    qbank(&dir)
        .args(["validate", "--module", "GRAMMAR", "--file", &file])
        .args(["--format", "csv"])
        .assert()
        .success();
}

#[test]
fn assemble_commit_and_usage() {
    let dir = TempDir::new().unwrap();
    let topic = create_topic(&dir, "GRAMMAR", "Tenses");
    let file = write(&dir, "grammar.csv", MCQ_CSV);

    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--topic", &topic, "--file", &file])
        .assert()
        .success();

    qbank(&dir)
        .args(["assemble", "--module", "GRAMMAR", "--topic", &topic])
        .args(["--count", "2", "--seed", "7", "--output", "selection.json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("first_time"));

    let selection: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("selection.json")).unwrap())
            .unwrap();
    assert_eq!(selection["items"].as_array().unwrap().len(), 2);

    qbank(&dir)
        .args(["commit", "--selection", "selection.json"])
        .args(["--batch", "2026-A", "--course", "ENG101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed 2 question(s)"))
        .stdout(predicate::str::contains("66.7%"));

    qbank(&dir)
        .args(["usage", "--topic", &topic, "--batch", "2026-A", "--course", "ENG101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tenses"))
        .stdout(predicate::str::contains("66.7%"));

    qbank(&dir)
        .args(["usage", "--module", "GRAMMAR", "--batch", "2026-B", "--course", "ENG101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.0%"));
}

#[test]
fn assemble_more_than_available_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "grammar.csv", MCQ_CSV);
    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--file", &file, "--report", "none"])
        .assert()
        .success();

    qbank(&dir)
        .args(["assemble", "--module", "GRAMMAR", "--count", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "insufficient questions: 3 available, 4 requested",
        ));
}

#[test]
fn topic_lifecycle() {
    let dir = TempDir::new().unwrap();
    let topic = create_topic(&dir, "VOCABULARY", "Synonyms");

    qbank(&dir)
        .args(["topic", "create", "--module", "VOCABULARY", "--name", "SYNONYMS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    qbank(&dir)
        .args(["topic", "rename", "--id", &topic, "--name", "Antonyms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("'Antonyms'"));

    qbank(&dir)
        .args(["topic", "list", "--module", "VOCABULARY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Antonyms"));

    qbank(&dir)
        .args(["topic", "delete", "--id", &topic])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    qbank(&dir)
        .args(["topic", "delete", "--id", &topic, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 question(s)"));

    qbank(&dir)
        .args(["topic", "list", "--module", "VOCABULARY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No topics"));
}

#[test]
fn export_roundtrips_through_ingest() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "grammar.csv", MCQ_CSV);
    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--file", &file, "--report", "none"])
        .assert()
        .success();

    qbank(&dir)
        .args(["export", "--module", "GRAMMAR", "--output", "export.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported 3 question(s)"));

    qbank(&dir)
        .args(["validate", "--module", "GRAMMAR", "--file", "export.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate 3"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    qbank(&dir)
        .args(["--config", "nope.toml", "modules"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn memory_store_config_keeps_nothing() {
    let dir = TempDir::new().unwrap();
    write(&dir, "qbank.toml", "[store]\ntype = \"memory\"\n");
    let file = write(&dir, "grammar.csv", MCQ_CSV);

    qbank(&dir)
        .args(["ingest", "--module", "GRAMMAR", "--file", &file, "--report", "none"])
        .assert()
        .success();
    assert!(!dir.path().join("qbank-data").exists());
}
