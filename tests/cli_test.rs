//! Runs CLI commands against a temporary state file.

use std::fs;

use bayesian::cli::{BayesianArgs, execute_command};
use bayesian::prelude::*;
use clap::Parser;
use tempfile::TempDir;

fn run(args: &[&str]) -> Result<()> {
    let mut argv = vec!["bayesian", "--quiet", "--format", "json"];
    argv.extend_from_slice(args);
    let args = BayesianArgs::try_parse_from(argv).expect("arguments should parse");
    execute_command(args)
}

#[test]
fn test_train_export_import_round_trip() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("model.json");
    let samples = temp_dir.path().join("samples.jsonl");
    let snapshot = temp_dir.path().join("snapshot.json");
    let copy = temp_dir.path().join("copy.json");

    fs::write(
        &samples,
        concat!(
            "{\"input\": \"cheap replica watches\", \"output\": true}\n",
            "{\"input\": \"I don't know if this works on windows replica\", \"output\": false}\n",
        ),
    )?;

    let state_arg = state.to_str().unwrap();
    run(&["train", state_arg, samples.to_str().unwrap(), "--batch-size", "1"])?;
    run(&["classify", state_arg, "free watches", "--explain"])?;
    run(&["test", state_arg, samples.to_str().unwrap()])?;
    run(&["stats", state_arg])?;
    run(&["export", state_arg, "--output", snapshot.to_str().unwrap()])?;
    run(&["import", copy.to_str().unwrap(), snapshot.to_str().unwrap()])?;

    let original = FileBackend::open(&state)?.export_state()?;
    let imported = FileBackend::open(&copy)?.export_state()?;
    assert_eq!(original.total_documents(), 2);
    assert_eq!(original, imported);

    let classifier = Classifier::with_backend(
        ClassifierConfig::default(),
        std::sync::Arc::new(FileBackend::open(&copy)?).into(),
    )?;
    assert_eq!(classifier.classify("free watches")?, Category::from(true));
    Ok(())
}

#[test]
fn test_actor_config_trains_state_file() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("model.json");
    let samples = temp_dir.path().join("samples.jsonl");
    let config = temp_dir.path().join("config.json");

    fs::write(&samples, "{\"input\": [\"a\", \"b\"], \"output\": \"x\"}\n")?;
    fs::write(&config, r#"{"backend": {"type": "actor", "inner": {"type": "memory"}}}"#)?;

    run(&[
        "--config",
        config.to_str().unwrap(),
        "train",
        state.to_str().unwrap(),
        samples.to_str().unwrap(),
    ])?;

    let stored = FileBackend::open(&state)?.export_state()?;
    assert_eq!(stored.categories[&Category::from("x")], 1);
    Ok(())
}

#[test]
fn test_cross_validate_command() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let samples = temp_dir.path().join("samples.jsonl");
    let lines: String = (0..9)
        .map(|i| {
            if i % 3 == 0 {
                format!("{{\"input\": \"meeting notes {i}\", \"output\": \"ham\"}}\n")
            } else {
                format!("{{\"input\": \"cheap replica {i}\", \"output\": \"spam\"}}\n")
            }
        })
        .collect();
    fs::write(&samples, lines)?;

    run(&["cross-validate", samples.to_str().unwrap(), "--folds", "3", "--seed", "11"])?;

    let err = run(&["cross-validate", samples.to_str().unwrap(), "--folds", "20"]).unwrap_err();
    assert!(matches!(err, BayesianError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn test_bad_samples_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("model.json");
    let samples = temp_dir.path().join("samples.jsonl");
    fs::write(&samples, "{\"input\": 3, \"output\": \"x\"}\n").unwrap();

    let err = run(&[
        "train",
        state.to_str().unwrap(),
        samples.to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(matches!(err, BayesianError::InvalidDocumentType(_)));
    assert!(!state.exists());
}
