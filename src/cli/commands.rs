//! Command implementations for the bayesian CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

use crate::analysis::feature::Document;
use crate::classifier::aggregate::Sample;
use crate::classifier::bayesian::Classifier;
use crate::classifier::config::{BackendConfig, ClassifierConfig};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{BayesianError, Result};
use crate::evaluation::cross_validate;
use crate::types::BackendState;

/// Execute a CLI command.
pub fn execute_command(args: BayesianArgs) -> Result<()> {
    let config = load_config(&args)?;

    // Cross-validation trains throwaway in-memory models synchronously.
    if let Command::CrossValidate(cv_args) = &args.command {
        return cross_validate_samples(cv_args.clone(), config, &args);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match &args.command {
            Command::Train(train_args) => train(train_args.clone(), config, &args).await,
            Command::Classify(classify_args) => {
                classify(classify_args.clone(), config, &args).await
            }
            Command::Test(test_args) => test(test_args.clone(), config, &args).await,
            Command::Export(export_args) => export(export_args.clone(), config, &args).await,
            Command::Import(import_args) => import(import_args.clone(), config, &args).await,
            Command::Stats(stats_args) => show_stats(stats_args.clone(), config, &args).await,
            Command::CrossValidate(_) => Ok(()),
        }
    })
}

fn load_config(args: &BayesianArgs) -> Result<ClassifierConfig> {
    match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            ClassifierConfig::from_file(path)
        }
        None => Ok(ClassifierConfig::default()),
    }
}

/// Point the configured backend at the given state file.
///
/// An actor backend in the configuration wraps the state file; any other
/// choice is replaced by the state file itself.
fn state_backend(config: &BackendConfig, state: &Path) -> BackendConfig {
    let format = match config {
        BackendConfig::File { format, .. } => *format,
        BackendConfig::Actor { inner, .. } => match inner.as_ref() {
            BackendConfig::File { format, .. } => *format,
            _ => None,
        },
        BackendConfig::Memory => None,
    };
    let file = BackendConfig::File {
        path: state.to_path_buf(),
        format,
    };

    match config {
        BackendConfig::Actor { capacity, .. } => BackendConfig::Actor {
            inner: Box::new(file),
            capacity: *capacity,
        },
        _ => file,
    }
}

fn open_classifier(config: ClassifierConfig, state: &Path) -> Result<Classifier> {
    let backend = state_backend(&config.backend, state);
    Classifier::new(config.with_backend(backend))
}

/// Read samples from a JSON Lines file. Blank lines are skipped.
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut samples = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample: Sample = serde_json::from_str(&line).map_err(|e| {
            BayesianError::invalid_document(format!(
                "{}:{}: {e}",
                path.display(),
                line_num + 1
            ))
        })?;
        samples.push(sample);
    }

    log::debug!("Read {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Train a model from a samples file.
async fn train(args: TrainArgs, config: ClassifierConfig, cli_args: &BayesianArgs) -> Result<()> {
    if args.batch_size == 0 {
        return Err(BayesianError::invalid_config("batch size must be positive"));
    }

    let classifier = open_classifier(config, &args.state)?;
    let samples = read_samples(&args.samples)?;

    let start_time = Instant::now();
    let mut batches = 0;
    let mut trained = 0;
    for batch in samples.chunks(args.batch_size) {
        classifier.train_all_async(batch).await?;
        batches += 1;
        trained += batch.len();
        if cli_args.verbosity() > 1 {
            println!("Trained {trained} samples...");
        }
    }
    let duration = start_time.elapsed();

    let state = classifier.export_state_async().await?;
    output_result(
        "Training complete",
        &TrainingResult {
            state: args.state.display().to_string(),
            samples_trained: samples.len(),
            batches,
            total_documents: state.total_documents(),
            duration_ms: duration.as_millis() as u64,
            samples_per_second: if duration.as_secs_f64() > 0.0 {
                samples.len() as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
        },
        cli_args,
    )
}

/// Classify one document.
async fn classify(
    args: ClassifyArgs,
    config: ClassifierConfig,
    cli_args: &BayesianArgs,
) -> Result<()> {
    let classifier = open_classifier(config, &args.state)?;

    let document = if args.json_input {
        let value: Value = serde_json::from_str(&args.text)?;
        Document::try_from(value)?
    } else {
        Document::Text(args.text)
    };

    if args.explain {
        let classification = classifier.classify_detailed_async(document).await?;
        output_result("Classification", &classification, cli_args)
    } else {
        let category = classifier.classify_async(document).await?;
        output_result("Classification", &ClassificationResult { category }, cli_args)
    }
}

/// Measure the error rate on a samples file.
async fn test(args: TestArgs, config: ClassifierConfig, cli_args: &BayesianArgs) -> Result<()> {
    let classifier = open_classifier(config, &args.state)?;
    let samples = read_samples(&args.samples)?;

    let start_time = Instant::now();
    let error = classifier.test_async(&samples).await?;
    let duration = start_time.elapsed();

    output_result(
        "Test results",
        &TestResult {
            samples: samples.len(),
            error,
            accuracy: 1.0 - error,
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )
}

/// Cross-validate on a samples file.
fn cross_validate_samples(
    args: CrossValidateArgs,
    config: ClassifierConfig,
    cli_args: &BayesianArgs,
) -> Result<()> {
    let samples = read_samples(&args.samples)?;
    let config = config.with_backend(BackendConfig::Memory);

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Cross-validating {} samples with seed {seed}", samples.len());
    let mut rng = StdRng::seed_from_u64(seed);

    let report = cross_validate(
        || Classifier::new(config.clone()),
        &samples,
        args.folds,
        &mut rng,
    )?;

    output_result("Cross-validation results", &report, cli_args)
}

/// Export a snapshot to a file or stdout.
async fn export(args: ExportArgs, config: ClassifierConfig, cli_args: &BayesianArgs) -> Result<()> {
    let classifier = open_classifier(config, &args.state)?;
    let state = classifier.export_state_async().await?;

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_snapshot(&mut writer, &state, cli_args.pretty)?;
            writer.flush()?;

            output_result(
                "Snapshot exported",
                &ExportResult {
                    output: path.display().to_string(),
                    total_documents: state.total_documents(),
                    vocabulary_size: state.vocabulary_size(),
                },
                cli_args,
            )
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_snapshot(&mut handle, &state, cli_args.pretty)?;
            writeln!(handle)?;
            Ok(())
        }
    }
}

fn write_snapshot<W: Write>(writer: &mut W, state: &BackendState, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, state)?;
    } else {
        serde_json::to_writer(writer, state)?;
    }
    Ok(())
}

/// Import a snapshot, replacing the model.
async fn import(args: ImportArgs, config: ClassifierConfig, cli_args: &BayesianArgs) -> Result<()> {
    let reader = BufReader::new(File::open(&args.snapshot)?);
    let state: BackendState = serde_json::from_reader(reader)?;
    let total_documents = state.total_documents();
    let vocabulary_size = state.vocabulary_size();

    let classifier = open_classifier(config, &args.state)?;
    classifier.import_state_async(state).await?;
    log::info!(
        "Imported {} into {}",
        args.snapshot.display(),
        args.state.display()
    );

    output_result(
        "Snapshot imported",
        &ImportResult {
            state: args.state.display().to_string(),
            total_documents,
            vocabulary_size,
        },
        cli_args,
    )
}

/// Show model statistics.
async fn show_stats(
    args: StatsArgs,
    config: ClassifierConfig,
    cli_args: &BayesianArgs,
) -> Result<()> {
    let classifier = open_classifier(config, &args.state)?;
    let state = classifier.export_state_async().await?;

    output_result(
        "Model statistics",
        &ModelStats {
            state: args.state.display().to_string(),
            backend: classifier.backend().name().to_string(),
            total_documents: state.total_documents(),
            vocabulary_size: state.vocabulary_size(),
            categories: state.categories,
        },
        cli_args,
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::file::FileFormat;

    #[test]
    fn test_state_backend_replaces_memory() {
        let backend = state_backend(&BackendConfig::Memory, Path::new("model.json"));
        assert_eq!(
            backend,
            BackendConfig::File {
                path: PathBuf::from("model.json"),
                format: None,
            }
        );
    }

    #[test]
    fn test_state_backend_keeps_actor_and_format() {
        let configured = BackendConfig::Actor {
            inner: Box::new(BackendConfig::File {
                path: PathBuf::from("ignored.bin"),
                format: Some(FileFormat::Binary),
            }),
            capacity: 16,
        };
        let backend = state_backend(&configured, Path::new("model.dat"));
        assert_eq!(
            backend,
            BackendConfig::Actor {
                inner: Box::new(BackendConfig::File {
                    path: PathBuf::from("model.dat"),
                    format: Some(FileFormat::Binary),
                }),
                capacity: 16,
            }
        );
    }

    #[test]
    fn test_read_samples() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("samples.jsonl");
        std::fs::write(
            &path,
            "{\"input\": \"cheap replica watches\", \"output\": true}\n\n{\"input\": [\"a\"], \"output\": \"b\"}\n",
        )
        .unwrap();

        let samples = read_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].category.as_str(), "true");
    }

    #[test]
    fn test_read_samples_reports_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("samples.jsonl");
        std::fs::write(&path, "{\"input\": \"ok\", \"output\": 1}\n{\"input\": null, \"output\": 1}\n")
            .unwrap();

        let err = read_samples(&path).unwrap_err();
        assert!(matches!(err, BayesianError::InvalidDocumentType(_)));
        assert!(err.to_string().contains(":2:"));
    }
}
