//! Command line argument parsing for the bayesian CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::evaluation::DEFAULT_FOLDS;

/// Bayesian - a naive Bayes text classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "bayesian")]
#[command(about = "Train and query a naive Bayes text classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BayesianArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Classifier configuration file (JSON)
    #[arg(short, long, global = true, value_name = "CONFIG_FILE", env = "BAYESIAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl BayesianArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from labeled samples
    Train(TrainArgs),

    /// Classify one document
    Classify(ClassifyArgs),

    /// Measure the error rate of a model on labeled samples
    Test(TestArgs),

    /// Run k-fold cross-validation on labeled samples
    #[command(name = "cross-validate")]
    CrossValidate(CrossValidateArgs),

    /// Write the trained counts as a JSON snapshot
    Export(ExportArgs),

    /// Replace the trained counts with a JSON snapshot
    Import(ImportArgs),

    /// Show model statistics
    Stats(StatsArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Samples file (JSON Lines of {"input": ..., "output": ...})
    #[arg(value_name = "SAMPLES")]
    pub samples: PathBuf,

    /// Number of samples applied per atomic batch
    #[arg(short, long, default_value = "1000")]
    pub batch_size: usize,
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Document text
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Parse TEXT as a JSON document (string, list of features, or object)
    #[arg(long)]
    pub json_input: bool,

    /// Show the scores behind the decision
    #[arg(short, long)]
    pub explain: bool,
}

/// Arguments for testing
#[derive(Parser, Debug, Clone)]
pub struct TestArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Samples file (JSON Lines)
    #[arg(value_name = "SAMPLES")]
    pub samples: PathBuf,
}

/// Arguments for cross-validation
#[derive(Parser, Debug, Clone)]
pub struct CrossValidateArgs {
    /// Samples file (JSON Lines)
    #[arg(value_name = "SAMPLES")]
    pub samples: PathBuf,

    /// Number of folds
    #[arg(short = 'k', long, default_value_t = DEFAULT_FOLDS)]
    pub folds: usize,

    /// Seed for the shuffle
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Arguments for exporting a snapshot
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for importing a snapshot
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,

    /// Snapshot file produced by `export`
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// Arguments for model statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Path to the model state file
    #[arg(value_name = "STATE")]
    pub state: PathBuf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_command() {
        let args = BayesianArgs::try_parse_from([
            "bayesian",
            "train",
            "model.json",
            "samples.jsonl",
            "--batch-size",
            "50",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.state, PathBuf::from("model.json"));
            assert_eq!(train_args.samples, PathBuf::from("samples.jsonl"));
            assert_eq!(train_args.batch_size, 50);
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_classify_command() {
        let args = BayesianArgs::try_parse_from([
            "bayesian",
            "classify",
            "model.json",
            "free watches",
            "--explain",
        ])
        .unwrap();

        if let Command::Classify(classify_args) = args.command {
            assert_eq!(classify_args.text, "free watches");
            assert!(classify_args.explain);
            assert!(!classify_args.json_input);
        } else {
            panic!("Expected Classify command");
        }
    }

    #[test]
    fn test_cross_validate_defaults() {
        let args =
            BayesianArgs::try_parse_from(["bayesian", "cross-validate", "samples.jsonl"]).unwrap();

        if let Command::CrossValidate(cv_args) = args.command {
            assert_eq!(cv_args.folds, DEFAULT_FOLDS);
            assert_eq!(cv_args.seed, None);
        } else {
            panic!("Expected CrossValidate command");
        }
    }

    #[test]
    fn test_global_config_flag() {
        let args = BayesianArgs::try_parse_from([
            "bayesian",
            "stats",
            "model.json",
            "--config",
            "classifier.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("classifier.json")));
    }

    #[test]
    fn test_verbosity_levels() {
        let args = BayesianArgs::try_parse_from(["bayesian", "stats", "m.json"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = BayesianArgs::try_parse_from(["bayesian", "-vv", "stats", "m.json"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = BayesianArgs::try_parse_from(["bayesian", "-vvv", "stats", "m.json"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args =
            BayesianArgs::try_parse_from(["bayesian", "--quiet", "-vv", "stats", "m.json"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            BayesianArgs::try_parse_from(["bayesian", "--format", "json", "stats", "m.json"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(BayesianArgs::try_parse_from(["bayesian", "--format", "yaml", "stats", "m.json"]).is_err());
    }
}
