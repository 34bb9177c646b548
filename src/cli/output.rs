//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cli::args::{BayesianArgs, OutputFormat};
use crate::error::Result;
use crate::types::Category;

/// Result structure for training.
#[derive(Debug, Serialize)]
pub struct TrainingResult {
    pub state: String,
    pub samples_trained: usize,
    pub batches: usize,
    pub total_documents: u64,
    pub duration_ms: u64,
    pub samples_per_second: f64,
}

/// Result structure for a plain classification.
#[derive(Debug, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
}

/// Result structure for testing.
#[derive(Debug, Serialize)]
pub struct TestResult {
    pub samples: usize,
    pub error: f64,
    pub accuracy: f64,
    pub duration_ms: u64,
}

/// Result structure for exporting to a file.
#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub output: String,
    pub total_documents: u64,
    pub vocabulary_size: usize,
}

/// Result structure for importing a snapshot.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub state: String,
    pub total_documents: u64,
    pub vocabulary_size: usize,
}

/// Model statistics.
#[derive(Debug, Serialize)]
pub struct ModelStats {
    pub state: String,
    pub backend: String,
    pub total_documents: u64,
    pub vocabulary_size: usize,
    pub categories: BTreeMap<Category, u64>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &BayesianArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &BayesianArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in render_human(&value, 0) {
        println!("{line}");
    }
    Ok(())
}

/// Render a JSON value as indented `key: value` lines.
fn render_human(value: &Value, indent: usize) -> Vec<String> {
    let spaces = "  ".repeat(indent);
    let mut lines = Vec::new();

    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                match val {
                    Value::Object(inner) if !inner.is_empty() => {
                        lines.push(format!("{spaces}{key}:"));
                        lines.extend(render_human(val, indent + 1));
                    }
                    Value::Array(items) if items.iter().any(Value::is_object) => {
                        lines.push(format!("{spaces}{key}:"));
                        for (i, item) in items.iter().enumerate() {
                            lines.push(format!("{spaces}  [{}]", i + 1));
                            lines.extend(render_human(item, indent + 2));
                        }
                    }
                    _ => lines.push(format!("{spaces}{key}: {}", format_value(val))),
                }
            }
        }
        _ => lines.push(format!("{spaces}{}", format_value(value))),
    }

    lines
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &BayesianArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.6}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        Value::Object(obj) if obj.is_empty() => "{}".to_string(),
        Value::Object(_) => "[object]".to_string(),
        Value::Null => "-".to_string(),
    }
}
