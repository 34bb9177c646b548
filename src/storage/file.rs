//! File-backed backend.
//!
//! The table lives in memory and is mirrored to a single file. Every batch is
//! written to a temporary file in the same directory and renamed over the old
//! one before it becomes visible to readers, so a crash or a failed write
//! leaves the previous state intact on disk and in memory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{BayesianError, Result};
use crate::storage::traits::SyncBackend;
use crate::types::{BackendState, CategoryCounts, CountIncrements, FeatureSet, WordCounts};

/// Current on-disk layout version.
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Encoding of the state file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Human-readable JSON.
    #[default]
    Json,
    /// Compact bincode.
    Binary,
}

impl FileFormat {
    /// Pick a format from the file extension: `.bin` is binary, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") => FileFormat::Binary,
            _ => FileFormat::Json,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    version: u32,
    updated_at: DateTime<Utc>,
    state: BackendState,
}

/// A backend persisting its counts to one file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    format: FileFormat,
    table: RwLock<BackendState>,
}

impl FileBackend {
    /// Open the state file at `path`, choosing the format from its extension.
    /// A missing file starts an empty model.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = FileFormat::from_path(path.as_ref());
        Self::open_with_format(path, format)
    }

    /// Open the state file at `path` with an explicit format.
    pub fn open_with_format<P: AsRef<Path>>(path: P, format: FileFormat) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let state = read_state(&path, format)?;
            log::info!(
                "Opened {} with {} documents and {} features",
                path.display(),
                state.total_documents(),
                state.vocabulary_size()
            );
            state
        } else {
            log::info!("Starting empty model at {}", path.display());
            BackendState::default()
        };

        Ok(FileBackend {
            path,
            format,
            table: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Write the current state to disk even if nothing changed.
    pub fn flush(&self) -> Result<()> {
        let table = self.table.read();
        write_state(&self.path, self.format, &table)
    }
}

fn read_state(path: &Path, format: FileFormat) -> Result<BackendState> {
    let file = File::open(path).map_err(|e| {
        BayesianError::backend(format!("Failed to open {}: {e}", path.display()))
    })?;
    let reader = BufReader::new(file);

    let stored: StoredState = match format {
        FileFormat::Json => serde_json::from_reader(reader)
            .map_err(|e| BayesianError::backend(format!("Failed to parse {}: {e}", path.display())))?,
        FileFormat::Binary => bincode::deserialize_from(reader)
            .map_err(|e| BayesianError::backend(format!("Failed to decode {}: {e}", path.display())))?,
    };

    if stored.version != FILE_FORMAT_VERSION {
        return Err(BayesianError::backend(format!(
            "Unsupported state file version {} in {}",
            stored.version,
            path.display()
        )));
    }
    stored.state.validate()?;
    Ok(stored.state)
}

fn write_state(path: &Path, format: FileFormat, state: &BackendState) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|e| BayesianError::backend(format!("Failed to create directory: {e}")))?;

    let stored = StoredState {
        version: FILE_FORMAT_VERSION,
        updated_at: Utc::now(),
        state: state.clone(),
    };

    let temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| BayesianError::backend(format!("Could not create temporary file: {e}")))?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        match format {
            FileFormat::Json => serde_json::to_writer(&mut writer, &stored)
                .map_err(|e| BayesianError::backend(format!("Failed to serialize state: {e}")))?,
            FileFormat::Binary => bincode::serialize_into(&mut writer, &stored)
                .map_err(|e| BayesianError::backend(format!("Failed to serialize state: {e}")))?,
        }
        writer
            .flush()
            .map_err(|e| BayesianError::backend(format!("Failed to flush: {e}")))?;
    }

    temp_file.persist(path).map_err(|e| {
        BayesianError::backend(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

impl SyncBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn categories(&self) -> Result<CategoryCounts> {
        Ok(self.table.read().categories.clone())
    }

    fn word_counts(
        &self,
        features: &FeatureSet,
        categories: &CategoryCounts,
    ) -> Result<WordCounts> {
        Ok(self.table.read().word_counts(features, categories))
    }

    fn read_snapshot(&self, features: &FeatureSet) -> Result<(CategoryCounts, WordCounts)> {
        let table = self.table.read();
        let counts = table.word_counts(features, &table.categories);
        Ok((table.categories.clone(), counts))
    }

    fn increment_counts(&self, increments: &CountIncrements) -> Result<()> {
        let mut table = self.table.write();
        let mut next = table.clone();
        next.apply(increments);
        write_state(&self.path, self.format, &next)?;
        *table = next;
        Ok(())
    }

    fn export_state(&self) -> Result<BackendState> {
        Ok(self.table.read().clone())
    }

    fn import_state(&self, state: BackendState) -> Result<()> {
        state.validate()?;
        let mut table = self.table.write();
        write_state(&self.path, self.format, &state)?;
        *table = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::types::Category;

    fn one_doc(category: &str, words: &[&str]) -> CountIncrements {
        let mut increments = CountIncrements::default();
        increments.categories.insert(Category::from(category), 1);
        for word in words {
            increments
                .words
                .entry(word.to_string())
                .or_default()
                .insert(Category::from(category), 1);
        }
        increments
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("model.bin")), FileFormat::Binary);
        assert_eq!(FileFormat::from_path(Path::new("model.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("model")), FileFormat::Json);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::open(temp_dir.path().join("model.json")).unwrap();
        assert!(backend.categories().unwrap().is_empty());
        assert!(!backend.path().exists());
    }

    #[test]
    fn test_increments_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("model.json");

        {
            let backend = FileBackend::open(&path).unwrap();
            backend
                .increment_counts(&one_doc("spam", &["cheap", "watches"]))
                .unwrap();
            backend.increment_counts(&one_doc("ham", &["watches"])).unwrap();
        }

        let reopened = FileBackend::open(&path).unwrap();
        let categories = reopened.categories().unwrap();
        assert_eq!(categories[&Category::from("spam")], 1);
        assert_eq!(categories[&Category::from("ham")], 1);

        let features: FeatureSet = ["watches"].into_iter().collect();
        let counts = reopened.word_counts(&features, &categories).unwrap();
        assert_eq!(counts["watches"].len(), 2);
    }

    #[test]
    fn test_binary_format_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.bin");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.format(), FileFormat::Binary);
        backend.increment_counts(&one_doc("true", &["replica"])).unwrap();
        let state = backend.export_state().unwrap();

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.export_state().unwrap(), state);
    }

    #[test]
    fn test_import_replaces_file_contents() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileBackend::open(temp_dir.path().join("a.json")).unwrap();
        source.increment_counts(&one_doc("spam", &["cheap"])).unwrap();

        let target = FileBackend::open(temp_dir.path().join("b.json")).unwrap();
        target.import_state(source.export_state().unwrap()).unwrap();

        let reopened = FileBackend::open(temp_dir.path().join("b.json")).unwrap();
        assert_eq!(
            reopened.export_state().unwrap(),
            source.export_state().unwrap()
        );
    }

    #[test]
    fn test_corrupt_file_is_a_backend_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(&path, "{not json").unwrap();

        let err = FileBackend::open(&path).unwrap_err();
        assert!(err.is_backend_failure());
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"version": 99, "updated_at": "2024-01-01T00:00:00Z", "state": {"cats": {}}}"#,
        )
        .unwrap();

        assert!(FileBackend::open(&path).unwrap_err().is_backend_failure());
    }
}
