//! Asynchronous backend serializing all work through one task.
//!
//! An [`ActorBackend`] owns any [`SyncBackend`] and processes requests strictly
//! in the order they were submitted. A batch increment is one request, so a
//! read queued behind it sees all of it and a read queued before it sees none.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{BayesianError, Result};
use crate::storage::traits::{AsyncBackend, SyncBackend};
use crate::types::{BackendState, CategoryCounts, CountIncrements, FeatureSet, WordCounts};

/// Default depth of the request queue.
pub const DEFAULT_CAPACITY: usize = 1024;

type Reply<T> = oneshot::Sender<Result<T>>;

enum Request {
    Categories(Reply<CategoryCounts>),
    WordCounts {
        features: FeatureSet,
        categories: CategoryCounts,
        reply: Reply<WordCounts>,
    },
    Snapshot {
        features: FeatureSet,
        reply: Reply<(CategoryCounts, WordCounts)>,
    },
    Increment {
        increments: CountIncrements,
        reply: Reply<()>,
    },
    Export(Reply<BackendState>),
    Import {
        state: BackendState,
        reply: Reply<()>,
    },
}

/// An asynchronous backend in front of a synchronous one.
pub struct ActorBackend {
    inner_name: &'static str,
    sender: mpsc::Sender<Request>,
    _worker: JoinHandle<()>,
}

impl fmt::Debug for ActorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorBackend")
            .field("inner", &self.inner_name)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl ActorBackend {
    /// Spawn the worker task on the current tokio runtime.
    pub fn spawn(inner: Arc<dyn SyncBackend>) -> Result<Self> {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// Spawn the worker task with a bounded request queue of `capacity`.
    pub fn with_capacity(inner: Arc<dyn SyncBackend>, capacity: usize) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            BayesianError::invalid_operation("an actor backend needs a running tokio runtime")
        })?;

        let inner_name = inner.name();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = handle.spawn(Self::run(inner, receiver));

        log::debug!("Spawned actor backend over {inner_name} storage");
        Ok(ActorBackend {
            inner_name,
            sender,
            _worker: worker,
        })
    }

    /// Name of the wrapped backend.
    pub fn inner_name(&self) -> &'static str {
        self.inner_name
    }

    async fn run(inner: Arc<dyn SyncBackend>, mut receiver: mpsc::Receiver<Request>) {
        while let Some(request) = receiver.recv().await {
            // A dropped reply means the caller stopped waiting; the work itself
            // has already been applied.
            match request {
                Request::Categories(reply) => {
                    let _ = reply.send(inner.categories());
                }
                Request::WordCounts {
                    features,
                    categories,
                    reply,
                } => {
                    let _ = reply.send(inner.word_counts(&features, &categories));
                }
                Request::Snapshot { features, reply } => {
                    let _ = reply.send(inner.read_snapshot(&features));
                }
                Request::Increment { increments, reply } => {
                    let inner = Arc::clone(&inner);
                    let result =
                        Self::blocking(move || inner.increment_counts(&increments)).await;
                    let _ = reply.send(result);
                }
                Request::Export(reply) => {
                    let _ = reply.send(inner.export_state());
                }
                Request::Import { state, reply } => {
                    let inner = Arc::clone(&inner);
                    let result = Self::blocking(move || inner.import_state(state)).await;
                    let _ = reply.send(result);
                }
            }
        }
        log::debug!("Actor backend over {} storage stopped", inner.name());
    }

    /// Run a write on the blocking pool, since a file backend saves to disk.
    ///
    /// The worker awaits it before taking the next request, so order holds.
    async fn blocking<F>(write: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        tokio::task::spawn_blocking(write)
            .await
            .map_err(|e| BayesianError::backend(format!("actor backend write failed: {e}")))?
    }

    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.sender.send(request(reply)).await.map_err(|_| {
            log::warn!("Actor backend worker over {} has stopped", self.inner_name);
            BayesianError::backend("actor backend worker has stopped")
        })?;
        response
            .await
            .map_err(|_| BayesianError::backend("actor backend dropped the request"))?
    }
}

#[async_trait]
impl AsyncBackend for ActorBackend {
    fn name(&self) -> &'static str {
        "actor"
    }

    async fn categories(&self) -> Result<CategoryCounts> {
        self.call(Request::Categories).await
    }

    async fn word_counts(
        &self,
        features: &FeatureSet,
        categories: &CategoryCounts,
    ) -> Result<WordCounts> {
        let features = features.clone();
        let categories = categories.clone();
        self.call(|reply| Request::WordCounts {
            features,
            categories,
            reply,
        })
        .await
    }

    async fn read_snapshot(&self, features: &FeatureSet) -> Result<(CategoryCounts, WordCounts)> {
        let features = features.clone();
        self.call(|reply| Request::Snapshot { features, reply })
            .await
    }

    async fn increment_counts(&self, increments: &CountIncrements) -> Result<()> {
        let increments = increments.clone();
        self.call(|reply| Request::Increment { increments, reply })
            .await
    }

    async fn export_state(&self) -> Result<BackendState> {
        self.call(Request::Export).await
    }

    async fn import_state(&self, state: BackendState) -> Result<()> {
        self.call(|reply| Request::Import { state, reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::file::FileBackend;
    use crate::storage::memory::MemoryBackend;
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
    fn test_spawn_requires_runtime() {
        let err = ActorBackend::spawn(Arc::new(MemoryBackend::new())).unwrap_err();
        assert!(matches!(err, BayesianError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_requests_reach_inner_backend() {
        let inner = Arc::new(MemoryBackend::new());
        let backend = ActorBackend::spawn(inner.clone()).unwrap();
        assert_eq!(backend.inner_name(), "memory");

        backend
            .increment_counts(&one_doc("spam", &["cheap"]))
            .await
            .unwrap();

        let categories = backend.categories().await.unwrap();
        assert_eq!(categories[&Category::from("spam")], 1);

        let features: FeatureSet = ["cheap", "free"].into_iter().collect();
        let counts = backend.word_counts(&features, &categories).await.unwrap();
        assert_eq!(counts.len(), 1);

        assert_eq!(inner.document_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_all_applied() {
        let backend = Arc::new(ActorBackend::with_capacity(Arc::new(MemoryBackend::new()), 4).unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let backend = Arc::clone(&backend);
                tokio::spawn(async move {
                    backend
                        .increment_counts(&one_doc("ham", &["notes"]))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let state = backend.export_state().await.unwrap();
        assert_eq!(state.categories[&Category::from("ham")], 16);
        assert_eq!(state.words["notes"][&Category::from("ham")], 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_snapshot_never_sees_half_a_batch() {
        let backend = Arc::new(ActorBackend::spawn(Arc::new(MemoryBackend::new())).unwrap());

        let writer = {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                for _ in 0..200 {
                    backend
                        .increment_counts(&one_doc("ham", &["notes"]))
                        .await
                        .unwrap();
                }
            })
        };

        let features: FeatureSet = ["notes"].into_iter().collect();
        for _ in 0..200 {
            let (categories, counts) = backend.read_snapshot(&features).await.unwrap();
            let documents = categories.get(&Category::from("ham")).copied().unwrap_or(0);
            let notes = counts
                .get("notes")
                .and_then(|per_category| per_category.get(&Category::from("ham")))
                .copied()
                .unwrap_or(0);
            assert_eq!(documents, notes);
        }

        writer.await.unwrap();
        let (categories, _) = backend.read_snapshot(&features).await.unwrap();
        assert_eq!(categories[&Category::from("ham")], 200);
    }

    #[tokio::test]
    async fn test_file_writes_on_current_thread_runtime() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let inner = Arc::new(FileBackend::open(&path).unwrap());
        let backend = ActorBackend::spawn(inner).unwrap();

        backend
            .increment_counts(&one_doc("spam", &["cheap"]))
            .await
            .unwrap();
        backend
            .increment_counts(&one_doc("spam", &["replica"]))
            .await
            .unwrap();

        let stored = FileBackend::open(&path).unwrap().export_state().unwrap();
        assert_eq!(stored.categories[&Category::from("spam")], 2);
        assert_eq!(stored, backend.export_state().await.unwrap());
    }

    #[tokio::test]
    async fn test_import_errors_are_propagated() {
        let backend = ActorBackend::spawn(Arc::new(MemoryBackend::new())).unwrap();
        let mut state = BackendState::default();
        state
            .words
            .entry("orphan".to_string())
            .or_default()
            .insert(Category::from("spam"), 1);

        let err = backend.import_state(state).await.unwrap_err();
        assert!(err.is_backend_failure());
    }
}
