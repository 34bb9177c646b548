//! Count storage backends.
//!
//! A backend holds category totals and per-feature, per-category counts behind
//! the [`SyncBackend`] or [`AsyncBackend`] contract. The [`Backend`] enum is the
//! fixed capability flag the classifier branches on.
//!
//! # Available Backends
//!
//! - [`memory::MemoryBackend`] - In-process table behind one lock
//! - [`file::FileBackend`] - In-process table mirrored to a file on every batch
//! - [`actor::ActorBackend`] - Asynchronous front for any synchronous backend

pub mod actor;
pub mod file;
pub mod memory;
pub mod traits;

pub use actor::ActorBackend;
pub use file::{FileBackend, FileFormat};
pub use memory::MemoryBackend;
pub use traits::{AsyncBackend, Backend, Capability, SyncBackend};
