//! facedex-core — Reconciliation engine for face recognition results.
//!
//! Keeps upload history, per-person galleries and the unrecognized-face queue
//! consistent across a local cache and the remote recognition service.

pub mod cache;
pub mod confirm;
pub mod coordinator;
pub mod dedup;
pub mod engine;
pub mod eviction;
pub mod lifecycle;
pub mod mirror;
pub mod remote;
pub mod types;

#[cfg(test)]
mod fakes;

pub use cache::{CacheError, LocalCache, MemoryCache, Slot};
pub use confirm::{AssumeYes, Confirm};
pub use coordinator::{Coordinator, MutationError, Outcome, UploadReport};
pub use engine::{Assignment, Phase, Reconciler, SharedReconciler};
pub use lifecycle::Lifecycle;
pub use mirror::{LocalMirror, Mirror, RemoteMirror};
pub use remote::{RemoteError, RemoteStore};
pub use types::{Collections, Face, FacePosition, HistoryItem, ImageRef, Person, RecognitionResult};
