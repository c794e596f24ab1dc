//! Downstream copies of the canonical collections.
//!
//! The engine calls every registered [`Mirror`] after each committed mutation.
//! Mirrors never feed back into the engine and never fail the mutation that
//! triggered them.

use crate::cache::{self, LocalCache};
use crate::remote::RemoteStore;
use crate::types::Collections;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub trait Mirror: Send + Sync {
    fn name(&self) -> &'static str;

    /// Record a new snapshot. Must not block on the network.
    fn mirror(&self, collections: &Collections);

    /// Best-effort synchronous write at teardown. Mirrors that cannot
    /// complete synchronously skip it.
    fn flush(&self, _collections: &Collections) {}
}

/// Writes snapshots straight into the local cache.
pub struct LocalMirror {
    cache: Arc<dyn LocalCache>,
}

impl LocalMirror {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self { cache }
    }

    fn write(&self, collections: &Collections) {
        if let Err(e) = cache::store(self.cache.as_ref(), collections) {
            tracing::warn!(error = %e, "local cache write failed");
        }
    }
}

impl Mirror for LocalMirror {
    fn name(&self) -> &'static str {
        "local"
    }

    fn mirror(&self, collections: &Collections) {
        self.write(collections);
    }

    fn flush(&self, collections: &Collections) {
        self.write(collections);
    }
}

/// Pushes snapshots to the remote store from a background task.
///
/// Pushes are serialized; when several snapshots queue up while a push is in
/// flight, only the newest is sent.
pub struct RemoteMirror {
    tx: mpsc::UnboundedSender<Collections>,
}

impl RemoteMirror {
    /// Spawn the push task on the current Tokio runtime.
    ///
    /// The task exits once the mirror is dropped and the queue is drained;
    /// await the returned handle to let in-flight pushes finish.
    pub fn spawn(remote: Arc<dyn RemoteStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Collections>();

        let handle = tokio::spawn(async move {
            tracing::debug!("remote mirror started");
            while let Some(mut snapshot) = rx.recv().await {
                let mut superseded = 0usize;
                while let Ok(newer) = rx.try_recv() {
                    snapshot = newer;
                    superseded += 1;
                }
                if superseded > 0 {
                    tracing::trace!(superseded, "coalesced remote pushes");
                }
                if let Err(e) = remote.push_history(&snapshot).await {
                    tracing::warn!(error = %e, "remote mirror push failed");
                }
            }
            tracing::debug!("remote mirror exiting");
        });

        (Self { tx }, handle)
    }
}

impl Mirror for RemoteMirror {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn mirror(&self, collections: &Collections) {
        if self.tx.send(collections.clone()).is_err() {
            tracing::warn!("remote mirror task gone; push dropped");
        }
    }
}
