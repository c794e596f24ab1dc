//! Startup load order, visibility refresh and teardown.
//!
//! Boot reads the local cache first so collections are available at once, then
//! fetches the remote copy. Mirror writes stay suppressed until both loads are
//! done, so stale cached data is never echoed to the remote store ahead of the
//! authoritative fetch.

use crate::cache::{self, LocalCache};
use crate::engine::{Phase, SharedReconciler};
use crate::remote::RemoteStore;
use std::sync::Arc;

pub struct Lifecycle {
    engine: SharedReconciler,
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
}

impl Lifecycle {
    pub fn new(
        engine: SharedReconciler,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            engine,
            cache,
            remote,
        }
    }

    /// `Uninitialized -> LoadingLocal -> LoadingRemote -> Ready`.
    ///
    /// Remote failures are logged; the engine still reaches `Ready` with
    /// whatever the cache held.
    pub async fn boot(&self) {
        {
            let mut engine = self.engine.lock().await;
            if engine.phase() != Phase::Uninitialized {
                tracing::debug!(phase = ?engine.phase(), "boot skipped; already started");
                return;
            }
            engine.set_phase(Phase::LoadingLocal);
            engine.restore(cache::load(self.cache.as_ref()));
            tracing::info!(
                history = engine.history().len(),
                persons = engine.persons().len(),
                unrecognized = engine.unrecognized().len(),
                "local cache loaded"
            );
            engine.set_phase(Phase::LoadingRemote);
        }

        self.refresh_remote().await;

        self.engine.lock().await.set_phase(Phase::Ready);
        tracing::info!("engine ready");
    }

    /// Re-fetch the remote copy after the user comes back to the session.
    pub async fn regain_visibility(&self) {
        if self.engine.lock().await.phase() != Phase::Ready {
            tracing::debug!("visibility refresh ignored before ready");
            return;
        }
        self.refresh_remote().await;
    }

    /// Flush collections into the local cache. The remote push is skipped.
    pub async fn teardown(&self) {
        self.engine.lock().await.flush();
        tracing::info!("collections flushed to local cache");
    }

    async fn refresh_remote(&self) {
        match self.remote.fetch_history().await {
            Ok(remote) => {
                let changed = self.engine.lock().await.merge_remote(remote);
                tracing::debug!(changed, "remote history fetched");
            }
            Err(e) => tracing::warn!(error = %e, "remote history fetch failed"),
        }
        refresh_persons(&self.engine, self.remote.as_ref()).await;
    }
}

/// Reload the all-persons index. Failures leave the index unchanged.
pub(crate) async fn refresh_persons(engine: &SharedReconciler, remote: &dyn RemoteStore) {
    match remote.fetch_persons().await {
        Ok(names) => {
            tracing::debug!(count = names.len(), "persons index refreshed");
            engine.lock().await.set_all_persons(names);
        }
        Err(e) => tracing::warn!(error = %e, "persons fetch failed"),
    }
}
