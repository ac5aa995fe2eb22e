// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loader-facing traits and the completion protocol.

use crate::cache::{AssetCache, AssetKind, LoadResult};
use crate::error::AssetError;
use std::sync::Weak;
use tokio::sync::oneshot;

/// Produces asset descriptors for the cache.
///
/// `load` is called at most once per in-flight id (the cache deduplicates
/// concurrent requests) and must not block: hand the ticket to whatever
/// task, thread or callback eventually knows the result.
pub trait AssetLoader: Send + Sync + 'static {
    /// Start loading `id` and resolve `ticket` when done.
    fn load(&self, kind: AssetKind, id: &str, ticket: CompletionTicket);
}

/// Proposes a replacement id after a load failure, e.g. mapping a missing
/// high-resolution file to a proxy rendition.
pub trait IdRewriter: Send + Sync {
    /// A new id to try instead of `id`, or `None` to give up.
    fn propose(&self, kind: AssetKind, id: &str, cause: &AssetError) -> Option<String>;
}

/// Single-use completion token for one load dispatch.
///
/// Resolving consumes the ticket, so a loader cannot complete the same
/// dispatch twice. Dropping an unresolved ticket completes the load with
/// [`AssetError::LoadFailed`] so waiters are never stranded.
#[derive(Debug)]
pub struct CompletionTicket {
    inner: Option<(Weak<AssetCache>, AssetKind, String, u64)>,
}

impl CompletionTicket {
    pub(crate) fn new(cache: Weak<AssetCache>, kind: AssetKind, id: String, generation: u64) -> Self {
        Self {
            inner: Some((cache, kind, id, generation)),
        }
    }

    /// Complete the load this ticket was issued for.
    ///
    /// A stale ticket (the entry was invalidated or re-dispatched since) is
    /// logged and ignored.
    pub fn resolve(mut self, result: LoadResult) {
        if let Some((cache, kind, id, generation)) = self.inner.take() {
            if let Some(cache) = cache.upgrade() {
                if let Err(err) = cache.complete_generation(kind, &id, Some(generation), result) {
                    tracing::warn!(%id, %err, "stale load completion ignored");
                }
            }
        }
    }
}

impl Drop for CompletionTicket {
    fn drop(&mut self) {
        if let Some((cache, kind, id, generation)) = self.inner.take() {
            if let Some(cache) = cache.upgrade() {
                let result = Err(AssetError::LoadFailed(
                    "loader dropped the completion ticket".into(),
                ));
                let _ = cache.complete_generation(kind, &id, Some(generation), result);
            }
        }
    }
}

/// Awaitable handle to one requested asset.
#[derive(Debug)]
pub struct LoadHandle {
    rx: oneshot::Receiver<LoadResult>,
}

impl LoadHandle {
    pub(crate) fn new(rx: oneshot::Receiver<LoadResult>) -> Self {
        Self { rx }
    }

    /// Wait for the load to finish.
    ///
    /// Returns [`AssetError::Cancelled`] if the cache entry was invalidated
    /// before a result arrived. Dropping the handle instead of awaiting it
    /// abandons only this waiter; the load itself continues for the others.
    pub async fn resolve(self) -> LoadResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(AssetError::Cancelled),
        }
    }
}
