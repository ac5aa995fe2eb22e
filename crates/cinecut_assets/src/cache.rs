// SPDX-License-Identifier: MIT OR Apache-2.0
//! The asset cache: single-flight loading, exactly-once completion and
//! proxy rewriting.
//!
//! Concurrent requests for one id share a single load dispatch; every
//! requester gets its own awaitable handle. A loaded asset stays resident
//! until invalidated. A failed asset is retried by the next request for it.
//! Proxies rewrite one id to another: once set, every lookup and request for
//! the source transparently yields the target, with chains collapsed to
//! their final id and cycles rejected at insertion.

use crate::error::AssetError;
use crate::loader::{AssetLoader, CompletionTicket, IdRewriter, LoadHandle};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Category of a cached asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// A single playable media resource
    Media,
    /// A numbered sequence of still images
    ImageSequence,
    /// A serialized timeline project
    Project,
}

impl AssetKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::ImageSequence => "image-sequence",
            Self::Project => "project",
        }
    }
}

/// What the loader learned about an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Category of the asset
    pub kind: AssetKind,
    /// The id it was loaded under
    pub id: String,
    /// Intrinsic duration in timeline ticks, if the resource has one
    pub duration: Option<u64>,
    /// Free-form properties reported by the loader
    pub metadata: IndexMap<String, String>,
}

impl AssetDescriptor {
    /// Create a descriptor with no duration or metadata
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            duration: None,
            metadata: IndexMap::new(),
        }
    }
}

/// Outcome of one load, shared by every waiter.
pub type LoadResult = Result<Arc<AssetDescriptor>, AssetError>;

/// Lifecycle state of one cache entry.
#[derive(Debug, Clone)]
pub enum AssetState {
    /// A load is in flight
    Loading,
    /// The loader succeeded
    Loaded(Arc<AssetDescriptor>),
    /// The loader failed; the next request retries
    Error(AssetError),
    /// Requests for this id are served by another id
    Proxied(String),
}

/// Point-in-time snapshot of one asset, after proxy resolution.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Category of the asset
    pub kind: AssetKind,
    /// Final id after following the proxy chain
    pub id: String,
    /// State of the entry at that id
    pub state: AssetState,
}

struct Entry {
    state: AssetState,
    generation: u64,
    waiters: Vec<oneshot::Sender<LoadResult>>,
}

struct CacheInner {
    entries: IndexMap<(AssetKind, String), Entry>,
    /// Proxies whose target has not resolved yet: (kind, source, target)
    deferred: Vec<(AssetKind, String, String)>,
    next_generation: u64,
}

/// Shared asset cache over a pluggable [`AssetLoader`].
pub struct AssetCache {
    loader: Arc<dyn AssetLoader>,
    inner: Mutex<CacheInner>,
}

impl AssetCache {
    /// Create a cache dispatching loads to `loader`
    pub fn new(loader: Arc<dyn AssetLoader>) -> Arc<Self> {
        Arc::new(Self {
            loader,
            inner: Mutex::new(CacheInner {
                entries: IndexMap::new(),
                deferred: Vec::new(),
                next_generation: 0,
            }),
        })
    }

    /// Snapshot an asset's state without triggering a load.
    ///
    /// Follows the proxy chain; the returned id is the final one.
    pub fn lookup(&self, kind: AssetKind, id: &str) -> Option<Asset> {
        let inner = self.inner.lock();
        let final_id = follow_chain(&inner, kind, id);
        let entry = inner.entries.get(&(kind, final_id.clone()))?;
        Some(Asset {
            kind,
            id: final_id,
            state: entry.state.clone(),
        })
    }

    /// Request an asset, starting a load if none is in flight.
    ///
    /// Concurrent requests for one id share a single loader dispatch. A
    /// request for an id in the error state supersedes the error and
    /// dispatches again.
    pub fn request(self: &Arc<Self>, kind: AssetKind, id: &str) -> LoadHandle {
        let (tx, rx) = oneshot::channel();
        let ticket = {
            let mut inner = self.inner.lock();
            let final_id = follow_chain(&inner, kind, id);
            let key = (kind, final_id.clone());
            let needs_dispatch = match inner.entries.get(&key).map(|e| e.state.clone()) {
                Some(AssetState::Loading) => {
                    entry_mut(&mut inner, &key).waiters.push(tx);
                    false
                }
                Some(AssetState::Loaded(descriptor)) => {
                    let _ = tx.send(Ok(descriptor));
                    false
                }
                Some(AssetState::Error(_)) => {
                    tracing::debug!(id = %final_id, "retrying failed asset");
                    let entry = entry_mut(&mut inner, &key);
                    entry.state = AssetState::Loading;
                    entry.waiters.push(tx);
                    true
                }
                Some(AssetState::Proxied(_)) => unreachable!("chain was followed to its end"),
                None => {
                    inner.entries.insert(
                        key,
                        Entry {
                            state: AssetState::Loading,
                            generation: 0,
                            waiters: vec![tx],
                        },
                    );
                    true
                }
            };
            needs_dispatch.then(|| self.issue_ticket(&mut inner, kind, final_id))
        };
        if let Some((id, ticket)) = ticket {
            tracing::debug!(%id, kind = kind.name(), "dispatching load");
            self.loader.load(kind, &id, ticket);
        }
        LoadHandle::new(rx)
    }

    /// Redirect requests for `source` to `target`.
    ///
    /// If the target is still loading (or not yet requested), the proxy is
    /// deferred and applied when the target resolves; the source's pending
    /// waiters then receive the target's result. Fails with
    /// [`AssetError::ProxyCycle`] if the target's chain leads back to the
    /// source, and with [`AssetError::UnknownAsset`] if the source was never
    /// requested.
    pub fn request_proxy(
        self: &Arc<Self>,
        kind: AssetKind,
        source: &str,
        target: &str,
    ) -> Result<(), AssetError> {
        if source == target {
            return Err(AssetError::ProxyCycle(source.into()));
        }
        let ticket = {
            let mut inner = self.inner.lock();
            if !inner.entries.contains_key(&(kind, source.to_owned())) {
                return Err(AssetError::UnknownAsset(source.into()));
            }
            let final_target = follow_chain(&inner, kind, target);
            if final_target == source {
                return Err(AssetError::ProxyCycle(source.into()));
            }
            match inner.entries.get(&(kind, final_target.clone())).map(|e| e.state.clone()) {
                Some(AssetState::Loaded(descriptor)) => {
                    apply_proxy(&mut inner, kind, source, &final_target, Ok(descriptor));
                    None
                }
                Some(AssetState::Error(err)) => {
                    apply_proxy(&mut inner, kind, source, &final_target, Err(err));
                    None
                }
                Some(AssetState::Loading) => {
                    inner
                        .deferred
                        .push((kind, source.to_owned(), final_target));
                    None
                }
                Some(AssetState::Proxied(_)) => unreachable!("chain was followed to its end"),
                None => {
                    // target never requested: load it, defer the rewrite
                    inner.entries.insert(
                        (kind, final_target.clone()),
                        Entry {
                            state: AssetState::Loading,
                            generation: 0,
                            waiters: Vec::new(),
                        },
                    );
                    inner
                        .deferred
                        .push((kind, source.to_owned(), final_target.clone()));
                    Some(self.issue_ticket(&mut inner, kind, final_target))
                }
            }
        };
        if let Some((id, ticket)) = ticket {
            tracing::debug!(%id, kind = kind.name(), "dispatching proxy target load");
            self.loader.load(kind, &id, ticket);
        }
        Ok(())
    }

    /// Complete a load started by [`AssetCache::request`].
    ///
    /// Exactly-once: completing an entry that already left the loading
    /// state fails with [`AssetError::DuplicateCompletion`].
    pub fn complete(&self, kind: AssetKind, id: &str, result: LoadResult) -> Result<(), AssetError> {
        self.complete_generation(kind, id, None, result)
    }

    /// Drop an entry. Pending waiters observe [`AssetError::Cancelled`];
    /// deferred proxies involving the id are discarded.
    pub fn invalidate(&self, kind: AssetKind, id: &str) {
        let mut inner = self.inner.lock();
        inner.entries.shift_remove(&(kind, id.to_owned()));
        inner
            .deferred
            .retain(|(k, source, target)| *k != kind || (source != id && target != id));
        tracing::debug!(%id, kind = kind.name(), "invalidated asset");
    }

    /// After a failed load, ask `rewriter` for a replacement id; on a
    /// proposal, request the replacement and proxy the failed id to it.
    ///
    /// Returns `None` when the entry is not in the error state or the
    /// rewriter declines.
    pub fn apply_rewrite(
        self: &Arc<Self>,
        rewriter: &dyn IdRewriter,
        kind: AssetKind,
        id: &str,
    ) -> Option<LoadHandle> {
        let cause = {
            let inner = self.inner.lock();
            match inner.entries.get(&(kind, id.to_owned())).map(|e| &e.state) {
                Some(AssetState::Error(err)) => err.clone(),
                _ => return None,
            }
        };
        let new_id = rewriter.propose(kind, id, &cause)?;
        tracing::debug!(%id, %new_id, "rewriting failed asset id");
        let handle = self.request(kind, &new_id);
        if let Err(err) = self.request_proxy(kind, id, &new_id) {
            tracing::warn!(%id, %err, "could not proxy rewritten asset");
        }
        Some(handle)
    }

    fn issue_ticket(
        self: &Arc<Self>,
        inner: &mut CacheInner,
        kind: AssetKind,
        id: String,
    ) -> (String, CompletionTicket) {
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let entry = inner
            .entries
            .get_mut(&(kind, id.clone()))
            .expect("entry inserted by caller");
        entry.generation = generation;
        let ticket = CompletionTicket::new(Arc::downgrade(self), kind, id.clone(), generation);
        (id, ticket)
    }

    pub(crate) fn complete_generation(
        &self,
        kind: AssetKind,
        id: &str,
        generation: Option<u64>,
        result: LoadResult,
    ) -> Result<(), AssetError> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(&(kind, id.to_owned()))
            .ok_or_else(|| AssetError::UnknownAsset(id.into()))?;
        let live = matches!(entry.state, AssetState::Loading)
            && generation.map_or(true, |g| g == entry.generation);
        if !live {
            return Err(AssetError::DuplicateCompletion(id.into()));
        }
        entry.state = match &result {
            Ok(descriptor) => AssetState::Loaded(descriptor.clone()),
            Err(err) => {
                tracing::warn!(%id, %err, "asset load failed");
                AssetState::Error(err.clone())
            }
        };
        for waiter in entry.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }

        // apply proxies that were waiting for this target
        let ready: Vec<(AssetKind, String, String)> = {
            let (ready, pending) = inner
                .deferred
                .drain(..)
                .partition(|(k, _, target)| *k == kind && target == id);
            inner.deferred = pending;
            ready
        };
        for (k, source, target) in ready {
            apply_proxy(&mut inner, k, &source, &target, result.clone());
        }
        Ok(())
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("AssetCache")
            .field("entries", &inner.entries.len())
            .field("deferred", &inner.deferred.len())
            .finish()
    }
}

fn entry_mut<'a>(inner: &'a mut CacheInner, key: &(AssetKind, String)) -> &'a mut Entry {
    inner.entries.get_mut(key).expect("entry checked by caller")
}

/// Follow the proxy chain from `id` to its final id.
fn follow_chain(inner: &CacheInner, kind: AssetKind, id: &str) -> String {
    let mut current = id.to_owned();
    while let Some(entry) = inner.entries.get(&(kind, current.clone())) {
        match &entry.state {
            AssetState::Proxied(target) => current = target.clone(),
            _ => break,
        }
    }
    current
}

/// Point `source` at `target` and hand `result` to the source's waiters.
fn apply_proxy(
    inner: &mut CacheInner,
    kind: AssetKind,
    source: &str,
    target: &str,
    result: LoadResult,
) {
    if let Some(entry) = inner.entries.get_mut(&(kind, source.to_owned())) {
        entry.state = AssetState::Proxied(target.to_owned());
        for waiter in entry.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
        tracing::debug!(%source, %target, "proxy applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader that parks every ticket for the test to resolve by hand.
    #[derive(Default)]
    struct ManualLoader {
        tickets: Mutex<Vec<(String, CompletionTicket)>>,
        calls: AtomicUsize,
    }

    impl ManualLoader {
        fn take(&self, id: &str) -> CompletionTicket {
            let mut tickets = self.tickets.lock();
            let index = tickets
                .iter()
                .position(|(t, _)| t == id)
                .unwrap_or_else(|| panic!("no pending load for {id}"));
            tickets.remove(index).1
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AssetLoader for ManualLoader {
        fn load(&self, _kind: AssetKind, id: &str, ticket: CompletionTicket) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tickets.lock().push((id.to_owned(), ticket));
        }
    }

    fn fixture() -> (Arc<ManualLoader>, Arc<AssetCache>) {
        let loader = Arc::new(ManualLoader::default());
        let cache = AssetCache::new(loader.clone());
        (loader, cache)
    }

    fn descriptor(id: &str) -> Arc<AssetDescriptor> {
        Arc::new(AssetDescriptor::new(AssetKind::Media, id))
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_dispatch() {
        let (loader, cache) = fixture();
        let h1 = cache.request(AssetKind::Media, "clip.mov");
        let h2 = cache.request(AssetKind::Media, "clip.mov");
        let h3 = cache.request(AssetKind::Media, "clip.mov");
        assert_eq!(loader.calls(), 1);

        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        let d1 = h1.resolve().await.expect("load");
        let d2 = h2.resolve().await.expect("load");
        let d3 = h3.resolve().await.expect("load");
        assert!(Arc::ptr_eq(&d1, &d2));
        assert!(Arc::ptr_eq(&d1, &d3));
    }

    #[tokio::test]
    async fn loaded_assets_resolve_without_a_new_dispatch() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "clip.mov");
        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        h.resolve().await.expect("load");

        let again = cache.request(AssetKind::Media, "clip.mov");
        assert_eq!(loader.calls(), 1);
        again.resolve().await.expect("cached");
    }

    #[tokio::test]
    async fn completion_is_exactly_once() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "clip.mov");
        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        h.resolve().await.expect("load");

        assert_eq!(
            cache.complete(AssetKind::Media, "clip.mov", Ok(descriptor("clip.mov"))),
            Err(AssetError::DuplicateCompletion("clip.mov".into()))
        );
        assert_eq!(
            cache.complete(AssetKind::Media, "never-requested", Ok(descriptor("x"))),
            Err(AssetError::UnknownAsset("never-requested".into()))
        );
    }

    #[tokio::test]
    async fn error_is_superseded_by_the_next_request() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "clip.mov");
        loader
            .take("clip.mov")
            .resolve(Err(AssetError::LoadFailed("no such file".into())));
        assert_eq!(
            h.resolve().await,
            Err(AssetError::LoadFailed("no such file".into()))
        );
        let snapshot = cache.lookup(AssetKind::Media, "clip.mov").expect("entry");
        assert!(matches!(snapshot.state, AssetState::Error(_)));

        let retry = cache.request(AssetKind::Media, "clip.mov");
        assert_eq!(loader.calls(), 2);
        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        retry.resolve().await.expect("retry succeeds");
    }

    #[tokio::test]
    async fn dropped_ticket_fails_the_load() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "clip.mov");
        drop(loader.take("clip.mov"));
        assert!(matches!(h.resolve().await, Err(AssetError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn dropped_handle_does_not_disturb_other_waiters() {
        let (loader, cache) = fixture();
        let h1 = cache.request(AssetKind::Media, "clip.mov");
        let h2 = cache.request(AssetKind::Media, "clip.mov");
        drop(h1);
        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        h2.resolve().await.expect("load");
    }

    #[tokio::test]
    async fn invalidation_cancels_pending_waiters() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "clip.mov");
        cache.invalidate(AssetKind::Media, "clip.mov");
        assert_eq!(h.resolve().await, Err(AssetError::Cancelled));
        assert!(cache.lookup(AssetKind::Media, "clip.mov").is_none());
        // the stale ticket is ignored
        loader.take("clip.mov").resolve(Ok(descriptor("clip.mov")));
        assert!(cache.lookup(AssetKind::Media, "clip.mov").is_none());
    }

    #[tokio::test]
    async fn proxy_redirects_lookups_and_requests() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "full.mov");
        loader.take("full.mov").resolve(Ok(descriptor("full.mov")));
        h.resolve().await.expect("load");

        cache
            .request_proxy(AssetKind::Media, "full.mov", "proxy.mov")
            .expect("proxy");
        assert_eq!(loader.calls(), 2);
        loader.take("proxy.mov").resolve(Ok(descriptor("proxy.mov")));

        let snapshot = cache.lookup(AssetKind::Media, "full.mov").expect("entry");
        assert_eq!(snapshot.id, "proxy.mov");
        assert!(matches!(snapshot.state, AssetState::Loaded(_)));

        let d = cache
            .request(AssetKind::Media, "full.mov")
            .resolve()
            .await
            .expect("redirected");
        assert_eq!(d.id, "proxy.mov");
        // no extra dispatch for the redirected request
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn proxy_chains_collapse_to_the_final_id() {
        let (loader, cache) = fixture();
        for id in ["a", "b", "c"] {
            let h = cache.request(AssetKind::Media, id);
            loader.take(id).resolve(Ok(descriptor(id)));
            h.resolve().await.expect("load");
        }
        cache.request_proxy(AssetKind::Media, "a", "b").expect("a -> b");
        cache.request_proxy(AssetKind::Media, "b", "c").expect("b -> c");

        let snapshot = cache.lookup(AssetKind::Media, "a").expect("entry");
        assert_eq!(snapshot.id, "c");
        // a later proxy of something onto "a" binds to "c" directly
        let h = cache.request(AssetKind::Media, "d");
        loader.take("d").resolve(Ok(descriptor("d")));
        h.resolve().await.expect("load");
        cache.request_proxy(AssetKind::Media, "d", "a").expect("d -> a");
        let snapshot = cache.lookup(AssetKind::Media, "d").expect("entry");
        assert_eq!(snapshot.id, "c");
    }

    #[tokio::test]
    async fn proxy_cycles_are_rejected() {
        let (loader, cache) = fixture();
        for id in ["a", "b"] {
            let h = cache.request(AssetKind::Media, id);
            loader.take(id).resolve(Ok(descriptor(id)));
            h.resolve().await.expect("load");
        }
        assert_eq!(
            cache.request_proxy(AssetKind::Media, "a", "a"),
            Err(AssetError::ProxyCycle("a".into()))
        );
        cache.request_proxy(AssetKind::Media, "a", "b").expect("a -> b");
        assert_eq!(
            cache.request_proxy(AssetKind::Media, "b", "a"),
            Err(AssetError::ProxyCycle("b".into()))
        );
    }

    #[tokio::test]
    async fn deferred_proxy_applies_when_the_target_resolves() {
        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "full.mov");
        assert_eq!(loader.calls(), 1);

        // target never requested: the proxy loads it and waits
        cache
            .request_proxy(AssetKind::Media, "full.mov", "proxy.mov")
            .expect("deferred proxy");
        assert_eq!(loader.calls(), 2);

        loader.take("proxy.mov").resolve(Ok(descriptor("proxy.mov")));
        // the source waiter got the target's result
        let d = h.resolve().await.expect("redirected");
        assert_eq!(d.id, "proxy.mov");
        let snapshot = cache.lookup(AssetKind::Media, "full.mov").expect("entry");
        assert_eq!(snapshot.id, "proxy.mov");

        // the source's own stale load is ignored
        loader.take("full.mov").resolve(Ok(descriptor("full.mov")));
        let snapshot = cache.lookup(AssetKind::Media, "full.mov").expect("entry");
        assert_eq!(snapshot.id, "proxy.mov");
    }

    #[tokio::test]
    async fn proxying_an_unknown_source_fails() {
        let (_loader, cache) = fixture();
        assert_eq!(
            cache.request_proxy(AssetKind::Media, "ghost.mov", "proxy.mov"),
            Err(AssetError::UnknownAsset("ghost.mov".into()))
        );
    }

    #[tokio::test]
    async fn rewrite_retries_failed_ids_under_a_proxy() {
        struct Downscale;
        impl IdRewriter for Downscale {
            fn propose(&self, _kind: AssetKind, id: &str, _cause: &AssetError) -> Option<String> {
                Some(format!("{id}.proxy"))
            }
        }

        let (loader, cache) = fixture();
        let h = cache.request(AssetKind::Media, "full.mov");
        loader
            .take("full.mov")
            .resolve(Err(AssetError::LoadFailed("decode error".into())));
        h.resolve().await.expect_err("first load fails");

        let handle = cache
            .apply_rewrite(&Downscale, AssetKind::Media, "full.mov")
            .expect("rewrite proposed");
        loader
            .take("full.mov.proxy")
            .resolve(Ok(descriptor("full.mov.proxy")));
        let d = handle.resolve().await.expect("rewritten load");
        assert_eq!(d.id, "full.mov.proxy");

        let snapshot = cache.lookup(AssetKind::Media, "full.mov").expect("entry");
        assert_eq!(snapshot.id, "full.mov.proxy");

        // a loaded entry is not rewritten again
        assert!(cache
            .apply_rewrite(&Downscale, AssetKind::Media, "full.mov")
            .is_none());
    }

    #[tokio::test]
    async fn kinds_are_separate_namespaces() {
        let (loader, cache) = fixture();
        let h1 = cache.request(AssetKind::Media, "same-id");
        let h2 = cache.request(AssetKind::Project, "same-id");
        assert_eq!(loader.calls(), 2);
        loader.take("same-id").resolve(Ok(descriptor("same-id")));
        loader.take("same-id").resolve(Ok(descriptor("same-id")));
        h1.resolve().await.expect("media");
        h2.resolve().await.expect("project");
    }
}
