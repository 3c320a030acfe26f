//! Featured fragment with a time-to-live.
//!
//! Two paths refresh the slot: `get()` when the cached entry is stale, and a
//! background timer firing every TTL. Both go through `refresh_lock`, so at
//! most one provider call is in flight. The slot itself sits behind a
//! `RwLock` and is only ever replaced wholesale, so readers see either the
//! old `{fragment, timestamp}` pair or the new one.
//!
//! A failed refresh serves [`fallback_fragment`] and leaves the slot alone;
//! the next `get()` tries again.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solalm_llm::{DynFragmentProvider, FragmentMode, TextFragment};
use solalm_store::{DynKvStore, get_json, put_json};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::Clock;

pub const FEATURED_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Store key for the persisted snapshot.
pub const SNAPSHOT_KEY: &str = "featured_fragment";

pub fn fallback_fragment() -> TextFragment {
    TextFragment::new(
        "And he that sat upon the throne said, Behold, I make all things new.",
        "Revelation 21:5",
    )
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedFragment {
    pub fragment: TextFragment,
    pub fetched_at_epoch_ms: u64,
}

impl CachedFragment {
    pub fn is_stale(&self, now_ms: u64, ttl: Duration) -> bool {
        u128::from(now_ms.saturating_sub(self.fetched_at_epoch_ms)) >= ttl.as_millis()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    OnDemand,
    Timer,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::OnDemand => "on_demand",
            Trigger::Timer => "timer",
        }
    }
}

pub struct FeaturedFragmentCache {
    provider: DynFragmentProvider,
    store: Option<DynKvStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: RwLock<Option<CachedFragment>>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for FeaturedFragmentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturedFragmentCache")
            .field("provider", &self.provider.name())
            .field("ttl", &self.ttl)
            .field("cached", &self.cached())
            .finish()
    }
}

impl FeaturedFragmentCache {
    pub fn new(provider: DynFragmentProvider, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            provider,
            store: None,
            clock,
            ttl,
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Persist refreshed entries to `store`, seeding the slot from any
    /// snapshot already there. An unreadable snapshot is logged and ignored.
    pub fn with_store(mut self, store: DynKvStore) -> Self {
        match get_json::<CachedFragment>(store.as_ref(), SNAPSHOT_KEY) {
            Ok(Some(snapshot)) => {
                debug!(
                    fetched_at_epoch_ms = snapshot.fetched_at_epoch_ms,
                    "seeded featured fragment from snapshot"
                );
                self.slot = RwLock::new(Some(snapshot));
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring unreadable featured fragment snapshot"),
        }
        self.store = Some(store);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current slot contents without triggering a refresh.
    pub fn cached(&self) -> Option<CachedFragment> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Best-known fragment, refreshing first when the cached one is stale.
    pub async fn get(&self) -> TextFragment {
        if let Some(fresh) = self.fresh_entry() {
            debug!("featured fragment served from cache");
            return fresh.fragment;
        }
        self.refresh_with(Trigger::OnDemand).await
    }

    /// Fetch a new fragment regardless of staleness.
    pub async fn refresh(&self) -> TextFragment {
        self.refresh_with(Trigger::Timer).await
    }

    /// Refresh every TTL on the current runtime, first firing one TTL from now.
    ///
    /// A TTL too large to schedule leaves the timer off; `get()` still
    /// refreshes on demand.
    pub fn spawn_refresh_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.ttl;
        tokio::spawn(async move {
            let Some(start) = Instant::now().checked_add(period) else {
                warn!(ttl = ?period, "featured fragment TTL too large to schedule; timer disabled");
                return;
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.refresh().await;
            }
        })
    }

    fn fresh_entry(&self) -> Option<CachedFragment> {
        let now = self.clock.now_ms();
        self.cached().filter(|entry| !entry.is_stale(now, self.ttl))
    }

    async fn refresh_with(&self, trigger: Trigger) -> TextFragment {
        let _guard = self.refresh_lock.lock().await;
        if trigger == Trigger::OnDemand {
            // A concurrent refresh may have completed while we waited.
            if let Some(fresh) = self.fresh_entry() {
                return fresh.fragment;
            }
        }

        match self.provider.fetch(FragmentMode::Revelation).await {
            Ok(fragment) => {
                let entry = self.install(fragment);
                info!(
                    trigger = trigger.as_str(),
                    reference = %entry.fragment.reference,
                    "featured fragment refreshed"
                );
                self.persist(&entry);
                entry.fragment
            }
            Err(err) => {
                warn!(
                    trigger = trigger.as_str(),
                    provider = self.provider.name(),
                    error = %err,
                    "featured fragment refresh failed; serving fallback"
                );
                fallback_fragment()
            }
        }
    }

    fn install(&self, fragment: TextFragment) -> CachedFragment {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = self.clock.now_ms();
        let fetched_at_epoch_ms = slot
            .as_ref()
            .map_or(now, |previous| now.max(previous.fetched_at_epoch_ms));
        let entry = CachedFragment {
            fragment,
            fetched_at_epoch_ms,
        };
        *slot = Some(entry.clone());
        entry
    }

    fn persist(&self, entry: &CachedFragment) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = put_json(store.as_ref(), SNAPSHOT_KEY, entry) {
            warn!(error = %err, "failed to persist featured fragment snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::test_support::{ScriptedFragments, fragment, server_error};
    use solalm_store::{FsKvStore, KvStore, MemKvStore};
    use tempfile::TempDir;

    const T0: u64 = 1_700_000_000_000;
    const TTL_MS: u64 = 3 * 60 * 60 * 1000;

    fn cache_with(
        provider: &Arc<ScriptedFragments>,
        clock: &Arc<ManualClock>,
    ) -> FeaturedFragmentCache {
        FeaturedFragmentCache::new(provider.clone(), clock.clone(), FEATURED_TTL)
    }

    fn snapshot_store(entry: &CachedFragment) -> Arc<MemKvStore> {
        let store = Arc::new(MemKvStore::new());
        put_json(store.as_ref(), SNAPSHOT_KEY, entry).unwrap();
        store
    }

    #[test]
    fn staleness_boundary_is_inclusive() {
        let entry = CachedFragment {
            fragment: fragment("x", "y"),
            fetched_at_epoch_ms: T0,
        };
        assert!(!entry.is_stale(T0 + TTL_MS - 1, FEATURED_TTL));
        assert!(entry.is_stale(T0 + TTL_MS, FEATURED_TTL));
        // A clock that went backwards reads as age zero.
        assert!(!entry.is_stale(T0 - 5, FEATURED_TTL));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fresh_snapshot_skips_provider_until_ttl_elapses() {
        let seeded = fragment("I am Alpha and Omega", "Revelation 1:8");
        let store = snapshot_store(&CachedFragment {
            fragment: seeded.clone(),
            fetched_at_epoch_ms: T0,
        });
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment(
            "Behold, I come quickly",
            "Revelation 22:12",
        ))));
        let clock = Arc::new(ManualClock::new(T0 + TTL_MS - 1));
        let cache = cache_with(&provider, &clock).with_store(store.clone());

        assert_eq!(cache.get().await, seeded);
        assert_eq!(provider.calls(), 0);

        clock.set(T0 + TTL_MS + 1);
        let refreshed = cache.get().await;
        assert_eq!(refreshed.reference, "Revelation 22:12");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.modes(), vec![FragmentMode::Revelation]);

        // Served from cache again, and the new entry was persisted.
        assert_eq!(cache.get().await, refreshed);
        assert_eq!(provider.calls(), 1);
        let persisted: CachedFragment = get_json(store.as_ref(), SNAPSHOT_KEY).unwrap().unwrap();
        assert_eq!(persisted.fragment, refreshed);
        assert_eq!(persisted.fetched_at_epoch_ms, T0 + TTL_MS + 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn empty_cache_fetches_on_first_get() {
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("a", "Revelation 4:8"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock);

        assert!(cache.cached().is_none());
        assert_eq!(cache.get().await.reference, "Revelation 4:8");
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.cached().unwrap().fetched_at_epoch_ms, T0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_refresh_serves_fallback_and_keeps_timestamp() {
        let store = snapshot_store(&CachedFragment {
            fragment: fragment("old", "Revelation 2:10"),
            fetched_at_epoch_ms: T0,
        });
        let provider = Arc::new(ScriptedFragments::always(Err(server_error())));
        let clock = Arc::new(ManualClock::new(T0 + TTL_MS + 1));
        let cache = cache_with(&provider, &clock).with_store(store.clone());

        let served = cache.get().await;
        assert_eq!(served, fallback_fragment());
        assert_eq!(served.text, "And he that sat upon the throne said, Behold, I make all things new.");
        assert_eq!(served.reference, "Revelation 21:5");
        assert_eq!(cache.cached().unwrap().fetched_at_epoch_ms, T0);

        let persisted: CachedFragment = get_json(store.as_ref(), SNAPSHOT_KEY).unwrap().unwrap();
        assert_eq!(persisted.fetched_at_epoch_ms, T0);
        assert_eq!(persisted.fragment.reference, "Revelation 2:10");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_refresh_is_retried_on_next_get() {
        let provider = Arc::new(ScriptedFragments::sequence(
            vec![Err(server_error()), Err(server_error())],
            Ok(fragment("recovered", "Revelation 21:4")),
        ));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock);

        assert_eq!(cache.get().await, fallback_fragment());
        assert_eq!(cache.get().await, fallback_fragment());
        assert_eq!(cache.get().await.reference, "Revelation 21:4");
        assert_eq!(provider.calls(), 3);
        assert_eq!(cache.get().await.reference, "Revelation 21:4");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_stale_gets_share_one_refresh() {
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("one", "Revelation 5:13"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock);

        let (a, b, c) = tokio::join!(cache.get(), cache.get(), cache.get());
        assert_eq!(provider.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn timer_refresh_ignores_staleness() {
        let provider = Arc::new(ScriptedFragments::sequence(
            vec![Ok(fragment("first", "Revelation 1:1"))],
            Ok(fragment("second", "Revelation 1:2")),
        ));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock);

        cache.get().await;
        clock.advance_ms(10);
        assert_eq!(cache.refresh().await.reference, "Revelation 1:2");
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.cached().unwrap().fetched_at_epoch_ms, T0 + 10);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn timestamps_never_move_backwards() {
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("x", "Revelation 3:20"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock);

        cache.refresh().await;
        clock.set(T0 - 60_000);
        cache.refresh().await;
        assert_eq!(cache.cached().unwrap().fetched_at_epoch_ms, T0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unreadable_snapshot_is_ignored() {
        let store = Arc::new(MemKvStore::new());
        store.put(SNAPSHOT_KEY, "{broken").unwrap();
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("x", "Revelation 7:17"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = cache_with(&provider, &clock).with_store(store);

        assert!(cache.cached().is_none());
        assert_eq!(cache.get().await.reference, "Revelation 7:17");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn snapshot_survives_restart_within_ttl() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(T0));
        {
            let provider = Arc::new(ScriptedFragments::always(Ok(fragment("x", "Revelation 19:6"))));
            let store = Arc::new(FsKvStore::open(dir.path()).unwrap());
            let cache = cache_with(&provider, &clock).with_store(store);
            cache.get().await;
            assert_eq!(provider.calls(), 1);
        }

        clock.advance_ms(TTL_MS / 2);
        let provider = Arc::new(ScriptedFragments::always(Err(server_error())));
        let store = Arc::new(FsKvStore::open(dir.path()).unwrap());
        let cache = cache_with(&provider, &clock).with_store(store);
        assert_eq!(cache.get().await.reference, "Revelation 19:6");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn background_timer_fires_every_ttl() {
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("x", "Revelation 22:13"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = Arc::new(cache_with(&provider, &clock));

        let handle = cache.spawn_refresh_timer();
        tokio::time::sleep(FEATURED_TTL - Duration::from_secs(1)).await;
        assert_eq!(provider.calls(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(provider.calls(), 1);

        tokio::time::sleep(FEATURED_TTL).await;
        assert_eq!(provider.calls(), 2);

        handle.abort();
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn unschedulable_ttl_disables_timer_without_panicking() {
        let provider = Arc::new(ScriptedFragments::always(Ok(fragment("x", "Revelation 22:13"))));
        let clock = Arc::new(ManualClock::new(T0));
        let cache = Arc::new(FeaturedFragmentCache::new(
            provider.clone(),
            clock,
            Duration::from_secs(u64::MAX),
        ));

        cache.spawn_refresh_timer().await.unwrap();
        assert_eq!(provider.calls(), 0);
        assert_eq!(cache.get().await.reference, "Revelation 22:13");
    }
}
