//! The running client: owns the featured cache, the pipeline and the
//! aggregate views, and is the only place a donation gets committed.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use solalm_llm::{DynFragmentProvider, DynImageProvider, TextFragment};
use solalm_store::{DynKvStore, FsKvStore};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::amount::Amount;
use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::fragment_cache::FeaturedFragmentCache;
use crate::identity::{Address, AddressGenerator, RandomAddressGenerator, SessionIdentity};
use crate::leaderboard::{LeaderboardAggregator, LeaderboardEntry};
use crate::ledger::{Contribution, ContributionLedger};
use crate::pipeline::{DonationPipeline, DonationReceipt, RewardRecord};

/// Result of a committed donation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub contribution: Contribution,
    pub reward: RewardRecord,
    /// The donor's leaderboard entry after this donation.
    pub standing: LeaderboardEntry,
    /// Whether the donation's address became the session identity.
    pub adopted_identity: bool,
}

#[derive(Debug)]
struct SessionState {
    identity: SessionIdentity,
    ledger: ContributionLedger,
    leaderboard: LeaderboardAggregator,
}

pub struct SessionBuilder {
    fragments: DynFragmentProvider,
    images: DynImageProvider,
    config: SessionConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<DynKvStore>,
    addresses: Option<Arc<dyn AddressGenerator>>,
}

impl SessionBuilder {
    pub fn new(fragments: DynFragmentProvider, images: DynImageProvider) -> Self {
        Self {
            fragments,
            images,
            config: SessionConfig::default(),
            clock: None,
            store: None,
            addresses: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Snapshot store; takes precedence over `config.state_dir`.
    pub fn store(mut self, store: DynKvStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn address_generator(mut self, addresses: Arc<dyn AddressGenerator>) -> Self {
        self.addresses = Some(addresses);
        self
    }

    pub fn build(self) -> Result<Session, SessionError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let addresses = self
            .addresses
            .unwrap_or_else(|| Arc::new(RandomAddressGenerator::new()));
        let store = match (self.store, &self.config.state_dir) {
            (Some(store), _) => Some(store),
            (None, Some(dir)) => Some(Arc::new(FsKvStore::open(dir)?) as DynKvStore),
            (None, None) => None,
        };

        let mut featured =
            FeaturedFragmentCache::new(self.fragments.clone(), clock, self.config.featured_ttl);
        if let Some(store) = store {
            featured = featured.with_store(store);
        }

        let pipeline = DonationPipeline::new(self.fragments, self.images, addresses.clone());
        debug!(?pipeline, ttl = ?self.config.featured_ttl, "session built");

        Ok(Session {
            config: self.config,
            pipeline,
            featured: Arc::new(featured),
            state: Mutex::new(SessionState {
                identity: SessionIdentity::new(addresses),
                ledger: ContributionLedger::new(),
                leaderboard: LeaderboardAggregator::new(),
            }),
        })
    }
}

pub struct Session {
    config: SessionConfig,
    pipeline: DonationPipeline,
    featured: Arc<FeaturedFragmentCache>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn builder(fragments: DynFragmentProvider, images: DynImageProvider) -> SessionBuilder {
        SessionBuilder::new(fragments, images)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Wait out the settle delay, run the pipeline, then commit.
    ///
    /// Nothing is recorded unless both provider calls succeed and the new
    /// total fits. The identity is read before the pipeline starts; if it is
    /// unset, the minted address is adopted at commit time only when no other
    /// donation adopted one first.
    pub async fn donate(&self, amount: Amount) -> Result<Donation, SessionError> {
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }
        let current = self.identity();
        let receipt = self.pipeline.process(amount, current.as_ref()).await?;
        self.commit(receipt)
    }

    fn commit(&self, receipt: DonationReceipt) -> Result<Donation, SessionError> {
        let minted = receipt.minted_address();
        let (reward, address, amount) = receipt.into_parts();

        let mut state = self.lock_state();
        // The only fallible step runs first so a rejected total records nothing.
        let standing = state.leaderboard.apply(&address, amount)?;
        let contribution = Contribution::new(address.clone(), amount);
        state.ledger.append(contribution.clone());
        let adopted_identity = state.identity.adopt_if_unset(&address);
        drop(state);

        info!(
            id = %contribution.id,
            address = %address.short(),
            amount = %amount,
            total = %standing.total_amount,
            minted,
            "donation recorded"
        );
        Ok(Donation {
            contribution,
            reward,
            standing,
            adopted_identity,
        })
    }

    /// Mint a fresh identity, replacing the current one.
    pub fn connect(&self) -> Address {
        let address = self.lock_state().identity.connect();
        info!(address = %address.short(), "identity connected");
        address
    }

    pub fn disconnect(&self) {
        self.lock_state().identity.disconnect();
        info!("identity disconnected");
    }

    pub fn identity(&self) -> Option<Address> {
        self.lock_state().identity.current().cloned()
    }

    /// Ledger contents, oldest first.
    pub fn contributions(&self) -> Vec<Contribution> {
        self.lock_state().ledger.entries().to_vec()
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.lock_state().leaderboard.snapshot()
    }

    /// Featured fragment, refreshed first when stale.
    pub async fn featured(&self) -> TextFragment {
        self.featured.get().await
    }

    /// When the cached featured fragment was fetched, if one is cached.
    pub fn featured_fetched_at_ms(&self) -> Option<u64> {
        self.featured
            .cached()
            .map(|entry| entry.fetched_at_epoch_ms)
    }

    pub fn spawn_refresh_timer(&self) -> JoinHandle<()> {
        self.featured.spawn_refresh_timer()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
