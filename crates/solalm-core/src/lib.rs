//! Donation orchestration and aggregation for solalm.
//!
//! - [`FeaturedFragmentCache`]: TTL-bounded featured fragment with a persisted
//!   snapshot and a periodic background refresh.
//! - [`DonationPipeline`]: fragment fetch, image generation and address
//!   resolution for one donation.
//! - [`ContributionLedger`] / [`LeaderboardAggregator`]: the two aggregate
//!   views fed by every successful donation.
//! - [`Session`]: owns all of the above for one running client.

pub mod amount;
pub mod clock;
pub mod config;
pub mod error;
pub mod fragment_cache;
pub mod identity;
pub mod leaderboard;
pub mod ledger;
pub mod pipeline;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use amount::{Amount, AmountError, PRESET_AMOUNTS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{ConfigError, PipelineError, SessionError};
pub use fragment_cache::{
    CachedFragment, FEATURED_TTL, FeaturedFragmentCache, SNAPSHOT_KEY, fallback_fragment,
};
pub use identity::{Address, AddressGenerator, RandomAddressGenerator, SessionIdentity};
pub use leaderboard::{LeaderboardAggregator, LeaderboardEntry};
pub use ledger::{Contribution, ContributionLedger};
pub use pipeline::{DonationPipeline, DonationReceipt, RewardRecord};
pub use session::{Donation, Session, SessionBuilder};

pub use solalm_llm::{FragmentMode, ImageHandle, TextFragment};
