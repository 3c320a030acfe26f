//! One donation, end to end.
//!
//! Each step consumes the previous step's output type, and only the last
//! step produces a [`DonationReceipt`]. Nothing outside this module can build
//! a receipt, so aggregate state can only be touched after both provider
//! calls succeeded. There are no retries and no timeouts here; a hung
//! provider call hangs the run.

use std::sync::Arc;

use serde::Serialize;
use solalm_llm::{
    DynFragmentProvider, DynImageProvider, FragmentMode, ImageHandle, TextFragment,
};
use tracing::{debug, warn};

use crate::amount::Amount;
use crate::error::PipelineError;
use crate::identity::{Address, AddressGenerator};

/// The fragment and its illustration handed back to the donor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RewardRecord {
    pub fragment: TextFragment,
    pub image: ImageHandle,
}

/// Terminal success payload of a pipeline run.
#[derive(Debug)]
pub struct DonationReceipt {
    reward: RewardRecord,
    resolved_address: Address,
    minted_address: bool,
    amount: Amount,
}

impl DonationReceipt {
    pub fn reward(&self) -> &RewardRecord {
        &self.reward
    }

    pub fn resolved_address(&self) -> &Address {
        &self.resolved_address
    }

    /// Whether the address was minted for this run rather than taken from
    /// the caller's identity.
    pub fn minted_address(&self) -> bool {
        self.minted_address
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub(crate) fn into_parts(self) -> (RewardRecord, Address, Amount) {
        (self.reward, self.resolved_address, self.amount)
    }
}

struct FragmentAcquired {
    fragment: TextFragment,
}

struct Illustrated {
    reward: RewardRecord,
}

pub struct DonationPipeline {
    fragments: DynFragmentProvider,
    images: DynImageProvider,
    addresses: Arc<dyn AddressGenerator>,
}

impl std::fmt::Debug for DonationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DonationPipeline")
            .field("fragments", &self.fragments.name())
            .field("images", &self.images.name())
            .finish()
    }
}

impl DonationPipeline {
    pub fn new(
        fragments: DynFragmentProvider,
        images: DynImageProvider,
        addresses: Arc<dyn AddressGenerator>,
    ) -> Self {
        Self {
            fragments,
            images,
            addresses,
        }
    }

    /// Run one donation. `amount` must already be validated by the caller,
    /// which the [`Amount`] type guarantees.
    pub async fn process(
        &self,
        amount: Amount,
        current_identity: Option<&Address>,
    ) -> Result<DonationReceipt, PipelineError> {
        let acquired = self.acquire_fragment().await?;
        let illustrated = self.illustrate(acquired).await?;
        Ok(self.resolve_address(illustrated, amount, current_identity))
    }

    async fn acquire_fragment(&self) -> Result<FragmentAcquired, PipelineError> {
        match self.fragments.fetch(FragmentMode::General).await {
            Ok(fragment) => {
                debug!(reference = %fragment.reference, "donation fragment acquired");
                Ok(FragmentAcquired { fragment })
            }
            Err(err) => {
                warn!(provider = self.fragments.name(), error = %err, "fragment fetch failed");
                Err(PipelineError::FragmentFetch(err))
            }
        }
    }

    async fn illustrate(&self, acquired: FragmentAcquired) -> Result<Illustrated, PipelineError> {
        let FragmentAcquired { fragment } = acquired;
        match self.images.generate(&fragment.text).await {
            Ok(image) => Ok(Illustrated {
                reward: RewardRecord { fragment, image },
            }),
            Err(err) => {
                warn!(
                    provider = self.images.name(),
                    reference = %fragment.reference,
                    error = %err,
                    "image generation failed; discarding fragment"
                );
                Err(PipelineError::ImageGeneration(err))
            }
        }
    }

    fn resolve_address(
        &self,
        illustrated: Illustrated,
        amount: Amount,
        current_identity: Option<&Address>,
    ) -> DonationReceipt {
        let (resolved_address, minted_address) = match current_identity {
            Some(address) => (address.clone(), false),
            None => (self.addresses.generate(), true),
        };
        DonationReceipt {
            reward: illustrated.reward,
            resolved_address,
            minted_address,
            amount,
        }
    }
}
