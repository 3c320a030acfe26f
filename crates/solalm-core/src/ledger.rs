//! Append-only chronological log of accepted donations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::identity::Address;

/// One accepted donation. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,
    pub address: Address,
    pub amount: Amount,
}

impl Contribution {
    /// New contribution with a fresh random id.
    pub fn new(address: Address, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            address,
            amount,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContributionLedger {
    entries: Vec<Contribution>,
}

impl ContributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, contribution: Contribution) {
        self.entries.push(contribution);
    }

    /// All contributions, oldest first.
    pub fn entries(&self) -> &[Contribution] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
