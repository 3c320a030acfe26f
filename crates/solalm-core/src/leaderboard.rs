//! Address-keyed running totals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::amount::{Amount, AmountError};
use crate::identity::Address;
use crate::ledger::Contribution;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub address: Address,
    pub total_amount: Amount,
}

/// One running total per address.
///
/// The map keeps addresses in order of first appearance; replacing a total
/// keeps its slot, so `snapshot` can break ties by that order with a stable
/// sort. Applying the same contribution twice counts it twice. A total that
/// would overflow is rejected and leaves the aggregator unchanged.
#[derive(Clone, Debug, Default)]
pub struct LeaderboardAggregator {
    totals: IndexMap<Address, Amount>,
}

impl LeaderboardAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a contribution history.
    pub fn replay<'a>(
        contributions: impl IntoIterator<Item = &'a Contribution>,
    ) -> Result<Self, AmountError> {
        let mut aggregator = Self::new();
        for contribution in contributions {
            aggregator.apply(&contribution.address, contribution.amount)?;
        }
        Ok(aggregator)
    }

    /// Add `amount` to the address's total and return the replacement entry.
    pub fn apply(
        &mut self,
        address: &Address,
        amount: Amount,
    ) -> Result<LeaderboardEntry, AmountError> {
        let total_amount = match self.totals.get(address) {
            Some(previous) => previous.checked_add(amount)?,
            None => amount,
        };
        self.totals.insert(address.clone(), total_amount);
        Ok(LeaderboardEntry {
            address: address.clone(),
            total_amount,
        })
    }

    /// Entries ordered by total, largest first; ties by first appearance.
    pub fn snapshot(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .totals
            .iter()
            .map(|(address, total)| LeaderboardEntry {
                address: address.clone(),
                total_amount: *total,
            })
            .collect();
        entries.sort_by(|a, b| b.total_amount.value().total_cmp(&a.total_amount.value()));
        entries
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
