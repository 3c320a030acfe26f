use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quick-pick donation amounts offered by the form.
pub const PRESET_AMOUNTS: [f64; 4] = [0.1, 0.5, 1.0, 2.5];

#[derive(Clone, Debug, PartialEq, Error)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("amount must be finite")]
    NotFinite,
    #[error("amount must be greater than zero, got {0}")]
    NotPositive(f64),
    #[error("total of {0} and {1} is too large")]
    Overflow(f64, f64),
}

/// A strictly positive, finite donation amount.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if value <= 0.0 {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Sum of two amounts, or `Overflow` when it is no longer finite.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountError> {
        let sum = self.0 + rhs.0;
        if sum.is_finite() {
            Ok(Amount(sum))
        } else {
            Err(AmountError::Overflow(self.0, rhs.0))
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;
        Amount::new(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
