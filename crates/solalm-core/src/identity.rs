//! Ephemeral contributor addresses.
//!
//! Addresses are cosmetic display strings shaped like base58 wallet keys.
//! They are never validated and carry no key material.

use std::fmt;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const ADDRESS_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
pub const ADDRESS_LEN: usize = 44;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `abcd...wxyz` form used in headers and tables.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

pub trait AddressGenerator: Send + Sync {
    fn generate(&self) -> Address;
}

/// Uniform draws from the base58 alphabet.
#[derive(Debug)]
pub struct RandomAddressGenerator {
    rng: Mutex<StdRng>,
}

impl RandomAddressGenerator {
    /// Seeded from the operating system.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    pub fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomAddressGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressGenerator for RandomAddressGenerator {
    fn generate(&self) -> Address {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let value = (0..ADDRESS_LEN)
            .map(|_| char::from(ADDRESS_ALPHABET[rng.random_range(0..ADDRESS_ALPHABET.len())]))
            .collect();
        Address(value)
    }
}

/// The contributor address of the running session, if any.
pub struct SessionIdentity {
    current: Option<Address>,
    generator: Arc<dyn AddressGenerator>,
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("current", &self.current)
            .finish()
    }
}

impl SessionIdentity {
    pub fn new(generator: Arc<dyn AddressGenerator>) -> Self {
        Self {
            current: None,
            generator,
        }
    }

    /// Mint a fresh address and make it current, replacing any previous one.
    pub fn connect(&mut self) -> Address {
        let address = self.generator.generate();
        self.current = Some(address.clone());
        address
    }

    pub fn disconnect(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Address> {
        self.current.as_ref()
    }

    /// Adopt `address` only when no identity is set. Returns whether it was adopted.
    pub fn adopt_if_unset(&mut self, address: &Address) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(address.clone());
        true
    }
}
