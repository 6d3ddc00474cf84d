//! Credential hashing
//!
//! Standard bcrypt strings (`$2b$<cost>$...`). The cost travels with each
//! hash, so changing the configured cost only affects new credentials, and
//! hashes written by other bcrypt implementations verify as-is.

use anyhow::{Context, Result};
use tracing::debug;

use super::traits::BaseCredentialHasher;

/// Default bcrypt cost
pub const DEFAULT_HASH_COST: u32 = 10;

const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

/// bcrypt-backed hasher
#[derive(Debug, Clone)]
pub struct BcryptCredentialHasher {
    cost: u32,
}

impl BcryptCredentialHasher {
    /// Costs outside bcrypt's 4..=31 range are clamped
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptCredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl BaseCredentialHasher for BcryptCredentialHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost).context("bcrypt hashing failed")
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matched) => matched,
            Err(e) => {
                debug!(error = %e, "Stored credential is not a readable bcrypt hash");
                false
            }
        }
    }
}
