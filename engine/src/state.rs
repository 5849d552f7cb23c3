//! The explicit store object every operation reads and writes.

use serde::{Deserialize, Serialize};

use crate::config::{Tokenomics, DEFAULT_MAX_BATCH_SIZE};
use crate::error::{CustodyError, ValidationError};
use crate::pools::{FundingPool, PoolKind, PoolSet};
use crate::registry::WalletRegistry;

/// Registry, pools and configuration slots of one deployment.
///
/// Capability addresses are not stored here; they belong to the
/// [`Authority`](crate::authority::Authority) collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyState {
    /// One record per address ever touched.
    pub registry: WalletRegistry,
    /// Growth, team and reward pools.
    pub pools: PoolSet,
    /// Caps and rates, fixed at creation.
    pub tokenomics: Tokenomics,
    /// Maximum number of items accepted by one reward batch.
    pub max_batch_size: usize,
}

impl CustodyState {
    /// Fresh state for `tokenomics`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidAmount`] if the tokenomics are inconsistent.
    pub fn new(tokenomics: Tokenomics) -> Result<Self, CustodyError> {
        if let Err(reason) = tokenomics.validate() {
            tracing::warn!(reason, "rejected tokenomics");
            return Err(ValidationError::InvalidAmount.into());
        }
        Ok(Self {
            registry: WalletRegistry::new(),
            pools: PoolSet::new(&tokenomics),
            tokenomics,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        })
    }

    /// Shorthand for `self.pools.get(kind)`.
    pub fn pool(&self, kind: PoolKind) -> &FundingPool {
        self.pools.get(kind)
    }
}

impl Default for CustodyState {
    fn default() -> Self {
        let tokenomics = Tokenomics::default();
        Self {
            registry: WalletRegistry::new(),
            pools: PoolSet::new(&tokenomics),
            tokenomics,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}
