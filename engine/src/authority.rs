//! # Capability Checks
//!
//! Who may call what is decided outside the engine. The engine only asks
//! an [`Authority`] whether a caller holds a [`Role`], once, at the entry
//! of each privileged operation.
//!
//! [`RoleTable`] is the default policy: one owner plus the two capability
//! slots (whitelister, rewards updater) that a deployment persists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{CustodyError, ValidationError};

/// A capability the engine can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Funds pools, releases growth, burns, migrates, configures.
    Owner,
    /// Enrolls wallets and maintains the allow and deny lists.
    Whitelister,
    /// Submits reward credits.
    RewardsUpdater,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Whitelister => write!(f, "whitelister"),
            Role::RewardsUpdater => write!(f, "rewards-updater"),
        }
    }
}

/// The capability collaborator.
pub trait Authority {
    /// Returns `true` if `caller` currently holds `role`.
    fn has_capability(&self, caller: &Address, role: Role) -> bool;
}

/// Owner plus two optional capability slots.
///
/// The owner implicitly satisfies nothing but [`Role::Owner`]; operations
/// that accept "owner or whitelister" check both roles themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTable {
    owner: Address,
    whitelister: Option<Address>,
    rewards_updater: Option<Address>,
}

impl RoleTable {
    /// A table where only `owner` holds a capability.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            whitelister: None,
            rewards_updater: None,
        }
    }

    /// The owner address.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The whitelister slot.
    pub fn whitelister(&self) -> Option<Address> {
        self.whitelister
    }

    /// The rewards-updater slot.
    pub fn rewards_updater(&self) -> Option<Address> {
        self.rewards_updater
    }

    /// Assigns the whitelister slot. Owner only.
    pub fn grant_whitelister(
        &mut self,
        caller: &Address,
        whitelister: Address,
    ) -> Result<(), CustodyError> {
        self.require_owner(caller)?;
        if whitelister.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        self.whitelister = Some(whitelister);
        tracing::info!(%whitelister, "whitelister capability granted");
        Ok(())
    }

    /// Assigns the rewards-updater slot. Owner only.
    pub fn grant_rewards_updater(
        &mut self,
        caller: &Address,
        updater: Address,
    ) -> Result<(), CustodyError> {
        self.require_owner(caller)?;
        if updater.is_zero() {
            return Err(ValidationError::ZeroAddress.into());
        }
        self.rewards_updater = Some(updater);
        tracing::info!(%updater, "rewards-updater capability granted");
        Ok(())
    }

    fn require_owner(&self, caller: &Address) -> Result<(), CustodyError> {
        if *caller != self.owner {
            return Err(CustodyError::Unauthorized {
                caller: *caller,
                role: Role::Owner,
            });
        }
        Ok(())
    }
}

impl Authority for RoleTable {
    fn has_capability(&self, caller: &Address, role: Role) -> bool {
        match role {
            Role::Owner => *caller == self.owner,
            Role::Whitelister => self.whitelister == Some(*caller),
            Role::RewardsUpdater => self.rewards_updater == Some(*caller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn owner_holds_only_owner_role_by_default() {
        let roles = RoleTable::new(addr(1));
        assert!(roles.has_capability(&addr(1), Role::Owner));
        assert!(!roles.has_capability(&addr(1), Role::Whitelister));
        assert!(!roles.has_capability(&addr(1), Role::RewardsUpdater));
        assert!(!roles.has_capability(&addr(2), Role::Owner));
    }

    #[test]
    fn owner_can_grant_slots() {
        let mut roles = RoleTable::new(addr(1));
        roles.grant_whitelister(&addr(1), addr(2)).unwrap();
        roles.grant_rewards_updater(&addr(1), addr(3)).unwrap();
        assert!(roles.has_capability(&addr(2), Role::Whitelister));
        assert!(roles.has_capability(&addr(3), Role::RewardsUpdater));
        assert_eq!(roles.whitelister(), Some(addr(2)));
        assert_eq!(roles.rewards_updater(), Some(addr(3)));
    }

    #[test]
    fn granting_replaces_previous_holder() {
        let mut roles = RoleTable::new(addr(1));
        roles.grant_whitelister(&addr(1), addr(2)).unwrap();
        roles.grant_whitelister(&addr(1), addr(4)).unwrap();
        assert!(!roles.has_capability(&addr(2), Role::Whitelister));
        assert!(roles.has_capability(&addr(4), Role::Whitelister));
    }

    #[test]
    fn non_owner_cannot_grant() {
        let mut roles = RoleTable::new(addr(1));
        let result = roles.grant_whitelister(&addr(9), addr(9));
        assert_eq!(
            result,
            Err(CustodyError::Unauthorized {
                caller: addr(9),
                role: Role::Owner
            })
        );
    }

    #[test]
    fn zero_address_grant_rejected() {
        let mut roles = RoleTable::new(addr(1));
        let result = roles.grant_rewards_updater(&addr(1), Address::ZERO);
        assert_eq!(result, Err(ValidationError::ZeroAddress.into()));
    }
}
