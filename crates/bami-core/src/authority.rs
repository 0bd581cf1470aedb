// crates/bami-core/src/authority.rs
//
// Single-owner authority shared by the reward token, the syrup bar, and the
// chef. Owner-gated operations call `ensure_owner` before touching state.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::FarmError;

/// The designated controlling address of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    owner: Address,
}

impl Authority {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// # Errors
    /// Returns `FarmError::Unauthorized` unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), FarmError> {
        if *caller != self.owner {
            return Err(FarmError::Unauthorized(format!(
                "caller {} is not the owner",
                caller
            )));
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Only the current owner may call this.
    ///
    /// # Errors
    /// - `FarmError::Unauthorized` if `caller` is not the owner.
    /// - `FarmError::InvalidConfig` if `new_owner` is the zero address.
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<(), FarmError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(FarmError::InvalidConfig(
                "new owner is the zero address".to_string(),
            ));
        }
        tracing::info!(from = %self.owner, to = %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }
}
