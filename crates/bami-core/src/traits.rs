// crates/bami-core/src/traits.rs

use crate::address::Address;
use crate::error::FarmError;
use crate::Amount;

/// Source of the host's block counter.
///
/// Implemented by the host runtime; `bami-farm` ships a manual clock for
/// hosts that drive blocks themselves.
pub trait BlockClock: Send + Sync {
    /// Current block height. Must never decrease.
    fn current_block(&self) -> u64;
}

/// Base fungible-asset primitives the farm builds on.
///
/// Implemented by `bami-farm::token::TokenLedger`. Non-negative balances and
/// conservation of supply are the implementor's responsibility.
pub trait FungibleAsset {
    fn balance_of(&self, account: &Address) -> Amount;

    fn total_supply(&self) -> Amount;

    /// Move `amount` from `from` to `to`.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), FarmError>;

    /// Create `amount` new units in `to`'s balance.
    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), FarmError>;

    /// Destroy `amount` units from `from`'s balance.
    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), FarmError>;
}
