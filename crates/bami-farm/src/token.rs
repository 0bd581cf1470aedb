// crates/bami-farm/src/token.rs
//
// Fungible ledgers and the BAMI reward token.
//
// `TokenLedger` is the plain fungible substrate: balances, allowances, and a
// total supply that always equals the sum of balances. It carries no access
// control; stake assets (LP tokens) are modelled with it directly.
//
// `BamiToken` wraps a ledger with an owner-gated mint. Supply grows only when
// the owner (the chef, once deployed) mints; there is no cap beyond the
// representable range of `Amount`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bami_core::{Address, Amount, Authority, FarmError, FungibleAsset};

/// Default display name of the reward token.
pub const BAMI_NAME: &str = "BamiToken";

/// Default ticker of the reward token.
pub const BAMI_SYMBOL: &str = "BAMI";

/// Balance and allowance book for one fungible asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    balances: BTreeMap<Address, Amount>,
    /// owner -> spender -> remaining allowance
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
    total_supply: Amount,
}

impl TokenLedger {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            total_supply: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Set `spender`'s allowance over `owner`'s balance to exactly `amount`.
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        let per_owner = self.allowances.entry(*owner).or_default();
        if amount == 0 {
            per_owner.remove(spender);
        } else {
            per_owner.insert(*spender, amount);
        }
        if per_owner.is_empty() {
            self.allowances.remove(owner);
        }
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    ///
    /// # Errors
    /// Returns `FarmError::InsufficientBalance` if the allowance or the
    /// balance of `from` is too small. Nothing changes in that case.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), FarmError> {
        let allowed = self.allowance(from, spender);
        if amount > allowed {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: allowed,
            });
        }
        self.transfer(from, to, amount)?;
        self.approve(from, spender, allowed - amount);
        Ok(())
    }

    fn set_balance(&mut self, account: &Address, balance: Amount) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, balance);
        }
    }
}

impl FungibleAsset for TokenLedger {
    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), FarmError> {
        let from_balance = self.balance_of(from);
        if amount > from_balance {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: from_balance,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| FarmError::overflow("TokenLedger::transfer"))?;
        self.set_balance(from, from_balance - amount);
        self.set_balance(to, to_balance);
        Ok(())
    }

    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), FarmError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| FarmError::overflow("TokenLedger::mint"))?;
        // Individual balances are bounded by supply, so this cannot overflow
        // once the supply check passed.
        let balance = self.balance_of(to) + amount;
        self.total_supply = supply;
        self.set_balance(to, balance);
        Ok(())
    }

    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), FarmError> {
        let balance = self.balance_of(from);
        if amount > balance {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: balance,
            });
        }
        self.set_balance(from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }
}

/// The BAMI reward token: a ledger whose mint is reserved to one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BamiToken {
    ledger: TokenLedger,
    authority: Authority,
}

impl BamiToken {
    pub fn new(owner: Address) -> Self {
        Self::with_metadata(owner, BAMI_NAME, BAMI_SYMBOL)
    }

    pub fn with_metadata(owner: Address, name: &str, symbol: &str) -> Self {
        Self {
            ledger: TokenLedger::new(name, symbol),
            authority: Authority::new(owner),
        }
    }

    /// Mint `amount` new BAMI to `to`.
    ///
    /// # Errors
    /// - `FarmError::Unauthorized` if `caller` is not the owner.
    /// - `FarmError::Overflow` if the total supply would overflow.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<(), FarmError> {
        self.authority.ensure_owner(caller)?;
        self.ledger.mint(to, amount)?;
        tracing::debug!(to = %to, amount, supply = self.ledger.total_supply(), "BAMI minted");
        Ok(())
    }

    /// Move the caller's own BAMI.
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<(), FarmError> {
        self.ledger.transfer(caller, to, amount)
    }

    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) {
        self.ledger.approve(caller, spender, amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), FarmError> {
        self.ledger.transfer_from(caller, from, to, amount)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), FarmError> {
        self.authority.transfer(caller, new_owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    fn minter() -> Address {
        Address::derive("minter")
    }

    #[test]
    fn test_owner_mint() {
        let mut bami = BamiToken::new(minter());
        bami.mint(&minter(), &alice(), 1000).unwrap();
        assert_eq!(bami.balance_of(&alice()), 1000);
        assert_eq!(bami.total_supply(), 1000);
    }

    #[test]
    fn test_mint_requires_owner() {
        let mut bami = BamiToken::new(minter());
        let err = bami.mint(&alice(), &alice(), 1000).unwrap_err();
        assert!(matches!(err, FarmError::Unauthorized(_)));
        assert_eq!(bami.total_supply(), 0);
    }

    #[test]
    fn test_mint_overflow() {
        let mut bami = BamiToken::new(minter());
        bami.mint(&minter(), &alice(), Amount::MAX).unwrap();
        let err = bami.mint(&minter(), &bob(), 1).unwrap_err();
        assert!(matches!(err, FarmError::Overflow(_)));
        assert_eq!(bami.balance_of(&bob()), 0);
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = TokenLedger::new("LP", "LP");
        ledger.mint(&alice(), 500).unwrap();
        ledger.transfer(&alice(), &bob(), 200).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 300);
        assert_eq!(ledger.balance_of(&bob()), 200);
        assert_eq!(ledger.total_supply(), 500);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = TokenLedger::new("LP", "LP");
        ledger.mint(&alice(), 50).unwrap();
        let err = ledger.transfer(&alice(), &bob(), 51).unwrap_err();
        assert_eq!(
            err,
            FarmError::InsufficientBalance {
                requested: 51,
                available: 50
            }
        );
        assert_eq!(ledger.balance_of(&alice()), 50);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut ledger = TokenLedger::new("LP", "LP");
        ledger.mint(&alice(), 1000).unwrap();
        ledger.approve(&alice(), &bob(), 300);

        ledger.transfer_from(&bob(), &alice(), &bob(), 100).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 200);
        assert_eq!(ledger.balance_of(&bob()), 100);

        let err = ledger.transfer_from(&bob(), &alice(), &bob(), 201).unwrap_err();
        assert!(matches!(err, FarmError::InsufficientBalance { .. }));
        assert_eq!(ledger.allowance(&alice(), &bob()), 200);
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut ledger = TokenLedger::new("LP", "LP");
        ledger.mint(&alice(), 1000).unwrap();
        ledger.burn(&alice(), 1000).unwrap();
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }
}
