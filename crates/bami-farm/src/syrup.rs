// crates/bami-farm/src/syrup.rs
//
// SyrupBar: the receipt token minted 1:1 against stake.
//
// The bar's own account doubles as the payout buffer. Emission destined for
// stakers is minted as BAMI into that account, and harvests draw it back out
// through `safe_bami_transfer`, which pays whatever is on hand rather than
// failing when the buffer is short. The shortfall is not recorded anywhere;
// a later top-up of the buffer is an external funding concern.

use serde::{Deserialize, Serialize};

use bami_core::{Address, Amount, Authority, FarmError, FungibleAsset};

use crate::token::{BamiToken, TokenLedger};

/// Default display name of the receipt token.
pub const SYRUP_NAME: &str = "SyrupBar Token";

/// Default ticker of the receipt token.
pub const SYRUP_SYMBOL: &str = "SYRUP";

/// Label the bar's account address is derived from.
pub const SYRUP_ACCOUNT_LABEL: &str = "bami:syrup-bar";

/// Outcome of a capped payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payout {
    /// BAMI actually moved to the recipient.
    pub paid: Amount,
    /// Requested amount the buffer could not cover.
    pub shortfall: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyrupBar {
    /// The bar's own account; holds the BAMI payout buffer.
    account: Address,
    ledger: TokenLedger,
    authority: Authority,
}

impl SyrupBar {
    pub fn new(owner: Address) -> Self {
        Self::with_metadata(owner, SYRUP_NAME, SYRUP_SYMBOL)
    }

    pub fn with_metadata(owner: Address, name: &str, symbol: &str) -> Self {
        Self {
            account: Address::derive(SYRUP_ACCOUNT_LABEL),
            ledger: TokenLedger::new(name, symbol),
            authority: Authority::new(owner),
        }
    }

    /// The bar's account address, i.e. where its BAMI buffer lives.
    pub fn account(&self) -> Address {
        self.account
    }

    /// # Errors
    /// - `FarmError::Unauthorized` if `caller` is not the owner.
    /// - `FarmError::Overflow` if the receipt supply would overflow.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<(), FarmError> {
        self.authority.ensure_owner(caller)?;
        self.ledger.mint(to, amount)
    }

    /// # Errors
    /// - `FarmError::Unauthorized` if `caller` is not the owner.
    /// - `FarmError::InsufficientBalance` if `from` holds less than `amount`.
    pub fn burn(&mut self, caller: &Address, from: &Address, amount: Amount) -> Result<(), FarmError> {
        self.authority.ensure_owner(caller)?;
        self.ledger.burn(from, amount)
    }

    /// Pay `min(amount, buffer)` BAMI from the bar's buffer to `to`.
    ///
    /// Never fails on a short buffer: a request larger than the buffer drains
    /// it. Only the owner may draw from the buffer.
    ///
    /// # Errors
    /// Returns `FarmError::Unauthorized` if `caller` is not the owner.
    pub fn safe_bami_transfer(
        &self,
        caller: &Address,
        bami: &mut BamiToken,
        to: &Address,
        amount: Amount,
    ) -> Result<Payout, FarmError> {
        self.authority.ensure_owner(caller)?;
        let buffer = bami.balance_of(&self.account);
        let paid = amount.min(buffer);
        if paid > 0 {
            bami.transfer(&self.account, to, paid)?;
        }
        let shortfall = amount - paid;
        if shortfall > 0 {
            tracing::warn!(
                to = %to,
                requested = amount,
                paid,
                shortfall,
                "syrup buffer short, payout capped"
            );
        }
        Ok(Payout { paid, shortfall })
    }

    /// BAMI currently held by the bar.
    pub fn buffer(&self, bami: &BamiToken) -> Amount {
        bami.balance_of(&self.account)
    }

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<(), FarmError> {
        self.ledger.transfer(caller, to, amount)
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
    fn test_mint() {
        let mut syrup = SyrupBar::new(minter());
        syrup.mint(&minter(), &alice(), 1000).unwrap();
        assert_eq!(syrup.balance_of(&alice()), 1000);
    }

    #[test]
    fn test_burn() {
        let mut syrup = SyrupBar::new(minter());
        assert_eq!(syrup.total_supply(), 0);
        syrup.mint(&minter(), &alice(), 1000).unwrap();
        assert_eq!(syrup.total_supply(), 1000);
        syrup.mint(&minter(), &bob(), 1000).unwrap();
        assert_eq!(syrup.total_supply(), 2000);
        syrup.burn(&minter(), &alice(), 200).unwrap();

        assert_eq!(syrup.balance_of(&alice()), 800);
        assert_eq!(syrup.total_supply(), 1800);
    }

    #[test]
    fn test_burn_more_than_balance() {
        let mut syrup = SyrupBar::new(minter());
        syrup.mint(&minter(), &alice(), 100).unwrap();
        let err = syrup.burn(&minter(), &alice(), 101).unwrap_err();
        assert!(matches!(err, FarmError::InsufficientBalance { .. }));
        assert_eq!(syrup.total_supply(), 100);
    }

    #[test]
    fn test_mint_and_burn_are_owner_only() {
        let mut syrup = SyrupBar::new(minter());
        assert!(matches!(
            syrup.mint(&alice(), &alice(), 1),
            Err(FarmError::Unauthorized(_))
        ));
        syrup.mint(&minter(), &alice(), 1).unwrap();
        assert!(matches!(
            syrup.burn(&alice(), &alice(), 1),
            Err(FarmError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_safe_bami_transfer() {
        let mut bami = BamiToken::new(minter());
        let syrup = SyrupBar::new(minter());
        assert_eq!(bami.balance_of(&syrup.account()), 0);

        bami.mint(&minter(), &syrup.account(), 1000).unwrap();
        let payout = syrup
            .safe_bami_transfer(&minter(), &mut bami, &bob(), 200)
            .unwrap();
        assert_eq!(payout, Payout { paid: 200, shortfall: 0 });
        assert_eq!(bami.balance_of(&bob()), 200);
        assert_eq!(bami.balance_of(&syrup.account()), 800);

        let payout = syrup
            .safe_bami_transfer(&minter(), &mut bami, &bob(), 2000)
            .unwrap();
        assert_eq!(payout, Payout { paid: 800, shortfall: 1200 });
        assert_eq!(bami.balance_of(&bob()), 1000);
        assert_eq!(syrup.buffer(&bami), 0);
    }

    #[test]
    fn test_safe_bami_transfer_empty_buffer() {
        let mut bami = BamiToken::new(minter());
        let syrup = SyrupBar::new(minter());
        let payout = syrup
            .safe_bami_transfer(&minter(), &mut bami, &bob(), 5)
            .unwrap();
        assert_eq!(payout.paid, 0);
        assert_eq!(bami.balance_of(&bob()), 0);
    }

    #[test]
    fn test_safe_bami_transfer_owner_only() {
        let mut bami = BamiToken::new(minter());
        let syrup = SyrupBar::new(minter());
        bami.mint(&minter(), &syrup.account(), 10).unwrap();
        assert!(matches!(
            syrup.safe_bami_transfer(&bob(), &mut bami, &bob(), 10),
            Err(FarmError::Unauthorized(_))
        ));
        assert_eq!(syrup.buffer(&bami), 10);
    }
}
