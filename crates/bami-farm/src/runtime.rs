// crates/bami-farm/src/runtime.rs
//
// FarmRuntime: shared, all-or-nothing access to a MasterChef.
//
// Every mutating call takes the lock, stamps a TxContext from the block
// clock, runs against a draft copy of the chef, and commits the draft only if
// the call returned Ok. An Err leaves the committed state exactly as it was,
// even when the closure chains several chef calls and a later one fails.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use bami_core::{Address, Amount, AssetId, BlockClock, FarmError, TxContext};

use crate::chef::{FarmSnapshot, MasterChef, Settlement};
use crate::pool::PoolId;

/// Block clock driven by hand. Never moves backwards.
#[derive(Debug, Default)]
pub struct ManualClock {
    block: AtomicU64,
}

impl ManualClock {
    pub fn new(block: u64) -> Self {
        Self {
            block: AtomicU64::new(block),
        }
    }

    /// Advance by `blocks` and return the new height.
    pub fn advance(&self, blocks: u64) -> u64 {
        self.block.fetch_add(blocks, Ordering::SeqCst) + blocks
    }

    /// Jump to `block`. Earlier heights are ignored.
    pub fn set(&self, block: u64) {
        self.block.fetch_max(block, Ordering::SeqCst);
    }
}

impl BlockClock for ManualClock {
    fn current_block(&self) -> u64 {
        self.block.load(Ordering::SeqCst)
    }
}

pub struct FarmRuntime<C: BlockClock> {
    chef: Mutex<MasterChef>,
    clock: C,
}

impl<C: BlockClock> FarmRuntime<C> {
    pub fn new(chef: MasterChef, clock: C) -> Self {
        Self {
            chef: Mutex::new(chef),
            clock,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `op` as `caller` at the current block. Commits on Ok, discards
    /// every write on Err.
    pub fn execute<T>(
        &self,
        caller: Address,
        op: impl FnOnce(&mut MasterChef, &TxContext) -> Result<T, FarmError>,
    ) -> Result<T, FarmError> {
        let mut chef = self.chef.lock();
        let ctx = TxContext::new(caller, self.clock.current_block());
        let mut draft = chef.clone();
        match op(&mut draft, &ctx) {
            Ok(value) => {
                *chef = draft;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(caller = %caller, block = ctx.block, error = %e, "operation rolled back");
                Err(e)
            }
        }
    }

    /// Read-only access under the lock.
    pub fn view<T>(&self, f: impl FnOnce(&MasterChef) -> T) -> T {
        let chef = self.chef.lock();
        f(&*chef)
    }

    pub fn add_pool(
        &self,
        caller: Address,
        stake_asset: AssetId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
    ) -> Result<PoolId, FarmError> {
        self.execute(caller, |chef, ctx| {
            chef.add_pool(ctx, stake_asset, alloc_weight, deposit_fee_bps)
        })
    }

    pub fn set_pool(
        &self,
        caller: Address,
        pool_id: PoolId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
    ) -> Result<(), FarmError> {
        self.execute(caller, |chef, ctx| {
            chef.set_pool(ctx, pool_id, alloc_weight, deposit_fee_bps)
        })
    }

    /// Approve the chef for `amount` and deposit it in one step.
    pub fn deposit(&self, caller: Address, pool_id: PoolId, amount: Amount) -> Result<Settlement, FarmError> {
        self.execute(caller, |chef, ctx| {
            if amount > 0 {
                let asset = chef.pool_info(pool_id)?.stake_asset.clone();
                chef.approve_stake(ctx, &asset, amount)?;
            }
            chef.deposit(ctx, pool_id, amount)
        })
    }

    pub fn withdraw(&self, caller: Address, pool_id: PoolId, amount: Amount) -> Result<Settlement, FarmError> {
        self.execute(caller, |chef, ctx| chef.withdraw(ctx, pool_id, amount))
    }

    pub fn harvest(&self, caller: Address, pool_id: PoolId) -> Result<Settlement, FarmError> {
        self.execute(caller, |chef, ctx| chef.harvest(ctx, pool_id))
    }

    pub fn emergency_withdraw(&self, caller: Address, pool_id: PoolId) -> Result<Amount, FarmError> {
        self.execute(caller, |chef, ctx| chef.emergency_withdraw(ctx, pool_id))
    }

    pub fn mass_update_pools(&self, caller: Address) -> Result<(), FarmError> {
        self.execute(caller, |chef, ctx| chef.mass_update_pools(ctx.block))
    }

    /// Pending BAMI for `user` as of the clock's current block.
    pub fn pending_bami(&self, pool_id: PoolId, user: &Address) -> Result<Amount, FarmError> {
        let block = self.clock.current_block();
        self.view(|chef| chef.pending_bami(pool_id, user, block))
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        self.view(MasterChef::snapshot)
    }

    /// Consume the runtime and hand back the committed chef.
    pub fn into_inner(self) -> MasterChef {
        self.chef.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::EmissionController;
    use bami_core::FungibleAsset;

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn runtime() -> FarmRuntime<ManualClock> {
        let emission = EmissionController::new(
            100,
            0,
            Address::derive("dev"),
            Address::derive("fee"),
            0,
            0,
        )
        .unwrap();
        let rt = FarmRuntime::new(MasterChef::new(owner(), emission), ManualClock::new(10));
        rt.add_pool(owner(), AssetId::new("LP"), 1, 0).unwrap();
        rt.execute(owner(), |chef, _| {
            chef.stake_ledger_mut(&AssetId::new("LP"))?.mint(&alice(), 1_000)
        })
        .unwrap();
        rt
    }

    #[test]
    fn test_manual_clock_never_rewinds() {
        let clock = ManualClock::new(5);
        assert_eq!(clock.advance(3), 8);
        clock.set(2);
        assert_eq!(clock.current_block(), 8);
        clock.set(20);
        assert_eq!(clock.current_block(), 20);
    }

    #[test]
    fn test_context_uses_clock() {
        let rt = runtime();
        rt.clock().set(42);
        let block = rt.execute(alice(), |_, ctx| Ok(ctx.block)).unwrap();
        assert_eq!(block, 42);
    }

    #[test]
    fn test_deposit_and_harvest_through_runtime() {
        let rt = runtime();
        rt.deposit(alice(), 0, 500).unwrap();
        rt.clock().advance(10);
        assert_eq!(rt.pending_bami(0, &alice()).unwrap(), 1_000);
        let settlement = rt.harvest(alice(), 0).unwrap();
        assert_eq!(settlement.paid, 1_000);
        assert_eq!(rt.view(|c| c.bami().balance_of(&alice())), 1_000);
    }

    #[test]
    fn test_failed_operation_rolls_back() {
        let rt = runtime();
        rt.deposit(alice(), 0, 500).unwrap();
        rt.clock().advance(10);
        let before = rt.snapshot();

        // Settles pool 0 inside the draft, then fails.
        let err = rt
            .execute(alice(), |chef, ctx| {
                chef.mass_update_pools(ctx.block)?;
                chef.withdraw(ctx, 0, 501)
            })
            .unwrap_err();
        assert!(matches!(err, FarmError::InsufficientStake { .. }));
        assert_eq!(rt.snapshot(), before);
        assert_eq!(rt.view(|c| c.pool_info(0).unwrap().last_reward_block), 10);
    }

    #[test]
    fn test_unauthorized_add_pool_leaves_state() {
        let rt = runtime();
        let err = rt
            .add_pool(alice(), AssetId::new("LP2"), 5, 0)
            .unwrap_err();
        assert!(matches!(err, FarmError::Unauthorized(_)));
        assert_eq!(rt.view(MasterChef::pool_length), 1);
    }

    #[test]
    fn test_into_inner_keeps_commits() {
        let rt = runtime();
        rt.deposit(alice(), 0, 300).unwrap();
        let chef = rt.into_inner();
        assert_eq!(chef.user_info(0, &alice()).staked, 300);
    }
}
