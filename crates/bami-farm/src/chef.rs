// crates/bami-farm/src/chef.rs
//
// MasterChef: the single-writer store that ties the farm together.
//
// It owns the BAMI token and the syrup bar (their mint authority is the
// chef's own account), the emission controller, the pool registry, every
// position, and custody ledgers for the stake assets. Each operation takes
// `&mut self` plus a `TxContext` and runs in two phases: every check and
// every fallible computation first (settlement plans, new debts, supply
// headroom), then the writes, none of which can fail. A failed call leaves
// the state as it found it. `FarmRuntime` layers locking on top and extends
// the same guarantee to closures that chain several calls.
//
// Settlement order:
//   1. settle the pool up to ctx.block (mint dev, fee, and buffer shares)
//   2. pay the caller's pending reward from the syrup buffer (capped)
//   3. move stake and receipts
//   4. re-base the caller's reward debt

use std::collections::BTreeMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use bami_core::{Address, Amount, AssetId, Authority, FarmError, FungibleAsset, TxContext};

use crate::accountant::{self, Accrual, Position, RewardAccountant};
use crate::emission::{bps_of, EmissionController};
use crate::pool::{check_deposit_fee, Pool, PoolId, PoolRegistry};
use crate::syrup::{Payout, SyrupBar};
use crate::token::{BamiToken, TokenLedger};

/// Label the chef's account address is derived from.
pub const CHEF_ACCOUNT_LABEL: &str = "bami:master-chef";

/// What a deposit, withdrawal, or harvest did for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub pool_id: PoolId,
    /// BAMI paid to the caller.
    pub paid: Amount,
    /// Pending BAMI the buffer could not cover.
    pub shortfall: Amount,
    /// Stake-asset fee skimmed from a deposit.
    pub deposit_fee: Amount,
    /// Caller's stake after the operation.
    pub staked: Amount,
}

/// Serializable overview of the farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub pools: Vec<Pool>,
    pub total_weight: u64,
    pub tokens_per_block: Amount,
    pub start_block: u64,
    pub bonus_multiplier: u64,
    pub bami_supply: Amount,
    pub syrup_supply: Amount,
    pub payout_buffer: Amount,
}

/// Accruals to apply, checked against the BAMI supply, with each pool's
/// previous reward block for logging.
struct SettlementPlan {
    accruals: Vec<(PoolId, u64, Accrual)>,
}

impl SettlementPlan {
    /// `acc_reward_per_share` of `pool_id` once the plan is applied.
    fn acc_after(&self, pool: &Pool, pool_id: PoolId) -> U256 {
        self.accruals
            .iter()
            .find(|(id, _, _)| *id == pool_id)
            .map_or(pool.acc_reward_per_share, |(_, _, a)| a.acc_reward_per_share)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterChef {
    account: Address,
    authority: Authority,
    bami: BamiToken,
    syrup: SyrupBar,
    emission: EmissionController,
    registry: PoolRegistry,
    accountant: RewardAccountant,
    stake_assets: BTreeMap<AssetId, TokenLedger>,
}

impl MasterChef {
    /// The chef's account address.
    pub fn account_address() -> Address {
        Address::derive(CHEF_ACCOUNT_LABEL)
    }

    /// Create a chef with fresh BAMI and syrup tokens it controls.
    pub fn new(owner: Address, emission: EmissionController) -> Self {
        let account = Self::account_address();
        Self::assemble(owner, BamiToken::new(account), SyrupBar::new(account), emission)
    }

    /// Create a chef around existing tokens whose ownership has already been
    /// handed to `MasterChef::account_address()`.
    ///
    /// # Errors
    /// Returns `FarmError::Unauthorized` if the chef does not own both tokens.
    pub fn with_tokens(
        owner: Address,
        bami: BamiToken,
        syrup: SyrupBar,
        emission: EmissionController,
    ) -> Result<Self, FarmError> {
        let chef = Self::assemble(owner, bami, syrup, emission);
        chef.ensure_controls_tokens()?;
        Ok(chef)
    }

    fn assemble(
        owner: Address,
        bami: BamiToken,
        syrup: SyrupBar,
        emission: EmissionController,
    ) -> Self {
        tracing::info!(
            owner = %owner,
            tokens_per_block = emission.tokens_per_block(),
            start_block = emission.start_block(),
            "MasterChef initialized"
        );
        Self {
            account: Self::account_address(),
            authority: Authority::new(owner),
            bami,
            syrup,
            emission,
            registry: PoolRegistry::new(),
            accountant: RewardAccountant::new(),
            stake_assets: BTreeMap::new(),
        }
    }

    /// Mint and burn below run as the chef's account; it must still own both
    /// tokens.
    fn ensure_controls_tokens(&self) -> Result<(), FarmError> {
        if self.bami.owner() != self.account || self.syrup.owner() != self.account {
            return Err(FarmError::Unauthorized(
                "chef must own both the BAMI token and the syrup bar".to_string(),
            ));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Pool administration
    // ---------------------------------------------------------------------

    /// Add a pool for `stake_asset`. Owner only.
    ///
    /// Every existing pool is settled first, so the new total weight only
    /// prices blocks from here on. The pool starts accruing at
    /// `max(ctx.block, start_block)`.
    ///
    /// # Errors
    /// `Unauthorized`, `DuplicatePool`, `InvalidConfig` (deposit fee), `Overflow`.
    pub fn add_pool(
        &mut self,
        ctx: &TxContext,
        stake_asset: AssetId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
    ) -> Result<PoolId, FarmError> {
        self.authority.ensure_owner(&ctx.caller)?;
        if self.registry.find(&stake_asset).is_some() {
            return Err(FarmError::DuplicatePool(stake_asset.to_string()));
        }
        check_deposit_fee(deposit_fee_bps)?;
        self.registry
            .total_weight()
            .checked_add(alloc_weight)
            .ok_or_else(|| FarmError::overflow("add_pool"))?;
        let plan = self.plan_settlement(0..self.registry.len(), ctx.block)?;

        self.commit_settlement(plan)?;
        let last_reward_block = ctx.block.max(self.emission.start_block());
        let pool_id = self.registry.add(
            stake_asset.clone(),
            alloc_weight,
            deposit_fee_bps,
            last_reward_block,
        )?;
        self.stake_assets
            .entry(stake_asset.clone())
            .or_insert_with(|| TokenLedger::new(stake_asset.0.clone(), stake_asset.0.clone()));

        tracing::info!(
            pool_id,
            stake_asset = %stake_asset,
            alloc_weight,
            deposit_fee_bps,
            last_reward_block,
            total_weight = self.registry.total_weight(),
            "pool added"
        );
        Ok(pool_id)
    }

    /// Change a pool's allocation weight and deposit fee. Owner only.
    ///
    /// Every pool is settled at the old total weight before the change.
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound`, `InvalidConfig`, `Overflow`.
    pub fn set_pool(
        &mut self,
        ctx: &TxContext,
        pool_id: PoolId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
    ) -> Result<(), FarmError> {
        self.authority.ensure_owner(&ctx.caller)?;
        let old = self.registry.get(pool_id)?.alloc_weight;
        check_deposit_fee(deposit_fee_bps)?;
        (self.registry.total_weight() - old)
            .checked_add(alloc_weight)
            .ok_or_else(|| FarmError::overflow("set_pool"))?;
        let plan = self.plan_settlement(0..self.registry.len(), ctx.block)?;

        self.commit_settlement(plan)?;
        self.registry.set_weight(pool_id, alloc_weight, deposit_fee_bps)?;

        tracing::info!(
            pool_id,
            old_weight = old,
            new_weight = alloc_weight,
            deposit_fee_bps,
            total_weight = self.registry.total_weight(),
            "pool reweighted"
        );
        Ok(())
    }

    /// Settle every pool up to `block`. All or nothing: if any pool's
    /// accrual fails, no pool moves.
    pub fn mass_update_pools(&mut self, block: u64) -> Result<(), FarmError> {
        let plan = self.plan_settlement(0..self.registry.len(), block)?;
        self.commit_settlement(plan)
    }

    /// Settle one pool up to the current block. Anyone may call this.
    pub fn update_pool(&mut self, ctx: &TxContext, pool_id: PoolId) -> Result<(), FarmError> {
        self.settle_pool(pool_id, ctx.block)
    }

    /// Bring `pool_id` up to `block`: mint the elapsed emission (dev share,
    /// fee share, and the staker share into the syrup buffer) and advance
    /// `acc_reward_per_share`. Idempotent within a block.
    pub fn settle_pool(&mut self, pool_id: PoolId, block: u64) -> Result<(), FarmError> {
        let plan = self.plan_settlement(std::iter::once(pool_id), block)?;
        self.commit_settlement(plan)
    }

    /// Compute every accrual settling `pool_ids` at `block` would apply and
    /// check the total mint fits in the BAMI supply. Writes nothing.
    fn plan_settlement(
        &self,
        pool_ids: impl IntoIterator<Item = PoolId>,
        block: u64,
    ) -> Result<SettlementPlan, FarmError> {
        let total_weight = self.registry.total_weight();
        let mut minted: Amount = 0;
        let mut accruals = Vec::new();
        for pool_id in pool_ids {
            let pool = self.registry.get(pool_id)?;
            if let Some(accrual) = accountant::accrue(pool, &self.emission, total_weight, block)? {
                minted = minted
                    .checked_add(accrual.split.total())
                    .ok_or_else(|| FarmError::overflow("settle"))?;
                accruals.push((pool_id, pool.last_reward_block, accrual));
            }
        }
        if minted > 0 {
            self.ensure_controls_tokens()?;
            self.bami
                .total_supply()
                .checked_add(minted)
                .ok_or_else(|| FarmError::overflow("settle"))?;
        }
        Ok(SettlementPlan { accruals })
    }

    /// Apply a plan from `plan_settlement`. Cannot fail for a plan computed
    /// against the current state.
    fn commit_settlement(&mut self, plan: SettlementPlan) -> Result<(), FarmError> {
        let account = self.account;
        let dev = self.emission.dev_address();
        let fee = self.emission.fee_address();
        let buffer = self.syrup.account();
        for (pool_id, from_block, accrual) in plan.accruals {
            let split = accrual.split;
            for (to, amount) in [(dev, split.dev), (fee, split.fee), (buffer, split.stakers)] {
                if amount > 0 {
                    self.bami.mint(&account, &to, amount)?;
                }
            }
            let pool = self.registry.get_mut(pool_id)?;
            accountant::apply(pool, &accrual);

            tracing::debug!(
                pool_id,
                from_block,
                to_block = accrual.to_block,
                dev = split.dev,
                fee = split.fee,
                stakers = split.stakers,
                acc_reward_per_share = %pool.acc_reward_per_share,
                "pool settled"
            );
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Depositor operations
    // ---------------------------------------------------------------------

    /// Approve the chef to pull `amount` of `stake_asset` from the caller.
    pub fn approve_stake(
        &mut self,
        ctx: &TxContext,
        stake_asset: &AssetId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        let account = self.account;
        self.stake_ledger_mut(stake_asset)?
            .approve(&ctx.caller, &account, amount);
        Ok(())
    }

    /// Deposit `amount` of the pool's stake asset, harvesting first.
    ///
    /// The chef pulls the stake with `transfer_from`, so the caller must have
    /// approved it. A deposit fee, if the pool has one, goes to the fee
    /// address; the remainder is staked and receipted 1:1 in SYRUP.
    /// `amount == 0` only harvests.
    ///
    /// # Errors
    /// `NotFound`, `InsufficientBalance` (allowance or stake-asset balance),
    /// `Overflow`.
    pub fn deposit(
        &mut self,
        ctx: &TxContext,
        pool_id: PoolId,
        amount: Amount,
    ) -> Result<Settlement, FarmError> {
        let caller = ctx.caller;
        let pool = self.registry.get(pool_id)?;
        let stake_asset = pool.stake_asset.clone();
        let deposit_fee = bps_of(amount, pool.deposit_fee_bps)?;
        let credited = amount - deposit_fee;
        let total_staked = pool
            .total_staked
            .checked_add(credited)
            .ok_or_else(|| FarmError::overflow("deposit"))?;

        if amount > 0 {
            let ledger = self.stake_ledger(&stake_asset)?;
            let allowed = ledger.allowance(&caller, &self.account);
            if amount > allowed {
                return Err(FarmError::InsufficientBalance {
                    requested: amount,
                    available: allowed,
                });
            }
            let balance = ledger.balance_of(&caller);
            if amount > balance {
                return Err(FarmError::InsufficientBalance {
                    requested: amount,
                    available: balance,
                });
            }
            self.ensure_controls_tokens()?;
            // SYRUP is shared by every pool, so its supply is the binding limit.
            self.syrup
                .total_supply()
                .checked_add(credited)
                .ok_or_else(|| FarmError::overflow("deposit"))?;
        }

        let position = self.accountant.position(pool_id, &caller);
        let staked = position
            .staked
            .checked_add(credited)
            .ok_or_else(|| FarmError::overflow("deposit"))?;
        let plan = self.plan_settlement(std::iter::once(pool_id), ctx.block)?;
        let acc = plan.acc_after(pool, pool_id);
        let owed = accountant::pending(&position, acc)?;
        let reward_debt = accountant::accumulated(staked, acc)?;

        self.commit_settlement(plan)?;
        let payout = self.pay_pending(&caller, owed)?;
        if amount > 0 {
            let account = self.account;
            let fee_address = self.emission.fee_address();
            let ledger = self.stake_ledger_mut(&stake_asset)?;
            ledger.transfer_from(&account, &caller, &account, amount)?;
            if deposit_fee > 0 {
                ledger.transfer(&account, &fee_address, deposit_fee)?;
            }
            if credited > 0 {
                self.syrup.mint(&account, &caller, credited)?;
            }
        }

        self.registry.get_mut(pool_id)?.total_staked = total_staked;
        if staked > 0 || position != Position::default() {
            self.accountant.store(
                pool_id,
                caller,
                Position {
                    staked,
                    reward_debt,
                },
            );
        }

        tracing::info!(
            pool_id,
            user = %caller,
            amount,
            deposit_fee,
            paid = payout.paid,
            staked,
            block = ctx.block,
            "deposit"
        );
        Ok(Settlement {
            pool_id,
            paid: payout.paid,
            shortfall: payout.shortfall,
            deposit_fee,
            staked,
        })
    }

    /// Withdraw `amount` of stake, harvesting first. Burns the matching
    /// SYRUP. `amount == 0` only harvests.
    ///
    /// # Errors
    /// - `InsufficientStake` if `amount` exceeds the caller's stake.
    /// - `InsufficientBalance` if the caller no longer holds enough SYRUP.
    /// - `NotFound`, `Overflow`.
    pub fn withdraw(
        &mut self,
        ctx: &TxContext,
        pool_id: PoolId,
        amount: Amount,
    ) -> Result<Settlement, FarmError> {
        let caller = ctx.caller;
        let pool = self.registry.get(pool_id)?;
        let stake_asset = pool.stake_asset.clone();
        let position = self.accountant.position(pool_id, &caller);
        if amount > position.staked {
            return Err(FarmError::InsufficientStake {
                requested: amount,
                staked: position.staked,
            });
        }
        let receipts = self.syrup.balance_of(&caller);
        if amount > receipts {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: receipts,
            });
        }
        self.ensure_controls_tokens()?;
        let staked = position.staked - amount;
        let total_staked = pool.total_staked - amount;
        let plan = self.plan_settlement(std::iter::once(pool_id), ctx.block)?;
        let acc = plan.acc_after(pool, pool_id);
        let owed = accountant::pending(&position, acc)?;
        let reward_debt = accountant::accumulated(staked, acc)?;

        self.commit_settlement(plan)?;
        let payout = self.pay_pending(&caller, owed)?;
        if amount > 0 {
            let account = self.account;
            self.syrup.burn(&account, &caller, amount)?;
            self.stake_ledger_mut(&stake_asset)?
                .transfer(&account, &caller, amount)?;
        }

        self.registry.get_mut(pool_id)?.total_staked = total_staked;
        self.accountant.store(
            pool_id,
            caller,
            Position {
                staked,
                reward_debt,
            },
        );

        tracing::info!(
            pool_id,
            user = %caller,
            amount,
            paid = payout.paid,
            staked,
            block = ctx.block,
            "withdraw"
        );
        Ok(Settlement {
            pool_id,
            paid: payout.paid,
            shortfall: payout.shortfall,
            deposit_fee: 0,
            staked,
        })
    }

    /// Collect pending BAMI without moving stake.
    pub fn harvest(&mut self, ctx: &TxContext, pool_id: PoolId) -> Result<Settlement, FarmError> {
        self.deposit(ctx, pool_id, 0)
    }

    /// Withdraw the whole stake, forfeiting pending reward. No settlement
    /// runs, so this works even when emission math would overflow.
    ///
    /// # Errors
    /// `NotFound`, or `InsufficientBalance` if the caller lacks the SYRUP.
    pub fn emergency_withdraw(&mut self, ctx: &TxContext, pool_id: PoolId) -> Result<Amount, FarmError> {
        let caller = ctx.caller;
        let pool = self.registry.get(pool_id)?;
        let stake_asset = pool.stake_asset.clone();
        let amount = self.accountant.position(pool_id, &caller).staked;
        let receipts = self.syrup.balance_of(&caller);
        if amount > receipts {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: receipts,
            });
        }
        let total_staked = pool.total_staked - amount;

        if amount > 0 {
            self.ensure_controls_tokens()?;
            let account = self.account;
            self.syrup.burn(&account, &caller, amount)?;
            self.stake_ledger_mut(&stake_asset)?
                .transfer(&account, &caller, amount)?;
        }
        self.registry.get_mut(pool_id)?.total_staked = total_staked;
        self.accountant.store(pool_id, caller, Position::default());

        tracing::warn!(pool_id, user = %caller, amount, block = ctx.block, "emergency withdraw");
        Ok(amount)
    }

    fn pay_pending(&mut self, to: &Address, owed: Amount) -> Result<Payout, FarmError> {
        if owed == 0 {
            return Ok(Payout::default());
        }
        self.syrup
            .safe_bami_transfer(&self.account, &mut self.bami, to, owed)
    }

    // ---------------------------------------------------------------------
    // Emission administration
    // ---------------------------------------------------------------------

    /// Change BAMI per block. Owner only; all pools are settled at the old
    /// rate first.
    pub fn update_emission_rate(&mut self, ctx: &TxContext, tokens_per_block: Amount) -> Result<(), FarmError> {
        self.authority.ensure_owner(&ctx.caller)?;
        self.mass_update_pools(ctx.block)?;
        let old = self.emission.tokens_per_block();
        self.emission.set_tokens_per_block(tokens_per_block);
        tracing::info!(old, new = tokens_per_block, block = ctx.block, "emission rate updated");
        Ok(())
    }

    /// Change the bonus multiplier. Owner only; all pools are settled at the
    /// old multiplier first.
    pub fn update_multiplier(&mut self, ctx: &TxContext, multiplier: u64) -> Result<(), FarmError> {
        self.authority.ensure_owner(&ctx.caller)?;
        if multiplier == 0 {
            return Err(FarmError::InvalidConfig(
                "bonus multiplier must be at least 1".to_string(),
            ));
        }
        self.mass_update_pools(ctx.block)?;
        self.emission.set_bonus_multiplier(multiplier)?;
        tracing::info!(multiplier, block = ctx.block, "bonus multiplier updated");
        Ok(())
    }

    /// Rotate the dev address. Only the current dev address may call this.
    pub fn set_dev_address(&mut self, ctx: &TxContext, new_dev: Address) -> Result<(), FarmError> {
        self.emission.set_dev_address(&ctx.caller, new_dev)
    }

    /// Rotate the fee address. Only the current fee address may call this.
    pub fn set_fee_address(&mut self, ctx: &TxContext, new_fee: Address) -> Result<(), FarmError> {
        self.emission.set_fee_address(&ctx.caller, new_fee)
    }

    pub fn transfer_ownership(&mut self, ctx: &TxContext, new_owner: Address) -> Result<(), FarmError> {
        self.authority.transfer(&ctx.caller, new_owner)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    /// BAMI `user` could harvest from `pool_id` at `block`, without mutating
    /// anything. Ignores the buffer cap.
    pub fn pending_bami(&self, pool_id: PoolId, user: &Address, block: u64) -> Result<Amount, FarmError> {
        let pool = self.registry.get(pool_id)?;
        let acc = accountant::accrue(pool, &self.emission, self.registry.total_weight(), block)?
            .map_or(pool.acc_reward_per_share, |accrual| accrual.acc_reward_per_share);
        accountant::pending(&self.accountant.position(pool_id, user), acc)
    }

    pub fn pool_length(&self) -> usize {
        self.registry.len()
    }

    pub fn pool_info(&self, pool_id: PoolId) -> Result<&Pool, FarmError> {
        self.registry.get(pool_id)
    }

    pub fn user_info(&self, pool_id: PoolId, user: &Address) -> Position {
        self.accountant.position(pool_id, user)
    }

    pub fn total_weight(&self) -> u64 {
        self.registry.total_weight()
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    pub fn emission(&self) -> &EmissionController {
        &self.emission
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn accountant(&self) -> &RewardAccountant {
        &self.accountant
    }

    pub fn bami(&self) -> &BamiToken {
        &self.bami
    }

    /// Direct access for BAMI holders' own transfers and approvals.
    pub fn bami_mut(&mut self) -> &mut BamiToken {
        &mut self.bami
    }

    pub fn syrup(&self) -> &SyrupBar {
        &self.syrup
    }

    /// Direct access for SYRUP holders' own transfers.
    pub fn syrup_mut(&mut self) -> &mut SyrupBar {
        &mut self.syrup
    }

    /// BAMI sitting in the syrup buffer, waiting to be harvested.
    pub fn payout_buffer(&self) -> Amount {
        self.syrup.buffer(&self.bami)
    }

    pub fn stake_ledger(&self, stake_asset: &AssetId) -> Result<&TokenLedger, FarmError> {
        self.stake_assets
            .get(stake_asset)
            .ok_or_else(|| FarmError::NotFound(format!("stake asset {}", stake_asset)))
    }

    /// Host-side access to a stake asset's ledger (funding depositors, etc.).
    pub fn stake_ledger_mut(&mut self, stake_asset: &AssetId) -> Result<&mut TokenLedger, FarmError> {
        self.stake_assets
            .get_mut(stake_asset)
            .ok_or_else(|| FarmError::NotFound(format!("stake asset {}", stake_asset)))
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        FarmSnapshot {
            pools: self.registry.iter().map(|(_, p)| p.clone()).collect(),
            total_weight: self.registry.total_weight(),
            tokens_per_block: self.emission.tokens_per_block(),
            start_block: self.emission.start_block(),
            bonus_multiplier: self.emission.bonus_multiplier(),
            bami_supply: self.bami.total_supply(),
            syrup_supply: self.syrup.total_supply(),
            payout_buffer: self.payout_buffer(),
        }
    }

    pub fn snapshot_json(&self) -> Result<String, FarmError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::derive("owner")
    }

    fn emission() -> EmissionController {
        EmissionController::new(10, 0, Address::derive("dev"), Address::derive("fee"), 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_chef_controls_tokens() {
        let chef = MasterChef::new(owner(), emission());
        assert_eq!(chef.account(), MasterChef::account_address());
        assert_eq!(chef.bami().owner(), chef.account());
        assert_eq!(chef.syrup().owner(), chef.account());
        assert_eq!(chef.owner(), owner());
        assert_eq!(chef.pool_length(), 0);
    }

    #[test]
    fn test_with_tokens_requires_chef_ownership() {
        let err = MasterChef::with_tokens(
            owner(),
            BamiToken::new(owner()),
            SyrupBar::new(MasterChef::account_address()),
            emission(),
        )
        .unwrap_err();
        assert!(matches!(err, FarmError::Unauthorized(_)));
    }

    #[test]
    fn test_add_pool_creates_custody_ledger() {
        let mut chef = MasterChef::new(owner(), emission());
        let ctx = TxContext::new(owner(), 5);
        let pid = chef.add_pool(&ctx, AssetId::new("LP"), 3, 0).unwrap();
        assert_eq!(chef.pool_info(pid).unwrap().last_reward_block, 5);
        assert_eq!(chef.stake_ledger(&AssetId::new("LP")).unwrap().total_supply(), 0);
        assert!(chef.stake_ledger(&AssetId::new("other")).is_err());
    }

    #[test]
    fn test_harvest_without_position_stores_nothing() {
        let mut chef = MasterChef::new(owner(), emission());
        let ctx = TxContext::new(owner(), 0);
        let pid = chef.add_pool(&ctx, AssetId::new("LP"), 1, 0).unwrap();
        let user = Address::derive("user");
        let settlement = chef.harvest(&ctx.with_caller(user), pid).unwrap();
        assert_eq!(settlement.paid, 0);
        assert_eq!(chef.accountant().positions_in(pid).count(), 0);
    }

    #[test]
    fn test_lost_mint_authority_fails_before_pulling_stake() {
        let mut chef = MasterChef::new(owner(), emission());
        let ctx = TxContext::new(owner(), 0);
        let asset = AssetId::new("LP");
        let pid = chef.add_pool(&ctx, asset.clone(), 1, 0).unwrap();
        let user = Address::derive("user");
        chef.stake_ledger_mut(&asset).unwrap().mint(&user, 100).unwrap();
        let user_ctx = ctx.with_caller(user);
        chef.approve_stake(&user_ctx, &asset, 100).unwrap();
        let account = chef.account();
        chef.syrup_mut().transfer_ownership(&account, owner()).unwrap();

        let err = chef.deposit(&user_ctx, pid, 100).unwrap_err();
        assert!(matches!(err, FarmError::Unauthorized(_)));
        let ledger = chef.stake_ledger(&asset).unwrap();
        assert_eq!(ledger.balance_of(&user), 100);
        assert_eq!(ledger.balance_of(&account), 0);
        assert_eq!(ledger.allowance(&user, &account), 100);
        assert_eq!(chef.user_info(pid, &user), Position::default());
    }

    #[test]
    fn test_mass_update_failing_on_later_pool_moves_nothing() {
        let emission =
            EmissionController::new(u128::MAX / 2, 0, Address::derive("dev"), Address::derive("fee"), 0, 0)
                .unwrap();
        let mut chef = MasterChef::new(owner(), emission);
        let ctx = TxContext::new(owner(), 0);
        let user = Address::derive("user");
        for (name, weight) in [("A", 1), ("B", 3)] {
            let asset = AssetId::new(name);
            let pid = chef.add_pool(&ctx, asset.clone(), weight, 0).unwrap();
            chef.stake_ledger_mut(&asset).unwrap().mint(&user, 10).unwrap();
            chef.approve_stake(&ctx.with_caller(user), &asset, 10).unwrap();
            chef.deposit(&ctx.with_caller(user), pid, 10).unwrap();
        }
        let before = chef.snapshot();

        // Pool A's share fits; pool B's weight pushes the product past u128.
        let err = chef.mass_update_pools(1).unwrap_err();
        assert!(matches!(err, FarmError::Overflow(_)));
        assert_eq!(chef.snapshot(), before);
        assert_eq!(chef.pool_info(0).unwrap().last_reward_block, 0);
        assert_eq!(chef.bami().total_supply(), 0);
    }
}
