// crates/bami-farm/src/pool.rs
//
// Pool registry: the ordered table of staking pools and their weights.
//
// A pool pairs one stake asset with an allocation weight. The registry keeps
// the running sum of all weights so a pool's share of emission is a single
// division. Settlement before a weight change is the chef's job; the registry
// only keeps the table and the sum consistent.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use bami_core::{Amount, AssetId, FarmError};

/// Index of a pool in the registry. Pools are never removed, so ids are stable.
pub type PoolId = usize;

/// Largest per-pool deposit fee: 4%.
pub const MAX_DEPOSIT_FEE_BPS: u16 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Asset depositors stake into this pool.
    pub stake_asset: AssetId,
    /// Relative share of total emission.
    pub alloc_weight: u64,
    /// Cumulative staker reward per staked unit, scaled by `ACC_PRECISION`.
    pub acc_reward_per_share: U256,
    /// Last block whose emission has been accounted for.
    pub last_reward_block: u64,
    /// Sum of all positions' stakes in this pool.
    pub total_staked: Amount,
    /// Fee skimmed from each deposit, in basis points.
    pub deposit_fee_bps: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    total_weight: u64,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pool and return its id.
    ///
    /// # Errors
    /// - `FarmError::DuplicatePool` if `stake_asset` already has a pool.
    /// - `FarmError::InvalidConfig` if `deposit_fee_bps` exceeds the maximum.
    /// - `FarmError::Overflow` if the weight sum overflows.
    pub fn add(
        &mut self,
        stake_asset: AssetId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
        last_reward_block: u64,
    ) -> Result<PoolId, FarmError> {
        if self.find(&stake_asset).is_some() {
            return Err(FarmError::DuplicatePool(stake_asset.to_string()));
        }
        check_deposit_fee(deposit_fee_bps)?;
        let total_weight = self
            .total_weight
            .checked_add(alloc_weight)
            .ok_or_else(|| FarmError::overflow("PoolRegistry::add"))?;

        self.pools.push(Pool {
            stake_asset,
            alloc_weight,
            acc_reward_per_share: U256::zero(),
            last_reward_block,
            total_staked: 0,
            deposit_fee_bps,
        });
        self.total_weight = total_weight;
        Ok(self.pools.len() - 1)
    }

    /// Change a pool's weight and deposit fee. Returns the previous weight.
    pub fn set_weight(
        &mut self,
        pool_id: PoolId,
        alloc_weight: u64,
        deposit_fee_bps: u16,
    ) -> Result<u64, FarmError> {
        check_deposit_fee(deposit_fee_bps)?;
        let old = self.get(pool_id)?.alloc_weight;
        let total_weight = (self.total_weight - old)
            .checked_add(alloc_weight)
            .ok_or_else(|| FarmError::overflow("PoolRegistry::set_weight"))?;

        let pool = self.get_mut(pool_id)?;
        pool.alloc_weight = alloc_weight;
        pool.deposit_fee_bps = deposit_fee_bps;
        self.total_weight = total_weight;
        Ok(old)
    }

    /// # Errors
    /// Returns `FarmError::NotFound` if `pool_id` is out of range.
    pub fn get(&self, pool_id: PoolId) -> Result<&Pool, FarmError> {
        self.pools
            .get(pool_id)
            .ok_or_else(|| FarmError::NotFound(format!("pool {}", pool_id)))
    }

    pub(crate) fn get_mut(&mut self, pool_id: PoolId) -> Result<&mut Pool, FarmError> {
        self.pools
            .get_mut(pool_id)
            .ok_or_else(|| FarmError::NotFound(format!("pool {}", pool_id)))
    }

    pub fn find(&self, stake_asset: &AssetId) -> Option<PoolId> {
        self.pools.iter().position(|p| &p.stake_asset == stake_asset)
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolId, &Pool)> {
        self.pools.iter().enumerate()
    }
}

pub(crate) fn check_deposit_fee(deposit_fee_bps: u16) -> Result<(), FarmError> {
    if deposit_fee_bps > MAX_DEPOSIT_FEE_BPS {
        return Err(FarmError::InvalidConfig(format!(
            "deposit fee {} bps exceeds maximum {} bps",
            deposit_fee_bps, MAX_DEPOSIT_FEE_BPS
        )));
    }
    Ok(())
}
