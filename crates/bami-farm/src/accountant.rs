// crates/bami-farm/src/accountant.rs
//
// Reward accounting: accumulated-reward-per-share and reward debt.
//
// Each pool carries `acc_reward_per_share`, the total staker reward one unit
// of stake would have earned since the pool was created, scaled by
// ACC_PRECISION. Each position records `reward_debt`, the part of that total
// already settled for its current stake:
//
//   reward_debt = staked * acc_reward_per_share / ACC_PRECISION
//   pending     = staked * acc_reward_per_share / ACC_PRECISION - reward_debt
//
// Re-basing the debt after every stake change keeps `pending` exact without
// iterating over history. Integer division truncates; the dust lost per
// settlement is below one base unit per staked unit and stays in the buffer.
//
// The accumulator and the debt are 256-bit. With 18-decimal amounts a stake
// times the accumulator leaves u128 range long before any reward does; only
// `pending`, which is bounded by real emission, narrows back to `Amount`.

use std::collections::BTreeMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use bami_core::{Address, Amount, FarmError};

use crate::emission::{EmissionController, EmissionSplit};
use crate::pool::{Pool, PoolId};

/// Fixed-point scale of `acc_reward_per_share`: 10^12.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// One depositor's stake in one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub staked: Amount,
    pub reward_debt: U256,
}

/// The effect of advancing a pool from `last_reward_block` to `to_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub to_block: u64,
    /// BAMI to mint for the elapsed blocks; all zero for an unstaked pool.
    pub split: EmissionSplit,
    /// The pool's `acc_reward_per_share` once this accrual is applied.
    pub acc_reward_per_share: U256,
}

/// Compute the accrual that settling `pool` at `block` would produce.
///
/// Returns `None` when `block` is not past the pool's last reward block,
/// which makes repeated settlement within one block a no-op. An unstaked pool
/// yields an accrual that only advances the block: nothing is minted and
/// nothing is banked for later. Every overflow surfaces here, so applying the
/// result cannot fail.
pub fn accrue(
    pool: &Pool,
    emission: &EmissionController,
    total_weight: u64,
    block: u64,
) -> Result<Option<Accrual>, FarmError> {
    if block <= pool.last_reward_block {
        return Ok(None);
    }
    if pool.total_staked == 0 {
        return Ok(Some(Accrual {
            to_block: block,
            split: EmissionSplit::default(),
            acc_reward_per_share: pool.acc_reward_per_share,
        }));
    }

    let reward = emission.pool_reward(
        pool.last_reward_block,
        block,
        pool.alloc_weight,
        total_weight,
    )?;
    let split = emission.split(reward)?;
    // u128 * 10^12 always fits in 256 bits.
    let increment =
        U256::from(split.stakers) * U256::from(ACC_PRECISION) / U256::from(pool.total_staked);
    let acc_reward_per_share = pool
        .acc_reward_per_share
        .checked_add(increment)
        .ok_or_else(|| FarmError::overflow("accrue"))?;

    Ok(Some(Accrual {
        to_block: block,
        split,
        acc_reward_per_share,
    }))
}

/// Fold an accrual into the pool.
pub fn apply(pool: &mut Pool, accrual: &Accrual) {
    pool.acc_reward_per_share = accrual.acc_reward_per_share;
    pool.last_reward_block = accrual.to_block;
}

/// `staked * acc / ACC_PRECISION`: the reward debt a stake carries at `acc`.
pub fn accumulated(staked: Amount, acc_reward_per_share: U256) -> Result<U256, FarmError> {
    U256::from(staked)
        .checked_mul(acc_reward_per_share)
        .map(|v| v / U256::from(ACC_PRECISION))
        .ok_or_else(|| FarmError::overflow("accumulated"))
}

/// Reward owed to `position` at `acc` and not yet settled.
pub fn pending(position: &Position, acc_reward_per_share: U256) -> Result<Amount, FarmError> {
    // acc never decreases, so the debt never exceeds the accumulated total.
    let owed = accumulated(position.staked, acc_reward_per_share)?
        .saturating_sub(position.reward_debt);
    u128::try_from(owed).map_err(|_| FarmError::overflow("pending"))
}

/// Positions of every depositor, grouped by pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardAccountant {
    positions: BTreeMap<PoolId, BTreeMap<Address, Position>>,
}

impl RewardAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// The position of `owner` in `pool_id`; zero if they never deposited.
    pub fn position(&self, pool_id: PoolId, owner: &Address) -> Position {
        self.positions
            .get(&pool_id)
            .and_then(|m| m.get(owner))
            .copied()
            .unwrap_or_default()
    }

    /// Overwrite a position. Positions that reach zero stay in the book as
    /// inert records.
    pub(crate) fn store(&mut self, pool_id: PoolId, owner: Address, position: Position) {
        self.positions
            .entry(pool_id)
            .or_default()
            .insert(owner, position);
    }

    pub fn positions_in(&self, pool_id: PoolId) -> impl Iterator<Item = (&Address, &Position)> {
        self.positions.get(&pool_id).into_iter().flat_map(|m| m.iter())
    }

    /// Sum of stakes recorded for `pool_id`. Equals the pool's `total_staked`.
    pub fn staked_in(&self, pool_id: PoolId) -> Amount {
        self.positions_in(pool_id).map(|(_, p)| p.staked).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bami_core::AssetId;

    fn emission(tokens_per_block: Amount) -> EmissionController {
        // No dev/fee share so stakers get the whole pool reward.
        EmissionController::new(
            tokens_per_block,
            100,
            Address::derive("dev"),
            Address::derive("fee"),
            0,
            0,
        )
        .unwrap()
    }

    fn pool(total_staked: Amount, last_reward_block: u64) -> Pool {
        Pool {
            stake_asset: AssetId::new("LP"),
            alloc_weight: 1,
            acc_reward_per_share: U256::zero(),
            last_reward_block,
            total_staked,
            deposit_fee_bps: 0,
        }
    }

    #[test]
    fn test_same_block_is_noop() {
        let p = pool(1_000, 150);
        assert_eq!(accrue(&p, &emission(10), 1, 150).unwrap(), None);
        assert_eq!(accrue(&p, &emission(10), 1, 149).unwrap(), None);
    }

    #[test]
    fn test_empty_pool_only_advances() {
        let mut p = pool(0, 100);
        let accrual = accrue(&p, &emission(10), 1, 120).unwrap().unwrap();
        assert_eq!(accrual.split.total(), 0);
        apply(&mut p, &accrual);
        assert_eq!(p.last_reward_block, 120);
        assert_eq!(p.acc_reward_per_share, U256::zero());
    }

    #[test]
    fn test_accrual_per_share() {
        let mut p = pool(1_000, 100);
        // 10 blocks * 10 per block = 100 reward over 1000 staked
        let accrual = accrue(&p, &emission(10), 1, 110).unwrap().unwrap();
        assert_eq!(accrual.split.stakers, 100);
        apply(&mut p, &accrual);
        assert_eq!(p.acc_reward_per_share, U256::from(100 * ACC_PRECISION / 1_000));

        let position = Position {
            staked: 250,
            reward_debt: U256::zero(),
        };
        assert_eq!(pending(&position, p.acc_reward_per_share).unwrap(), 25);
    }

    #[test]
    fn test_pending_respects_debt() {
        let acc = U256::from(3 * ACC_PRECISION);
        let position = Position {
            staked: 10,
            reward_debt: accumulated(10, U256::from(ACC_PRECISION)).unwrap(),
        };
        assert_eq!(pending(&position, acc).unwrap(), 20);
    }

    #[test]
    fn test_truncation_dust() {
        let mut p = pool(3, 100);
        let accrual = accrue(&p, &emission(1), 1, 101).unwrap().unwrap();
        apply(&mut p, &accrual);
        // 1 reward over 3 shares: each share gets 0.333..., truncated
        let one = Position {
            staked: 1,
            reward_debt: U256::zero(),
        };
        assert_eq!(pending(&one, p.acc_reward_per_share).unwrap(), 0);
        let all = Position {
            staked: 3,
            reward_debt: U256::zero(),
        };
        assert!(pending(&all, p.acc_reward_per_share).unwrap() <= 1);
    }

    #[test]
    fn test_whale_stake_after_dust_accrual() {
        // One base unit staked while 1e18 per block accrues for 500 blocks.
        let mut p = pool(1, 100);
        let accrual = accrue(&p, &emission(1_000_000_000_000_000_000), 1, 600)
            .unwrap()
            .unwrap();
        apply(&mut p, &accrual);
        assert!(p.acc_reward_per_share > U256::from(u128::MAX) / U256::from(1_000_000u64));

        let whale: Amount = 1_000_000_000_000_000_000_000_000;
        let debt = accumulated(whale, p.acc_reward_per_share).unwrap();
        assert!(debt > U256::from(u128::MAX));
        let position = Position {
            staked: whale,
            reward_debt: debt,
        };
        assert_eq!(pending(&position, p.acc_reward_per_share).unwrap(), 0);
    }

    #[test]
    fn test_pending_beyond_amount_range_is_overflow() {
        let position = Position {
            staked: Amount::MAX,
            reward_debt: U256::zero(),
        };
        let acc = U256::from(ACC_PRECISION) * U256::from(2u8);
        assert!(matches!(
            pending(&position, acc),
            Err(FarmError::Overflow(_))
        ));
    }

    #[test]
    fn test_positions_book() {
        let mut book = RewardAccountant::new();
        let alice = Address::derive("alice");
        assert_eq!(book.position(0, &alice), Position::default());
        book.store(
            0,
            alice,
            Position {
                staked: 5,
                reward_debt: U256::from(1u8),
            },
        );
        book.store(
            0,
            Address::derive("bob"),
            Position {
                staked: 7,
                reward_debt: U256::zero(),
            },
        );
        assert_eq!(book.position(0, &alice).staked, 5);
        assert_eq!(book.staked_in(0), 12);
        assert_eq!(book.staked_in(1), 0);
    }
}
