// crates/bami-farm/src/emission.rs
//
// Per-block BAMI emission and its split.
//
// Emission is flat: `tokens_per_block` for every block at or after
// `start_block`, scaled by a bonus multiplier (1 outside promotions). Each
// pool receives a slice proportional to its allocation weight, and every
// slice is split three ways:
//   - dev fund:  dev_share_bps / 10_000
//   - fee fund:  fee_share_bps / 10_000
//   - stakers:   the remainder, minted into the syrup buffer
//
// Nothing is pre-reserved. Blocks in which a pool has no stake produce no
// BAMI at all.

use serde::{Deserialize, Serialize};

use bami_core::{Address, Amount, FarmError};

/// Basis-point denominator: 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Default dev-fund share of emission: 10%.
pub const DEFAULT_DEV_SHARE_BPS: u16 = 1_000;

/// Default fee-fund share of emission: 5%.
pub const DEFAULT_FEE_SHARE_BPS: u16 = 500;

/// Multiplier applied outside bonus periods.
pub const DEFAULT_BONUS_MULTIPLIER: u64 = 1;

/// Three-way split of one pool's settled reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmissionSplit {
    pub dev: Amount,
    pub fee: Amount,
    pub stakers: Amount,
}

impl EmissionSplit {
    pub fn total(&self) -> Amount {
        self.dev + self.fee + self.stakers
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionController {
    tokens_per_block: Amount,
    start_block: u64,
    bonus_multiplier: u64,
    dev_address: Address,
    fee_address: Address,
    dev_share_bps: u16,
    fee_share_bps: u16,
}

impl EmissionController {
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the shares exceed 100% together.
    pub fn new(
        tokens_per_block: Amount,
        start_block: u64,
        dev_address: Address,
        fee_address: Address,
        dev_share_bps: u16,
        fee_share_bps: u16,
    ) -> Result<Self, FarmError> {
        validate_shares(dev_share_bps, fee_share_bps)?;
        Ok(Self {
            tokens_per_block,
            start_block,
            bonus_multiplier: DEFAULT_BONUS_MULTIPLIER,
            dev_address,
            fee_address,
            dev_share_bps,
            fee_share_bps,
        })
    }

    /// Emission rate at `block`: `tokens_per_block` once `start_block` is
    /// reached, zero before.
    pub fn rate_per_block(&self, block: u64) -> Amount {
        if block >= self.start_block {
            self.tokens_per_block
        } else {
            0
        }
    }

    /// Reward-bearing blocks in `[from, to)`, times the bonus multiplier.
    /// Blocks before `start_block` do not count.
    pub fn multiplier(&self, from: u64, to: u64) -> u64 {
        let from = from.max(self.start_block);
        if to <= from {
            return 0;
        }
        (to - from).saturating_mul(self.bonus_multiplier)
    }

    /// Total BAMI a pool of `weight` (out of `total_weight`) earns over
    /// `[from, to)`.
    ///
    /// # Errors
    /// Returns `FarmError::Overflow` if the intermediate product overflows.
    pub fn pool_reward(
        &self,
        from: u64,
        to: u64,
        weight: u64,
        total_weight: u64,
    ) -> Result<Amount, FarmError> {
        if weight == 0 || total_weight == 0 {
            return Ok(0);
        }
        let blocks = self.multiplier(from, to) as Amount;
        blocks
            .checked_mul(self.rate_per_block(to))
            .and_then(|v| v.checked_mul(weight as Amount))
            .map(|v| v / total_weight as Amount)
            .ok_or_else(|| FarmError::overflow("EmissionController::pool_reward"))
    }

    /// Split a pool's reward into dev, fee, and staker portions. The staker
    /// portion absorbs rounding, so the three always sum to `reward`.
    pub fn split(&self, reward: Amount) -> Result<EmissionSplit, FarmError> {
        let dev = bps_of(reward, self.dev_share_bps)?;
        let fee = bps_of(reward, self.fee_share_bps)?;
        Ok(EmissionSplit {
            dev,
            fee,
            stakers: reward - dev - fee,
        })
    }

    pub fn tokens_per_block(&self) -> Amount {
        self.tokens_per_block
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    pub fn bonus_multiplier(&self) -> u64 {
        self.bonus_multiplier
    }

    pub fn dev_address(&self) -> Address {
        self.dev_address
    }

    pub fn fee_address(&self) -> Address {
        self.fee_address
    }

    pub fn dev_share_bps(&self) -> u16 {
        self.dev_share_bps
    }

    pub fn fee_share_bps(&self) -> u16 {
        self.fee_share_bps
    }

    /// Callers must settle every pool first; the chef does.
    pub(crate) fn set_tokens_per_block(&mut self, tokens_per_block: Amount) {
        self.tokens_per_block = tokens_per_block;
    }

    /// Callers must settle every pool first; the chef does.
    pub(crate) fn set_bonus_multiplier(&mut self, multiplier: u64) -> Result<(), FarmError> {
        if multiplier == 0 {
            return Err(FarmError::InvalidConfig(
                "bonus multiplier must be at least 1".to_string(),
            ));
        }
        self.bonus_multiplier = multiplier;
        Ok(())
    }

    /// Rotate the dev-fund address. Only the current dev address may do so.
    pub fn set_dev_address(&mut self, caller: &Address, new_dev: Address) -> Result<(), FarmError> {
        if *caller != self.dev_address {
            return Err(FarmError::Unauthorized(format!(
                "caller {} is not the dev address",
                caller
            )));
        }
        reject_zero(&new_dev, "dev address")?;
        tracing::info!(from = %self.dev_address, to = %new_dev, "dev address rotated");
        self.dev_address = new_dev;
        Ok(())
    }

    /// Rotate the fee-fund address. Only the current fee address may do so.
    pub fn set_fee_address(&mut self, caller: &Address, new_fee: Address) -> Result<(), FarmError> {
        if *caller != self.fee_address {
            return Err(FarmError::Unauthorized(format!(
                "caller {} is not the fee address",
                caller
            )));
        }
        reject_zero(&new_fee, "fee address")?;
        tracing::info!(from = %self.fee_address, to = %new_fee, "fee address rotated");
        self.fee_address = new_fee;
        Ok(())
    }
}

/// `amount * bps / 10_000`, truncating.
pub fn bps_of(amount: Amount, bps: u16) -> Result<Amount, FarmError> {
    amount
        .checked_mul(bps as Amount)
        .map(|v| v / BPS_DENOMINATOR as Amount)
        .ok_or_else(|| FarmError::overflow("bps_of"))
}

pub(crate) fn validate_shares(dev_share_bps: u16, fee_share_bps: u16) -> Result<(), FarmError> {
    if dev_share_bps as u32 + fee_share_bps as u32 > BPS_DENOMINATOR as u32 {
        return Err(FarmError::InvalidConfig(format!(
            "dev share {} bps + fee share {} bps exceeds {} bps",
            dev_share_bps, fee_share_bps, BPS_DENOMINATOR
        )));
    }
    Ok(())
}

fn reject_zero(address: &Address, what: &str) -> Result<(), FarmError> {
    if address.is_zero() {
        return Err(FarmError::InvalidConfig(format!("{} is the zero address", what)));
    }
    Ok(())
}
