// crates/bami-farm/src/config.rs
//
// Deployment configuration for the farm.
// Loaded from a TOML file or populated with defaults, then validated and
// turned into a ready MasterChef.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use bami_core::{Address, FarmError};

use crate::chef::MasterChef;
use crate::emission::{
    validate_shares, EmissionController, DEFAULT_BONUS_MULTIPLIER, DEFAULT_DEV_SHARE_BPS,
    DEFAULT_FEE_SHARE_BPS,
};
use crate::syrup::{SyrupBar, SYRUP_NAME, SYRUP_SYMBOL};
use crate::token::{BamiToken, BAMI_NAME, BAMI_SYMBOL};

/// 1 BAMI in base units (18 decimals).
pub const BAMI_UNIT: u64 = 1_000_000_000_000_000_000;

/// Farm deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Controlling address for pool and emission administration.
    #[serde(default = "default_owner")]
    pub owner: Address,

    /// Receives the dev share of emission.
    #[serde(default = "default_dev_address")]
    pub dev_address: Address,

    /// Receives the fee share of emission and pool deposit fees.
    #[serde(default = "default_fee_address")]
    pub fee_address: Address,

    /// BAMI emitted per block across all pools, in base units.
    #[serde(default = "default_tokens_per_block")]
    pub tokens_per_block: u64,

    /// First block that emits.
    #[serde(default)]
    pub start_block: u64,

    #[serde(default = "default_bonus_multiplier")]
    pub bonus_multiplier: u64,

    /// Dev share of each pool's emission, in basis points.
    #[serde(default = "default_dev_share_bps")]
    pub dev_share_bps: u16,

    /// Fee share of each pool's emission, in basis points.
    #[serde(default = "default_fee_share_bps")]
    pub fee_share_bps: u16,

    #[serde(default = "default_reward_name")]
    pub reward_name: String,

    #[serde(default = "default_reward_symbol")]
    pub reward_symbol: String,

    #[serde(default = "default_receipt_name")]
    pub receipt_name: String,

    #[serde(default = "default_receipt_symbol")]
    pub receipt_symbol: String,
}

fn default_owner() -> Address {
    Address::derive("bami:owner")
}

fn default_dev_address() -> Address {
    Address::derive("bami:dev")
}

fn default_fee_address() -> Address {
    Address::derive("bami:fee")
}

fn default_tokens_per_block() -> u64 {
    BAMI_UNIT
}

fn default_bonus_multiplier() -> u64 {
    DEFAULT_BONUS_MULTIPLIER
}

fn default_dev_share_bps() -> u16 {
    DEFAULT_DEV_SHARE_BPS
}

fn default_fee_share_bps() -> u16 {
    DEFAULT_FEE_SHARE_BPS
}

fn default_reward_name() -> String {
    BAMI_NAME.to_string()
}

fn default_reward_symbol() -> String {
    BAMI_SYMBOL.to_string()
}

fn default_receipt_name() -> String {
    SYRUP_NAME.to_string()
}

fn default_receipt_symbol() -> String {
    SYRUP_SYMBOL.to_string()
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            dev_address: default_dev_address(),
            fee_address: default_fee_address(),
            tokens_per_block: default_tokens_per_block(),
            start_block: 0,
            bonus_multiplier: default_bonus_multiplier(),
            dev_share_bps: default_dev_share_bps(),
            fee_share_bps: default_fee_share_bps(),
            reward_name: default_reward_name(),
            reward_symbol: default_reward_symbol(),
            receipt_name: default_receipt_name(),
            receipt_symbol: default_receipt_symbol(),
        }
    }
}

impl FarmConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FarmError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, FarmError> {
        let config: FarmConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// # Errors
    /// Returns `FarmError::InvalidConfig` for zero addresses, a zero bonus
    /// multiplier, or shares summing above 100%.
    pub fn validate(&self) -> Result<(), FarmError> {
        for (what, address) in [
            ("owner", &self.owner),
            ("dev_address", &self.dev_address),
            ("fee_address", &self.fee_address),
        ] {
            if address.is_zero() {
                return Err(FarmError::InvalidConfig(format!("{} is the zero address", what)));
            }
        }
        if self.bonus_multiplier == 0 {
            return Err(FarmError::InvalidConfig(
                "bonus_multiplier must be at least 1".to_string(),
            ));
        }
        validate_shares(self.dev_share_bps, self.fee_share_bps)
    }

    pub fn emission_controller(&self) -> Result<EmissionController, FarmError> {
        let mut emission = EmissionController::new(
            self.tokens_per_block as u128,
            self.start_block,
            self.dev_address,
            self.fee_address,
            self.dev_share_bps,
            self.fee_share_bps,
        )?;
        emission.set_bonus_multiplier(self.bonus_multiplier)?;
        Ok(emission)
    }

    /// Validate and deploy: BAMI and SYRUP owned by the chef, no pools yet.
    pub fn build_chef(&self) -> Result<MasterChef, FarmError> {
        self.validate()?;
        let chef_account = MasterChef::account_address();
        let bami = BamiToken::with_metadata(chef_account, &self.reward_name, &self.reward_symbol);
        let syrup = SyrupBar::with_metadata(chef_account, &self.receipt_name, &self.receipt_symbol);
        MasterChef::with_tokens(self.owner, bami, syrup, self.emission_controller()?)
    }
}
