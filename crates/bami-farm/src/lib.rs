// crates/bami-farm/src/lib.rs
//
// bami-farm: BAMI emission, SYRUP receipts, staking pools, and reward
// accounting for the Bami yield farm.
//
// All amounts are in base units (18 decimals, see `config::BAMI_UNIT`).
// `MasterChef` is the engine; `FarmRuntime` wraps it for shared use.

pub mod accountant;
pub mod chef;
pub mod config;
pub mod emission;
pub mod pool;
pub mod runtime;
pub mod syrup;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use accountant::{Position, RewardAccountant, ACC_PRECISION};
pub use chef::{FarmSnapshot, MasterChef, Settlement};
pub use config::{FarmConfig, BAMI_UNIT};
pub use emission::{
    EmissionController, EmissionSplit, BPS_DENOMINATOR, DEFAULT_DEV_SHARE_BPS,
    DEFAULT_FEE_SHARE_BPS,
};
pub use pool::{Pool, PoolId, PoolRegistry, MAX_DEPOSIT_FEE_BPS};
pub use runtime::{FarmRuntime, ManualClock};
pub use syrup::{Payout, SyrupBar};
pub use token::{BamiToken, TokenLedger};

pub use primitive_types::U256;
