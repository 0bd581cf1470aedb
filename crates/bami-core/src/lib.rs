// crates/bami-core/src/lib.rs
//
// bami-core: Core types, errors, and authority primitives for the Bami farm.
//
// This is the leaf crate of the workspace. It defines account identifiers,
// the transaction context handed to every engine operation, the single-owner
// authority model, the error taxonomy, and the traits at the seams between
// the engine and its host (block clock, base fungible ledger).

pub mod address;
pub mod authority;
pub mod context;
pub mod error;
pub mod traits;

/// Token amounts in base units. Every ledger and accumulator uses this.
pub type Amount = u128;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use bami_core::Address;`
pub use address::{Address, AssetId};
pub use authority::Authority;
pub use context::TxContext;
pub use error::FarmError;
pub use traits::{BlockClock, FungibleAsset};
