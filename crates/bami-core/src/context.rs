// crates/bami-core/src/context.rs

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Ambient context of one transaction: who is calling, and at which block.
///
/// The host supplies this; the engine never advances the block itself and
/// tolerates the same block across consecutive calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    pub caller: Address,
    pub block: u64,
}

impl TxContext {
    pub fn new(caller: Address, block: u64) -> Self {
        Self { caller, block }
    }

    /// Same block, different caller.
    pub fn with_caller(&self, caller: Address) -> Self {
        Self {
            caller,
            block: self.block,
        }
    }
}
