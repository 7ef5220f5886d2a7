pub mod calldata;
pub mod hook_executor;

pub use hook_executor::{HookExecutor, RebalanceExecutor, REBALANCE_GAS_LIMIT};
