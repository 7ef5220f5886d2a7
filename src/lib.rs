//! LST 再平衡 performer
//!
//! 由外部任务分发框架驱动：校验任务 -> 从收益信号计算 tick 偏移 ->
//! (可选) 调用 hook 合约的 `executeRebalance` -> 总是返回计算结果。

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod infrastructure;
pub mod logging;
pub mod math;
pub mod model;

pub use crate::config::AppConfig;
pub use crate::core::{PoolKey, RebalanceTaskData, TaskRequest, TaskResponse, TickShift};
pub use crate::engine::{ExecutionOutcome, Performer, TaskReport, TaskWorker};
pub use crate::error::{ConfigError, ExecutionError, TaskError};
pub use crate::math::tick_shift::compute_tick_shift;
