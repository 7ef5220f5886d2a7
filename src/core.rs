use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::fmt;

// 1. 框架下发的任务 (Task Request)
// task_id / payload 在 JSON 中都是 0x 开头的 hex 字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: Bytes,
    #[serde(default)]
    pub payload: Bytes,
}

impl TaskRequest {
    pub fn new(task_id: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            task_id: task_id.into(),
            payload: payload.into(),
        }
    }
}

// 2. 返回给框架的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_id: Bytes,
    pub result: Bytes,
}

// 3. 解码后的任务数据 (来自 payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceTaskData {
    pub pool_id: [u8; 32],
    pub yield_bps: u64,
    pub cumulative_yield: u64,
    pub position_count: u64,
    pub timestamp: u64, // unix 秒
}

impl RebalanceTaskData {
    pub fn observed_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        chrono::DateTime::from_timestamp(secs, 0)
    }
}

// 4. AMM 池标识 (Uniswap v4 PoolKey)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,          // uint24
    pub tick_spacing: i32, // int24
    pub hooks: Address,
}

/// 5. Tick 偏移量，构造时保证落在 [-1000, 1000]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickShift(i32);

impl TickShift {
    pub const MAX: i32 = 1000;
    pub const MIN: i32 = -1000;

    /// 越界的值会被截断到边界
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as i32)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    /// ASCII 十进制编码，只有负数才带 '-'
    pub fn to_result_bytes(self) -> Bytes {
        Bytes::from(self.0.to_string().into_bytes())
    }
}

impl fmt::Display for TickShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
