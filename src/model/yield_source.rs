use ethers::abi::{self, ParamType, Token};
use ethers::types::U256;
use std::fmt;

use crate::core::{RebalanceTaskData, TaskRequest};
use crate::error::TaskError;

/// payload 的 ABI 布局：(bytes32, uint64, uint64, uint64, uint64)，全部是静态类型，固定 160 字节
pub const TASK_DATA_LEN: usize = 5 * 32;

/// 收益信号来源
/// 宿主先调 validate()，通过后 yield_bps() 不能再失败
pub trait YieldSource: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn validate(&self, task: &TaskRequest) -> Result<(), TaskError> {
        let _ = task;
        Ok(())
    }

    fn yield_bps(&self, task: &TaskRequest) -> Result<u64, TaskError>;
}

/// 固定收益 (payload 完全忽略)
#[derive(Debug, Clone, Copy)]
pub struct FixedYield {
    pub bps: u64,
}

impl FixedYield {
    pub const DEFAULT_BPS: u64 = 50;
}

impl Default for FixedYield {
    fn default() -> Self {
        Self { bps: Self::DEFAULT_BPS }
    }
}

impl YieldSource for FixedYield {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn yield_bps(&self, _task: &TaskRequest) -> Result<u64, TaskError> {
        Ok(self.bps)
    }
}

/// 从 payload 解出 RebalanceTaskData
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiPayloadDecoder;

impl YieldSource for AbiPayloadDecoder {
    fn name(&self) -> &'static str {
        "abi_payload"
    }

    fn validate(&self, task: &TaskRequest) -> Result<(), TaskError> {
        decode_task_data(&task.payload).map(|_| ())
    }

    fn yield_bps(&self, task: &TaskRequest) -> Result<u64, TaskError> {
        let data = decode_task_data(&task.payload)?;
        tracing::info!(
            pool_id = %ethers::utils::hex::encode(data.pool_id),
            yield_bps = data.yield_bps,
            cumulative_yield = data.cumulative_yield,
            position_count = data.position_count,
            observed_at = ?data.observed_at(),
            "📊 Decoded rebalance task data"
        );
        Ok(data.yield_bps)
    }
}

pub fn decode_task_data(payload: &[u8]) -> Result<RebalanceTaskData, TaskError> {
    if payload.len() != TASK_DATA_LEN {
        return Err(TaskError::MalformedPayload(format!(
            "expected {} bytes, got {}",
            TASK_DATA_LEN,
            payload.len()
        )));
    }

    let layout = [
        ParamType::FixedBytes(32),
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::Uint(64),
    ];
    let tokens = abi::decode(&layout, payload)
        .map_err(|e| TaskError::MalformedPayload(e.to_string()))?;

    let mut tokens = tokens.into_iter();
    let pool_id = match tokens.next() {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => {
            let mut id = [0u8; 32];
            id.copy_from_slice(&bytes);
            id
        }
        other => return Err(unexpected_token("pool_id", other)),
    };

    Ok(RebalanceTaskData {
        pool_id,
        yield_bps: uint64_field("yield_bps", tokens.next())?,
        cumulative_yield: uint64_field("cumulative_yield", tokens.next())?,
        position_count: uint64_field("position_count", tokens.next())?,
        timestamp: uint64_field("timestamp", tokens.next())?,
    })
}

/// 反向编码，给上游生产者和测试用
pub fn encode_task_data(data: &RebalanceTaskData) -> Vec<u8> {
    abi::encode(&[
        Token::FixedBytes(data.pool_id.to_vec()),
        Token::Uint(U256::from(data.yield_bps)),
        Token::Uint(U256::from(data.cumulative_yield)),
        Token::Uint(U256::from(data.position_count)),
        Token::Uint(U256::from(data.timestamp)),
    ])
}

fn uint64_field(field: &'static str, token: Option<Token>) -> Result<u64, TaskError> {
    match token {
        // uint64 的高 24 字节必须为零
        Some(Token::Uint(value)) if value <= U256::from(u64::MAX) => Ok(value.as_u64()),
        Some(Token::Uint(value)) => Err(TaskError::MalformedPayload(format!(
            "{field} does not fit in uint64: {value}"
        ))),
        other => Err(unexpected_token(field, other)),
    }
}

fn unexpected_token(field: &'static str, token: Option<Token>) -> TaskError {
    TaskError::MalformedPayload(format!("unexpected value for {field}: {token:?}"))
}
