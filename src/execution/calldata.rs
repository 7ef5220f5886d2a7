use ethers::abi::{self, Token};
use ethers::types::{Bytes, U256};

use crate::core::{PoolKey, TickShift};
use crate::error::ExecutionError;

/// 钩子合约上的函数签名 (canonical form，用于计算 selector)
pub const EXECUTE_REBALANCE_SIGNATURE: &str =
    "executeRebalance((address,address,uint24,int24,address),int24,uint32)";

const UINT24_MAX: u32 = (1 << 24) - 1;
const INT24_MIN: i32 = -(1 << 23);
const INT24_MAX: i32 = (1 << 23) - 1;

pub fn execute_rebalance_selector() -> [u8; 4] {
    ethers::utils::id(EXECUTE_REBALANCE_SIGNATURE)
}

/// selector ++ abi.encode(poolKey, tickShift, salt)
pub fn encode_execute_rebalance(
    pool_key: &PoolKey,
    tick_shift: TickShift,
    salt: u32,
) -> Result<Bytes, ExecutionError> {
    if pool_key.fee > UINT24_MAX {
        return Err(ExecutionError::CallEncodingFailed(format!(
            "fee {} does not fit in uint24",
            pool_key.fee
        )));
    }

    let key = Token::Tuple(vec![
        Token::Address(pool_key.currency0),
        Token::Address(pool_key.currency1),
        Token::Uint(U256::from(pool_key.fee)),
        int24_token("tickSpacing", pool_key.tick_spacing)?,
        Token::Address(pool_key.hooks),
    ]);

    let mut calldata = execute_rebalance_selector().to_vec();
    calldata.extend(abi::encode(&[
        key,
        int24_token("tickShift", tick_shift.get())?,
        Token::Uint(U256::from(salt)),
    ]));
    Ok(Bytes::from(calldata))
}

// 有符号数按 two's complement 扩展到 256 位
fn int24_token(field: &str, value: i32) -> Result<Token, ExecutionError> {
    if !(INT24_MIN..=INT24_MAX).contains(&value) {
        return Err(ExecutionError::CallEncodingFailed(format!(
            "{field} {value} does not fit in int24"
        )));
    }

    let magnitude = U256::from(value.unsigned_abs());
    let word = if value < 0 {
        U256::MAX - magnitude + U256::one()
    } else {
        magnitude
    };
    Ok(Token::Int(word))
}
