use async_trait::async_trait;
use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::core::{PoolKey, TickShift};
use crate::error::ExecutionError;
use crate::execution::calldata::encode_execute_rebalance;

/// 固定调用形状，不做 gas 估算
pub const REBALANCE_GAS_LIMIT: u64 = 500_000;

/// executeRebalance 的 salt 参数永远为 0
pub const REBALANCE_SALT: u32 = 0;

/// 把 tick 偏移量落到链上的执行器
/// TaskWorker 只依赖这个 trait，测试里可以换成假的实现
#[async_trait]
pub trait RebalanceExecutor: Send + Sync {
    async fn execute_rebalance(
        &self,
        tick_shift: TickShift,
        pool_key: &PoolKey,
    ) -> Result<TxHash, ExecutionError>;
}

// --- 钩子合约执行网关 ---
pub struct HookExecutor<M> {
    client: Arc<M>,
    wallet: LocalWallet, // 未绑定 chain id，每次调用时绑定
    hook_address: Address,
    call_timeout: Duration,
}

impl<M: Middleware + 'static> HookExecutor<M> {
    pub fn new(
        client: Arc<M>,
        wallet: LocalWallet,
        hook_address: Address,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            wallet,
            hook_address,
            call_timeout,
        }
    }

    pub fn hook_address(&self) -> Address {
        self.hook_address
    }

    pub fn operator(&self) -> Address {
        self.wallet.address()
    }

    async fn fetch_chain_id(&self) -> Result<U256, ExecutionError> {
        match timeout(self.call_timeout, self.client.get_chainid()).await {
            Ok(Ok(chain_id)) => Ok(chain_id),
            Ok(Err(e)) => Err(ExecutionError::ChainIdentityUnavailable(e.to_string())),
            Err(_) => Err(ExecutionError::ChainIdentityUnavailable(format!(
                "timed out after {:?}",
                self.call_timeout
            ))),
        }
    }

    fn build_signer(
        &self,
        chain_id: U256,
    ) -> Result<SignerMiddleware<Arc<M>, LocalWallet>, ExecutionError> {
        if chain_id > U256::from(u64::MAX) {
            return Err(ExecutionError::SignerConstructionFailed(format!(
                "chain id {chain_id} does not fit in u64"
            )));
        }
        let wallet = self.wallet.clone().with_chain_id(chain_id.as_u64());
        Ok(SignerMiddleware::new(self.client.clone(), wallet))
    }
}

#[async_trait]
impl<M: Middleware + 'static> RebalanceExecutor for HookExecutor<M> {
    async fn execute_rebalance(
        &self,
        tick_shift: TickShift,
        pool_key: &PoolKey,
    ) -> Result<TxHash, ExecutionError> {
        tracing::info!(
            hook_address = ?self.hook_address,
            tick_shift = tick_shift.get(),
            "📤 Calling hook contract to execute rebalance"
        );

        // 1. 链 ID (网络 IO)
        let chain_id = self.fetch_chain_id().await?;

        // 2. 绑定 chain id 的签名者
        let signer = self.build_signer(chain_id)?;

        // 3. 编码 calldata (纯 CPU)
        let calldata = encode_execute_rebalance(pool_key, tick_shift, REBALANCE_SALT)?;

        let tx = TransactionRequest::new()
            .from(signer.address())
            .to(self.hook_address)
            .data(calldata)
            .gas(REBALANCE_GAS_LIMIT)
            .chain_id(chain_id.as_u64());

        // 4. 签名并广播，不等回执
        let send = async {
            signer
                .send_transaction(tx, None)
                .await
                .map(|pending| pending.tx_hash())
                .map_err(|e| ExecutionError::TransactionSubmissionFailed(e.to_string()))
        };
        let tx_hash = match timeout(self.call_timeout, send).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExecutionError::TransactionSubmissionFailed(format!(
                    "timed out after {:?}",
                    self.call_timeout
                )))
            }
        };

        tracing::info!(tx_hash = ?tx_hash, chain_id = %chain_id, "✅ Transaction sent to hook contract");
        Ok(tx_hash)
    }
}
