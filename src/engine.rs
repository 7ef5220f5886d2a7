use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::signers::LocalWallet;
use ethers::types::{Address, TxHash};
use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{PoolKey, TaskRequest, TaskResponse, TickShift};
use crate::error::{ExecutionError, TaskError};
use crate::execution::{HookExecutor, RebalanceExecutor};
use crate::gateway::ChainClients;
use crate::math::tick_shift::compute_tick_shift;
use crate::model::validator;
use crate::model::yield_source::{FixedYield, YieldSource};

/// 宿主 (RPC server / 本地 driver) 驱动的能力接口
#[async_trait]
pub trait Performer: Send + Sync {
    fn validate_task(&self, task: &TaskRequest) -> Result<(), TaskError>;

    async fn handle_task(&self, task: TaskRequest) -> Result<TaskResponse, TaskError>;
}

/// 单个任务的生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Received,
    Validated,
    Computed,
    Executed,
    Skipped,
    Responded,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::Received => "received",
            TaskPhase::Validated => "validated",
            TaskPhase::Computed => "computed",
            TaskPhase::Executed => "executed",
            TaskPhase::Skipped => "skipped",
            TaskPhase::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// 缺失的链上执行前置条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    ExecutionClient,
    HookAddress,
    SignerKey,
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Prerequisite::ExecutionClient => "execution client",
            Prerequisite::HookAddress => "hook address",
            Prerequisite::SignerKey => "private key",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Executed(TxHash),
    Skipped(Vec<Prerequisite>),
    Failed(ExecutionError),
}

impl ExecutionOutcome {
    // 发送失败也算作未执行
    fn phase(&self) -> TaskPhase {
        match self {
            ExecutionOutcome::Executed(_) => TaskPhase::Executed,
            ExecutionOutcome::Skipped(_) | ExecutionOutcome::Failed(_) => TaskPhase::Skipped,
        }
    }
}

/// handle_task 的完整结果 (响应 + 链上执行情况)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub response: TaskResponse,
    pub tick_shift: TickShift,
    pub outcome: ExecutionOutcome,
}

enum ExecutorSlot {
    Ready(Arc<dyn RebalanceExecutor>),
    Missing(Vec<Prerequisite>),
}

pub struct TaskWorker {
    yield_source: Arc<dyn YieldSource>,
    pool_key: PoolKey,
    executor: ExecutorSlot,
}

impl TaskWorker {
    /// 三个前置条件 (执行链客户端 / 非零 hook 地址 / 私钥) 必须同时具备才会上链
    pub fn from_config(
        config: &AppConfig,
        clients: &ChainClients,
        wallet: Option<LocalWallet>,
    ) -> Self {
        let client = clients.get(config.hook.execution_chain);
        let hook = config.hook_address();
        let builder = TaskWorkerBuilder::new(config.pool.pool_key(hook.unwrap_or_default()))
            .yield_source(config.yield_source.build());

        let builder = match (client, hook, wallet) {
            (Some(client), Some(hook), Some(wallet)) => {
                let executor = HookExecutor::new(client, wallet, hook, config.call_timeout());
                tracing::info!(
                    chain = %config.hook.execution_chain,
                    rpc_url = config.execution_rpc_url().unwrap_or_default(),
                    hook_address = ?executor.hook_address(),
                    operator = ?executor.operator(),
                    "🔫 [Execution] Hook execution enabled"
                );
                builder.executor(Arc::new(executor))
            }
            (client, hook, wallet) => {
                let mut missing = Vec::new();
                if client.is_none() {
                    tracing::debug!(
                        chain = %config.hook.execution_chain,
                        rpc_url = ?config.execution_rpc_url(),
                        "No client for execution chain"
                    );
                    missing.push(Prerequisite::ExecutionClient);
                }
                if hook.is_none() {
                    missing.push(Prerequisite::HookAddress);
                }
                if wallet.is_none() {
                    missing.push(Prerequisite::SignerKey);
                }
                builder.missing(missing)
            }
        };
        builder.build()
    }

    pub fn builder(pool_key: PoolKey) -> TaskWorkerBuilder {
        TaskWorkerBuilder::new(pool_key)
    }

    pub fn pool_key(&self) -> &PoolKey {
        &self.pool_key
    }

    pub fn can_execute(&self) -> bool {
        matches!(self.executor, ExecutorSlot::Ready(_))
    }

    /// validate -> compute -> (execute | skip) -> respond
    pub async fn run(&self, task: TaskRequest) -> Result<TaskReport, TaskError> {
        trace_phase(&task, TaskPhase::Received);
        self.validate_task(&task)?;
        trace_phase(&task, TaskPhase::Validated);

        tracing::info!(task_id = %task.task_id, "🔄 Processing LST rebalance task");

        let yield_bps = self.yield_source.yield_bps(&task)?;
        tracing::info!(yield_bps, source = self.yield_source.name(), "📊 Task parameters");

        let tick_shift = compute_tick_shift(yield_bps);
        tracing::info!(tick_shift = tick_shift.get(), yield_bps, "✅ Calculated tick shift");
        trace_phase(&task, TaskPhase::Computed);

        let outcome = self.execute(tick_shift).await;
        trace_phase(&task, outcome.phase());

        let response = TaskResponse {
            task_id: task.task_id.clone(),
            result: tick_shift.to_result_bytes(),
        };
        trace_phase(&task, TaskPhase::Responded);

        Ok(TaskReport {
            response,
            tick_shift,
            outcome,
        })
    }

    // 链上执行失败只记录，永远不影响任务结果
    async fn execute(&self, tick_shift: TickShift) -> ExecutionOutcome {
        match &self.executor {
            ExecutorSlot::Ready(executor) => {
                match executor.execute_rebalance(tick_shift, &self.pool_key).await {
                    Ok(tx_hash) => {
                        tracing::info!(
                            tx_hash = ?tx_hash,
                            "✅ Rebalance executed successfully on hook!"
                        );
                        ExecutionOutcome::Executed(tx_hash)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "❌ Failed to execute rebalance on hook");
                        ExecutionOutcome::Failed(e)
                    }
                }
            }
            ExecutorSlot::Missing(missing) => {
                let missing_list = missing
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::warn!(missing = %missing_list, "⚠️ Skipping hook execution");
                ExecutionOutcome::Skipped(missing.clone())
            }
        }
    }
}

#[async_trait]
impl Performer for TaskWorker {
    fn validate_task(&self, task: &TaskRequest) -> Result<(), TaskError> {
        validator::validate_task(task)?;
        self.yield_source.validate(task)
    }

    async fn handle_task(&self, task: TaskRequest) -> Result<TaskResponse, TaskError> {
        self.run(task).await.map(|report| report.response)
    }
}

fn trace_phase(task: &TaskRequest, phase: TaskPhase) {
    tracing::debug!(task_id = %task.task_id, phase = %phase, "task phase");
}

pub struct TaskWorkerBuilder {
    pool_key: PoolKey,
    yield_source: Arc<dyn YieldSource>,
    executor: ExecutorSlot,
}

impl TaskWorkerBuilder {
    pub fn new(pool_key: PoolKey) -> Self {
        Self {
            pool_key,
            yield_source: Arc::new(FixedYield::default()),
            executor: ExecutorSlot::Missing(vec![
                Prerequisite::ExecutionClient,
                Prerequisite::HookAddress,
                Prerequisite::SignerKey,
            ]),
        }
    }

    pub fn yield_source(mut self, source: Arc<dyn YieldSource>) -> Self {
        self.yield_source = source;
        self
    }

    pub fn executor(mut self, executor: Arc<dyn RebalanceExecutor>) -> Self {
        self.executor = ExecutorSlot::Ready(executor);
        self
    }

    /// 直接挂一个链上客户端 (生产用 Provider<Http>，测试可以用 mock)
    pub fn hook_client<M: Middleware + 'static>(
        self,
        client: Arc<M>,
        wallet: LocalWallet,
        hook_address: Address,
        call_timeout: std::time::Duration,
    ) -> Self {
        let mut builder = self;
        builder.pool_key.hooks = hook_address;
        builder.executor(Arc::new(HookExecutor::new(
            client,
            wallet,
            hook_address,
            call_timeout,
        )))
    }

    fn missing(mut self, missing: Vec<Prerequisite>) -> Self {
        self.executor = ExecutorSlot::Missing(missing);
        self
    }

    pub fn build(self) -> TaskWorker {
        TaskWorker {
            yield_source: self.yield_source,
            pool_key: self.pool_key,
            executor: self.executor,
        }
    }
}
