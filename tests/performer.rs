//! 端到端场景：宿主视角下的 validate_task / handle_task

use ethers::providers::{MockProvider, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, U256};
use rebalance_performer::config::YieldSourceKind;
use rebalance_performer::gateway::ChainClients;
use rebalance_performer::model::yield_source::{encode_task_data, FixedYield};
use rebalance_performer::{
    AppConfig, ExecutionError, ExecutionOutcome, Performer, RebalanceTaskData, TaskError,
    TaskRequest, TaskWorker,
};
use std::sync::Arc;
use std::time::Duration;

const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn task(id: &[u8]) -> TaskRequest {
    TaskRequest::new(id.to_vec(), Vec::new())
}

fn offline_worker(bps: u64) -> TaskWorker {
    let pool_key = AppConfig::default().pool.pool_key(Address::zero());
    TaskWorker::builder(pool_key)
        .yield_source(Arc::new(FixedYield { bps }))
        .build()
}

#[tokio::test]
async fn result_is_ascii_tick_shift() {
    for (bps, expected) in [(50u64, "50"), (15, "15"), (5000, "1000"), (0, "0")] {
        let response = offline_worker(bps).handle_task(task(b"task")).await.unwrap();
        assert_eq!(response.result.as_ref(), expected.as_bytes(), "yield {bps}");
    }
}

#[tokio::test]
async fn task_id_is_echoed() {
    let id = b"\x00\xffopaque-id".to_vec();
    let response = offline_worker(50)
        .handle_task(TaskRequest::new(id.clone(), Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.task_id.to_vec(), id);
}

#[tokio::test]
async fn empty_task_id_fails_validation_only() {
    let worker = offline_worker(50);
    assert_eq!(worker.validate_task(&task(b"")), Err(TaskError::MissingTaskId));
    assert_eq!(worker.validate_task(&task(b"x")), Ok(()));
}

#[tokio::test]
async fn default_config_never_attempts_execution() {
    let config = AppConfig::default();
    let worker = TaskWorker::from_config(&config, &ChainClients::connect(&config), None);

    let report = worker.run(task(b"no-client")).await.unwrap();
    assert!(matches!(report.outcome, ExecutionOutcome::Skipped(_)));
    assert_eq!(report.response.result.as_ref(), b"50");
}

#[tokio::test]
async fn unreachable_chain_is_absorbed() {
    let (provider, _mock) = Provider::mocked();
    let wallet: LocalWallet = TEST_KEY.trim_start_matches("0x").parse().unwrap();
    let worker = TaskWorker::builder(AppConfig::default().pool.pool_key(Address::zero()))
        .hook_client(
            Arc::new(provider),
            wallet,
            Address::repeat_byte(0x44),
            Duration::from_secs(1),
        )
        .build();

    assert_eq!(worker.pool_key().hooks, Address::repeat_byte(0x44));
    let report = worker.run(task(b"rpc-down")).await.unwrap();
    assert!(matches!(
        report.outcome,
        ExecutionOutcome::Failed(ExecutionError::ChainIdentityUnavailable(_))
    ));
    assert_eq!(report.response.result.as_ref(), b"50");
}

#[tokio::test]
async fn failed_submission_is_absorbed() {
    let (provider, mock): (Provider<MockProvider>, MockProvider) = Provider::mocked();
    mock.push::<U256, _>(U256::from(17000u64)).unwrap();
    let wallet: LocalWallet = TEST_KEY.trim_start_matches("0x").parse().unwrap();
    let worker = TaskWorker::builder(AppConfig::default().pool.pool_key(Address::zero()))
        .hook_client(
            Arc::new(provider),
            wallet,
            Address::repeat_byte(0x44),
            Duration::from_secs(1),
        )
        .build();

    // chain id 可用，之后的 nonce / gas 查询没有 mock 响应，发送失败
    let report = worker.run(task(b"nonce-fails")).await.unwrap();
    assert!(matches!(
        report.outcome,
        ExecutionOutcome::Failed(ExecutionError::TransactionSubmissionFailed(_))
    ));
    assert_eq!(report.response.result.as_ref(), b"50");
}

#[tokio::test]
async fn abi_payload_source_drives_the_shift() {
    let mut config = AppConfig::default();
    config.yield_source.kind = YieldSourceKind::AbiPayload;
    let worker = TaskWorker::from_config(&config, &ChainClients::default(), None);

    let payload = encode_task_data(&RebalanceTaskData {
        pool_id: [0x01; 32],
        yield_bps: 15,
        cumulative_yield: 100,
        position_count: 2,
        timestamp: 1_700_000_000,
    });
    let good = TaskRequest::new(b"decoded".to_vec(), payload);
    assert_eq!(worker.validate_task(&good), Ok(()));
    assert_eq!(worker.handle_task(good).await.unwrap().result.as_ref(), b"15");

    // payload 无法解码时在校验阶段就失败
    let bad = TaskRequest::new(b"bad".to_vec(), vec![0u8; 10]);
    assert!(matches!(
        worker.validate_task(&bad),
        Err(TaskError::MalformedPayload(_))
    ));
}

#[test]
fn shipped_config_parses() {
    let config = AppConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/performer.toml"))
        .unwrap();
    assert_eq!(config.pool.fee, 3000);
    assert_eq!(config.pool.tick_spacing, 60);
    assert_eq!(config.yield_source.fixed_bps, 50);
}
