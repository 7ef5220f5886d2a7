use rebalance_performer::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rebalance_performer::gateway::{load_operator_wallet, ChainClients};
use rebalance_performer::infrastructure::task_stream;
use rebalance_performer::logging::init_logging;
use rebalance_performer::TaskWorker;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 配置路径：命令行参数 > PERFORMER_CONFIG > 默认路径
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PERFORMER_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load_or_default(&path)?.with_env();
    init_logging(&config.logging);
    tracing::info!(config_path = %path, "🚀 Starting LST rebalance performer...");

    // 启动时初始化一次，之后所有任务只读共享
    let clients = ChainClients::connect(&config);
    let wallet = load_operator_wallet(&config);
    let worker = TaskWorker::from_config(&config, &clients, wallet);

    let handled = task_stream::serve(
        &worker,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    tracing::info!(handled, "👋 [Main] Input closed, performer shutting down.");
    Ok(())
}
