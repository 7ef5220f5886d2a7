use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::{AppConfig, ChainRole};
use crate::error::ConfigError;

/// 启动时建立一次，之后只读共享
#[derive(Debug, Clone, Default)]
pub struct ChainClients {
    pub l1: Option<Arc<Provider<Http>>>,
    pub l2: Option<Arc<Provider<Http>>>,
}

impl ChainClients {
    /// 连接失败只记日志，对应的客户端保持为空 (链上执行会被跳过)
    pub fn connect(config: &AppConfig) -> Self {
        let timeout = config.call_timeout();
        Self {
            l1: dial_logged(ChainRole::L1, config.chains.l1_rpc_url.as_deref(), timeout),
            l2: dial_logged(ChainRole::L2, config.chains.l2_rpc_url.as_deref(), timeout),
        }
    }

    pub fn get(&self, role: ChainRole) -> Option<Arc<Provider<Http>>> {
        match role {
            ChainRole::L1 => self.l1.clone(),
            ChainRole::L2 => self.l2.clone(),
        }
    }
}

fn dial_logged(
    role: ChainRole,
    url: Option<&str>,
    timeout: Duration,
) -> Option<Arc<Provider<Http>>> {
    let url = url?;
    match dial(url, timeout) {
        Ok(provider) => {
            tracing::info!(chain = %role, rpc_url = %url, "✅ [Gateway] RPC client ready");
            Some(Arc::new(provider))
        }
        Err(e) => {
            tracing::error!(chain = %role, error = %e, "❌ [Gateway] Failed to connect to RPC");
            None
        }
    }
}

/// HTTP 传输层也带上同样的超时
pub fn dial(url: &str, timeout: Duration) -> Result<Provider<Http>, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidRpcUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::InvalidRpcUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Provider::new(Http::new_with_client(parsed, client)))
}

/// 读取 operator 私钥 (允许带 0x 前缀)
pub fn load_operator_wallet(config: &AppConfig) -> Option<LocalWallet> {
    let raw = config.operator.private_key.as_deref()?;
    match parse_wallet(raw) {
        Ok(wallet) => Some(wallet),
        Err(e) => {
            tracing::error!(error = %e, "❌ Failed to load private key");
            None
        }
    }
}

pub fn parse_wallet(raw: &str) -> Result<LocalWallet, ConfigError> {
    let hex = raw.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    hex.parse::<LocalWallet>()
        .map_err(|e| ConfigError::InvalidOperatorKey(e.to_string()))
}
