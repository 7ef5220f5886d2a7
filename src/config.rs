use ethers::types::{Address, H160};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::PoolKey;
use crate::error::ConfigError;
use crate::model::yield_source::{AbiPayloadDecoder, FixedYield, YieldSource};

pub const DEFAULT_CONFIG_PATH: &str = "config/performer.toml";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

// 0x8C4c13856e935d33c0d3C3EF5623F2339f17d4f5
const DEFAULT_CURRENCY0: Address = H160([
    0x8c, 0x4c, 0x13, 0x85, 0x6e, 0x93, 0x5d, 0x33, 0xc0, 0xd3, 0xc3, 0xef, 0x56, 0x23, 0xf2, 0x33,
    0x9f, 0x17, 0xd4, 0xf5,
]);
// 0xfbBB81A58049F92C340F00006D6B1BCbDfD5ec0d
const DEFAULT_CURRENCY1: Address = H160([
    0xfb, 0xbb, 0x81, 0xa5, 0x80, 0x49, 0xf9, 0x2c, 0x34, 0x0f, 0x00, 0x00, 0x6d, 0x6b, 0x1b, 0xcb,
    0xdf, 0xd5, 0xec, 0x0d,
]);

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub chains: ChainsConfig,
    pub hook: HookConfig,
    pub operator: OperatorConfig,
    pub pool: PoolConfig,
    pub yield_source: YieldSourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChainsConfig {
    pub l1_rpc_url: Option<String>,
    pub l2_rpc_url: Option<String>,
    pub call_timeout_secs: u64,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            l1_rpc_url: None,
            l2_rpc_url: None,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    L1,
    #[default]
    L2,
}

impl fmt::Display for ChainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainRole::L1 => write!(f, "L1"),
            ChainRole::L2 => write!(f, "L2"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HookConfig {
    pub address: Option<Address>,
    pub execution_chain: ChainRole,
}

#[derive(Deserialize, Clone, Default)]
#[serde(default)]
pub struct OperatorConfig {
    pub private_key: Option<String>,
}

// 私钥不能出现在日志里
impl fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PoolConfig {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            currency0: DEFAULT_CURRENCY0,
            currency1: DEFAULT_CURRENCY1,
            fee: 3000,
            tick_spacing: 60,
        }
    }
}

impl PoolConfig {
    pub fn pool_key(&self, hooks: Address) -> PoolKey {
        PoolKey {
            currency0: self.currency0,
            currency1: self.currency1,
            fee: self.fee,
            tick_spacing: self.tick_spacing,
            hooks,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum YieldSourceKind {
    #[default]
    Fixed,
    AbiPayload,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct YieldSourceConfig {
    pub kind: YieldSourceKind,
    pub fixed_bps: u64,
}

impl Default for YieldSourceConfig {
    fn default() -> Self {
        Self {
            kind: YieldSourceKind::Fixed,
            fixed_bps: FixedYield::DEFAULT_BPS,
        }
    }
}

impl YieldSourceConfig {
    pub fn build(&self) -> Arc<dyn YieldSource> {
        match self.kind {
            YieldSourceKind::Fixed => Arc::new(FixedYield { bps: self.fixed_bps }),
            YieldSourceKind::AbiPayload => Arc::new(AbiPayloadDecoder),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 配置文件不存在时退回默认值 (全部靠环境变量)
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// 环境变量优先于配置文件，空字符串视为未设置
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("L1_RPC_URL") {
            self.chains.l1_rpc_url = Some(url);
        }
        if let Some(url) = lookup("L2_RPC_URL") {
            self.chains.l2_rpc_url = Some(url);
        }
        if let Some(raw) = lookup("HOOK_ADDRESS") {
            // 地址无法解析时只记录错误，hook 视为未配置 (不上链)
            match raw.trim().parse::<Address>() {
                Ok(address) => self.hook.address = Some(address),
                Err(_) => {
                    let e = ConfigError::InvalidAddress {
                        field: "HOOK_ADDRESS",
                        value: raw.clone(),
                    };
                    tracing::error!(error = %e, "❌ [Config] Ignoring hook address, execution disabled");
                    self.hook.address = None;
                }
            }
        }
        if let Some(key) = lookup("OPERATOR_PRIVATE_KEY") {
            self.operator.private_key = Some(key);
        }
        self
    }

    /// 零地址等同于未配置
    pub fn hook_address(&self) -> Option<Address> {
        self.hook.address.filter(|address| !address.is_zero())
    }

    /// 0 秒的超时会让每个 RPC 调用立即失败，按默认值处理
    pub fn call_timeout(&self) -> Duration {
        match self.chains.call_timeout_secs {
            0 => {
                tracing::warn!(
                    default_secs = DEFAULT_CALL_TIMEOUT_SECS,
                    "⚠️ [Config] call_timeout_secs = 0, using default"
                );
                Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS)
            }
            secs => Duration::from_secs(secs),
        }
    }

    pub fn execution_rpc_url(&self) -> Option<&str> {
        match self.hook.execution_chain {
            ChainRole::L1 => self.chains.l1_rpc_url.as_deref(),
            ChainRole::L2 => self.chains.l2_rpc_url.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_pool() {
        let config = AppConfig::default();
        let expected0: Address = "0x8C4c13856e935d33c0d3C3EF5623F2339f17d4f5".parse().unwrap();
        let expected1: Address = "0xfbBB81A58049F92C340F00006D6B1BCbDfD5ec0d".parse().unwrap();

        assert_eq!(config.pool.currency0, expected0);
        assert_eq!(config.pool.currency1, expected1);
        assert_eq!(config.pool.fee, 3000);
        assert_eq!(config.pool.tick_spacing, 60);
        assert_eq!(config.yield_source.kind, YieldSourceKind::Fixed);
        assert_eq!(config.yield_source.fixed_bps, 50);
        assert_eq!(config.hook.execution_chain, ChainRole::L2);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert!(config.hook_address().is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [chains]
            l2_rpc_url = "http://localhost:8545"
            call_timeout_secs = 5

            [hook]
            address = "0x00000000000000000000000000000000000000aa"
            execution_chain = "l1"

            [pool]
            fee = 500
            tick_spacing = 10

            [yield_source]
            kind = "abi_payload"
            "#,
        )
        .unwrap();

        assert_eq!(config.chains.l2_rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert_eq!(config.hook.execution_chain, ChainRole::L1);
        assert_eq!(config.execution_rpc_url(), None);
        assert_eq!(config.pool.fee, 500);
        assert_eq!(config.pool.currency0, DEFAULT_CURRENCY0);
        assert_eq!(config.yield_source.kind, YieldSourceKind::AbiPayload);
        assert_eq!(config.hook_address(), Some(Address::from_low_u64_be(0xaa)));
    }

    #[test]
    fn zero_hook_address_counts_as_absent() {
        let config = AppConfig::from_toml_str(
            r#"
            [hook]
            address = "0x0000000000000000000000000000000000000000"
            "#,
        )
        .unwrap();
        assert!(config.hook.address.is_some());
        assert!(config.hook_address().is_none());
    }

    #[test]
    fn env_overrides_win_and_blanks_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("L2_RPC_URL", "http://rpc.example:8545"),
            ("L1_RPC_URL", "  "),
            ("HOOK_ADDRESS", "0x00000000000000000000000000000000000000bb"),
            ("OPERATOR_PRIVATE_KEY", "0xabc"),
        ]);
        let config = AppConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.chains.l1_rpc_url, None);
        assert_eq!(config.execution_rpc_url(), Some("http://rpc.example:8545"));
        assert_eq!(config.hook_address(), Some(Address::from_low_u64_be(0xbb)));
        assert_eq!(config.operator.private_key.as_deref(), Some("0xabc"));
        assert!(!format!("{:?}", config.operator).contains("abc"));
    }

    #[test]
    fn malformed_hook_address_disables_execution() {
        let mut config = AppConfig::default();
        config.hook.address = Some(Address::repeat_byte(0x11));

        let config = config
            .with_overrides(|key| (key == "HOOK_ADDRESS").then(|| "0x1234".to_string()));
        assert!(config.hook.address.is_none());
        assert!(config.hook_address().is_none());
    }

    #[test]
    fn zero_call_timeout_falls_back_to_default() {
        let config = AppConfig::from_toml_str("[chains]\ncall_timeout_secs = 0\n").unwrap();
        assert_eq!(config.chains.call_timeout_secs, 0);
        assert_eq!(config.call_timeout(), Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS));

        let config = AppConfig::from_toml_str("[chains]\ncall_timeout_secs = 7\n").unwrap();
        assert_eq!(config.call_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn load_reads_file_and_missing_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[yield_source]\nfixed_bps = 15").unwrap();
        let config = AppConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.yield_source.fixed_bps, 15);

        let fallback = AppConfig::load_or_default("/nonexistent/performer.toml").unwrap();
        assert_eq!(fallback.yield_source.fixed_bps, 50);
        assert!(matches!(
            AppConfig::load("/nonexistent/performer.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
