use thiserror::Error;

/// 任务级错误：会中止响应的交付
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("no task ID provided")]
    MissingTaskId,

    #[error("malformed task payload: {0}")]
    MalformedPayload(String),
}

/// 链上执行错误：只记录日志，永远不会成为任务错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("failed to get chain ID: {0}")]
    ChainIdentityUnavailable(String),

    #[error("failed to create transactor: {0}")]
    SignerConstructionFailed(String),

    #[error("failed to encode executeRebalance call: {0}")]
    CallEncodingFailed(String),

    #[error("failed to send transaction: {0}")]
    TransactionSubmissionFailed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid RPC url {url}: {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("invalid operator key: {0}")]
    InvalidOperatorKey(String),
}
