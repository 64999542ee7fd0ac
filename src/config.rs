//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChainIdentity, ConfirmationPolicy, ContractAddresses},
    infrastructure::rpc_validator,
};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 区块链RPC与合约配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub expected_chain_id: u64,
    pub registry_address: String,
    pub public_resolver_address: String,
    /// 提交前账户需持有的最低余额（wei，十进制字符串）
    pub min_balance_wei: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// 确认跟踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    pub required_confirmations: u64,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: std::env::var("RPC_URL").unwrap_or_else(|_| "http://localhost:8545".into()),
            expected_chain_id: env_parse("EXPECTED_CHAIN_ID", 5),
            registry_address: std::env::var("ENS_REGISTRY_ADDRESS")
                .unwrap_or_else(|_| "0x0000000000000000000000000000000000000000".into()),
            public_resolver_address: std::env::var("PUBLIC_RESOLVER_ADDRESS")
                .unwrap_or_else(|_| "0x0000000000000000000000000000000000000000".into()),
            // 0.01 ETH
            min_balance_wei: std::env::var("MIN_BALANCE_WEI")
                .unwrap_or_else(|_| "10000000000000000".into()),
            request_timeout_secs: env_parse("RPC_TIMEOUT_SECS", default_request_timeout_secs()),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            required_confirmations: env_parse("CONFIRMATIONS", 1),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", 1000),
            timeout_secs: env_parse("CONFIRMATION_TIMEOUT_SECS", 300),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl ChainConfig {
    pub fn identity(&self) -> ChainIdentity {
        ChainIdentity::new(self.expected_chain_id)
    }

    pub fn contracts(&self) -> Result<ContractAddresses> {
        Ok(ContractAddresses {
            registry: rpc_validator::parse_address(&self.registry_address)
                .context("Invalid ENS_REGISTRY_ADDRESS")?,
            public_resolver: rpc_validator::parse_address(&self.public_resolver_address)
                .context("Invalid PUBLIC_RESOLVER_ADDRESS")?,
        })
    }

    pub fn min_balance(&self) -> Result<U256> {
        rpc_validator::parse_wei(&self.min_balance_wei).context("Invalid MIN_BALANCE_WEI")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ConfirmationConfig {
    pub fn policy(&self) -> Result<ConfirmationPolicy> {
        ConfirmationPolicy::new(
            self.required_confirmations,
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(self.timeout_secs),
        )
        .context("Invalid confirmation policy")
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            chain: ChainConfig::default(),
            confirmation: ConfirmationConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            _ => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://")
        {
            anyhow::bail!("RPC_URL must start with http:// or https://");
        }

        self.chain.contracts()?;
        self.chain.min_balance()?;
        self.confirmation.policy()?;

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}
