//! 统一错误定义
//! 链上提交与确认流程的错误分类：只有"尚未可用"类错误会在内部重试，其余一律立即上抛

use std::time::Duration;

use ethers::types::{Address, H256, U256};
use thiserror::Error;

use crate::domain::TransactionStatus;

#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC端点不可达或URL非法
    #[error("failed to connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    /// 连接到的网络与期望的 chain id 不一致（致命，不重试）
    #[error("chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("insufficient balance for {account:?}: have {balance} wei, need at least {minimum} wei")]
    InsufficientBalance {
        account: Address,
        balance: U256,
        minimum: U256,
    },

    /// 合约调用失败，原样透传
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// 回执尚未产生（预期内的瞬时状态，由轮询循环吸收）
    #[error("receipt not yet available for {0:?}")]
    ReceiptNotFound(H256),

    /// 交易已上链但执行失败
    #[error("transaction {tx_hash:?} failed on-chain in block {block_number}")]
    ExecutionFailed { tx_hash: H256, block_number: u64 },

    #[error("timed out after {elapsed:?} waiting for {tx_hash:?} (last state: {stage})")]
    Timeout {
        tx_hash: H256,
        elapsed: Duration,
        stage: TransactionStatus,
    },

    /// 其他RPC错误（格式错误、连接断开等），不区分瞬时与永久
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ChainError {
    /// 稳定的错误码，供日志与调用方匹配
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "network",
            Self::ChainMismatch { .. } => "chain_not_supported",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::ContractCall(_) => "contract_call_failed",
            Self::ReceiptNotFound(_) => "receipt_not_found",
            Self::ExecutionFailed { .. } => "transaction_failed",
            Self::Timeout { .. } => "timeout",
            Self::Rpc(_) => "rpc_error",
            Self::InvalidInput(_) => "invalid_parameter",
        }
    }

    /// 是否允许内部重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ReceiptNotFound(_))
    }

    /// 是否发生在提交之前（连接、身份校验、余额检查、参数校验）
    pub fn is_pre_submission(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ChainMismatch { .. }
                | Self::InsufficientBalance { .. }
                | Self::InvalidInput(_)
        )
    }
}

impl From<ethers::providers::ProviderError> for ChainError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        Self::Rpc(err.to_string())
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
