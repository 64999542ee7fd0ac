//! 交易句柄、回执与区块头

use std::{fmt, str::FromStr};

use ethers::types::{H256, U256};
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

/// 已提交交易的句柄（交易哈希），创建后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(H256);

impl TxHandle {
    pub fn new(hash: H256) -> Self {
        Self(hash)
    }

    pub fn hash(&self) -> H256 {
        self.0
    }
}

impl From<H256> for TxHandle {
    fn from(hash: H256) -> Self {
        Self(hash)
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl FromStr for TxHandle {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::infrastructure::rpc_validator::parse_tx_hash(s).map(Self)
    }
}

/// 链上执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl ExecutionStatus {
    /// EIP-658: status = 1 成功，0 失败
    pub fn from_status_code(code: u64) -> Self {
        if code == 1 {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

/// 交易回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: H256,
    pub block_number: u64,
    pub status: ExecutionStatus,
    pub gas_used: Option<U256>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// 从 ethers 回执转换；尚未打包（无区块号）时返回 None
    pub fn from_ethers(receipt: &ethers::types::TransactionReceipt) -> Option<Self> {
        let block_number = receipt.block_number?.as_u64();
        // 拜占庭分叉前的回执没有 status 字段，按成功处理
        let status = receipt
            .status
            .map(|s| ExecutionStatus::from_status_code(s.as_u64()))
            .unwrap_or(ExecutionStatus::Success);

        Some(Self {
            tx_hash: receipt.transaction_hash,
            block_number,
            status,
            gas_used: receipt.gas_used,
        })
    }
}

/// 区块头；能取回即说明该区块在节点上可见
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: Option<H256>,
}
