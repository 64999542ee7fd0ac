//! 名称注册相关的链上操作
//!
//! 每种操作对应固定的 gas 上限（成本形状小且已知，不做估算），
//! 以及一个目标合约（注册表或公共解析器）。

use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, H256},
    utils::{id, keccak256},
};
use serde::{Deserialize, Serialize};

use crate::{error::ChainResult, infrastructure::rpc_validator};

/// 注册表 / 解析器合约地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub registry: Address,
    pub public_resolver: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    RegisterSubdomain,
    SetResolver,
    SetPubkey,
    SetText,
}

impl OperationKind {
    /// 每种操作的固定 gas 上限
    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::RegisterSubdomain => 150_000,
            Self::SetResolver => 80_000,
            Self::SetPubkey => 100_000,
            Self::SetText => 200_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisterSubdomain => "register_subdomain",
            Self::SetResolver => "set_resolver",
            Self::SetPubkey => "set_pubkey",
            Self::SetText => "set_text",
        }
    }
}

/// 一次状态变更调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// 在 `parent` 下创建子域 `label.parent` 并指定所有者
    RegisterSubdomain {
        parent: String,
        label: String,
        owner: Address,
    },
    SetResolver {
        name: String,
        resolver: Address,
    },
    /// 公钥的 x / y 坐标，写入 `resolver`
    SetPubkey {
        name: String,
        resolver: Address,
        x: H256,
        y: H256,
    },
    SetText {
        name: String,
        resolver: Address,
        key: String,
        value: String,
    },
}

impl Operation {
    pub fn register_subdomain(
        parent: impl Into<String>,
        label: impl Into<String>,
        owner: Address,
    ) -> ChainResult<Self> {
        let parent = parent.into();
        let label = label.into();
        rpc_validator::validate_name(&parent)?;
        rpc_validator::validate_label(&label)?;
        Ok(Self::RegisterSubdomain {
            parent,
            label,
            owner,
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::RegisterSubdomain { .. } => OperationKind::RegisterSubdomain,
            Self::SetResolver { .. } => OperationKind::SetResolver,
            Self::SetPubkey { .. } => OperationKind::SetPubkey,
            Self::SetText { .. } => OperationKind::SetText,
        }
    }

    /// 调用的目标合约：注册表操作发往注册表，记录写入发往名称所用的解析器
    pub fn target(&self, contracts: &ContractAddresses) -> Address {
        match self {
            Self::RegisterSubdomain { .. } | Self::SetResolver { .. } => contracts.registry,
            Self::SetPubkey { resolver, .. } | Self::SetText { resolver, .. } => *resolver,
        }
    }

    /// 操作作用的完整名称
    pub fn name(&self) -> String {
        match self {
            Self::RegisterSubdomain { parent, label, .. } => format!("{}.{}", label, parent),
            Self::SetResolver { name, .. }
            | Self::SetPubkey { name, .. }
            | Self::SetText { name, .. } => name.clone(),
        }
    }

    /// ABI 编码后的调用数据（selector + 参数）
    pub fn calldata(&self) -> Bytes {
        let (signature, args) = match self {
            Self::RegisterSubdomain {
                parent,
                label,
                owner,
            } => (
                "setSubnodeOwner(bytes32,bytes32,address)",
                vec![
                    node_token(namehash(parent)),
                    Token::FixedBytes(keccak256(label.as_bytes()).to_vec()),
                    Token::Address(*owner),
                ],
            ),
            Self::SetResolver { name, resolver } => (
                "setResolver(bytes32,address)",
                vec![node_token(namehash(name)), Token::Address(*resolver)],
            ),
            Self::SetPubkey { name, x, y, .. } => (
                "setPubkey(bytes32,bytes32,bytes32)",
                vec![
                    node_token(namehash(name)),
                    Token::FixedBytes(x.as_bytes().to_vec()),
                    Token::FixedBytes(y.as_bytes().to_vec()),
                ],
            ),
            Self::SetText {
                name, key, value, ..
            } => (
                "setText(bytes32,string,string)",
                vec![
                    node_token(namehash(name)),
                    Token::String(key.clone()),
                    Token::String(value.clone()),
                ],
            ),
        };

        let mut data = id(signature).to_vec();
        data.extend_from_slice(&encode(&args));
        Bytes::from(data)
    }
}

fn node_token(node: H256) -> Token {
    Token::FixedBytes(node.as_bytes().to_vec())
}

/// EIP-137 namehash
pub fn namehash(name: &str) -> H256 {
    let mut node = [0u8; 32];
    if name.is_empty() {
        return H256::from(node);
    }
    for label in name.rsplit('.') {
        let label_hash = keccak256(label.as_bytes());
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&node);
        buf[32..].copy_from_slice(&label_hash);
        node = keccak256(buf);
    }
    H256::from(node)
}
