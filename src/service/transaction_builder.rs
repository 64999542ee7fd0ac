//! 交易参数构建器
//!
//! 每次提交前重新构建 `TransactOptions`：
//! 1. 余额预检（低于配置的最低余额直接拒绝，与实际成本无关）
//! 2. nonce 取账户的 pending 计数，避免同一账户连续提交时冲突
//! 3. gas 价格每次实时查询，不做缓存
//! 4. gas 上限按操作类型取固定值

use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionRequest, U256},
};
use serde::Serialize;

use crate::{
    domain::OperationKind,
    error::{ChainError, ChainResult},
    service::chain_connector::ChainConnector,
};

/// 单次提交的交易参数，构建后不可变
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TransactOptions {
    from: Address,
    nonce: U256,
    gas_price: U256,
    gas_limit: U256,
    value: U256,
    chain_id: u64,
    kind: OperationKind,
}

impl TransactOptions {
    pub fn from_address(&self) -> Address {
        self.from
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    /// 成本上限（gas limit）
    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// 转换为 legacy 交易请求（消耗自身，参数不会被复用）
    pub fn into_request(self, to: Address, data: Bytes) -> TransactionRequest {
        TransactionRequest::new()
            .from(self.from)
            .to(to)
            .nonce(self.nonce)
            .gas_price(self.gas_price)
            .gas(self.gas_limit)
            .value(self.value)
            .data(data)
            .chain_id(self.chain_id)
    }
}

/// 交易参数构建器
#[derive(Debug, Clone)]
pub struct TransactorBuilder {
    connector: ChainConnector,
    min_balance: U256,
}

impl TransactorBuilder {
    pub fn new(connector: ChainConnector, min_balance: U256) -> Self {
        Self {
            connector,
            min_balance,
        }
    }

    pub fn min_balance(&self) -> U256 {
        self.min_balance
    }

    /// 构建交易参数
    ///
    /// # 流程
    /// 1. 校验签名账户余额 >= 最低余额
    /// 2. 查询 pending nonce
    /// 3. 查询当前 gas 价格
    /// 4. 按操作类型填充 gas 上限
    pub async fn build(
        &self,
        signer: &LocalWallet,
        kind: OperationKind,
        value: U256,
    ) -> ChainResult<TransactOptions> {
        let rpc = self.connector.rpc();
        let account = signer.address();

        // 1. 余额预检（失败时不再发起其他查询）
        let balance = rpc.balance(account).await?;
        if balance < self.min_balance {
            tracing::warn!(
                account = ?account,
                balance = %balance,
                minimum = %self.min_balance,
                "Refusing submission: balance below configured minimum"
            );
            return Err(ChainError::InsufficientBalance {
                account,
                balance,
                minimum: self.min_balance,
            });
        }

        // 2. pending nonce：包含尚未确认的提交
        let nonce = rpc.pending_nonce(account).await?;

        // 3. 实时 gas 价格
        let gas_price = rpc.gas_price().await?;

        let options = TransactOptions {
            from: account,
            nonce,
            gas_price,
            gas_limit: U256::from(kind.gas_limit()),
            value,
            chain_id: self.connector.chain_id(),
            kind,
        };

        tracing::debug!(
            account = ?account,
            operation = kind.as_str(),
            nonce = %options.nonce,
            gas_price = %options.gas_price,
            gas_limit = %options.gas_limit,
            "Built transact options"
        );

        Ok(options)
    }
}
