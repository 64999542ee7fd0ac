//! 合约调用提交
//!
//! 确认跟踪只依赖 `ContractInvoker` 这一个接口：提交操作、拿回交易句柄。

use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};

use crate::{
    domain::{ContractAddresses, Operation, TxHandle},
    error::{ChainError, ChainResult},
    service::transaction_builder::TransactOptions,
};

/// 合约调用提交接口
#[async_trait]
pub trait ContractInvoker: Send + Sync {
    /// 编码并提交操作；`options` 被消耗，不会跨提交复用
    async fn submit(&self, operation: &Operation, options: TransactOptions)
        -> ChainResult<TxHandle>;
}

/// 通过本地签名钱包向注册表 / 解析器合约提交调用
pub struct RegistryInvoker {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    contracts: ContractAddresses,
}

impl RegistryInvoker {
    /// `chain_id` 应取自已校验的连接，签名时用于 EIP-155 重放保护
    pub fn new(
        provider: Provider<Http>,
        signer: LocalWallet,
        chain_id: u64,
        contracts: ContractAddresses,
    ) -> Self {
        let client = SignerMiddleware::new(provider, signer.with_chain_id(chain_id));
        Self { client, contracts }
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }
}

#[async_trait]
impl ContractInvoker for RegistryInvoker {
    async fn submit(
        &self,
        operation: &Operation,
        options: TransactOptions,
    ) -> ChainResult<TxHandle> {
        let signer_address = self.client.signer().address();
        if options.from_address() != signer_address {
            return Err(ChainError::ContractCall(format!(
                "options built for {:?} but invoker signs as {:?}",
                options.from_address(),
                signer_address
            )));
        }
        if options.chain_id() != self.client.signer().chain_id() {
            return Err(ChainError::ContractCall(format!(
                "options built for chain {} but invoker signs for chain {}",
                options.chain_id(),
                self.client.signer().chain_id()
            )));
        }

        let kind = operation.kind();
        if options.kind() != kind {
            return Err(ChainError::ContractCall(format!(
                "options built for {} but operation is {}",
                options.kind().as_str(),
                kind.as_str()
            )));
        }

        let target = operation.target(&self.contracts);
        let nonce = options.nonce();
        let request = options.into_request(target, operation.calldata());

        let pending = self
            .client
            .send_transaction(request, None)
            .await
            .map_err(|e| ChainError::ContractCall(e.to_string()))?;

        let handle = TxHandle::new(pending.tx_hash());

        tracing::info!(
            tx_hash = %handle,
            operation = kind.as_str(),
            name = %operation.name(),
            target = ?target,
            nonce = %nonce,
            "Submitted contract call"
        );

        Ok(handle)
    }
}
