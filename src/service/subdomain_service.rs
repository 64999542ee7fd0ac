//! 子域注册服务
//!
//! 调用方 → 参数构建 → 合约提交 → 确认跟踪 → 结果返回。
//! 每个操作独立构建参数并等待终态后才进行下一个。

use std::sync::Arc;

use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, H256, U256},
};
use serde::Serialize;

use crate::{
    domain::{ConfirmationPolicy, Operation},
    error::{ChainError, ChainResult},
    service::{
        chain_connector::ChainConnector,
        contract_invoker::ContractInvoker,
        transaction_builder::TransactorBuilder,
        transaction_monitor::{ConfirmationTracker, ConfirmedTransaction},
    },
};

/// 子域附带的元数据
///
/// 公钥与文本记录写入 `resolver`，因此设置了记录时必须同时指定解析器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdomainMetadata {
    pub resolver: Option<Address>,
    /// 公钥 (x, y)
    pub pubkey: Option<(H256, H256)>,
    pub text_records: Vec<(String, String)>,
}

/// 子域注册请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainRequest {
    pub parent: String,
    pub label: String,
    pub owner: Address,
    pub metadata: SubdomainMetadata,
}

impl SubdomainMetadata {
    pub fn is_empty(&self) -> bool {
        self.resolver.is_none() && self.pubkey.is_none() && self.text_records.is_empty()
    }

    fn has_records(&self) -> bool {
        self.pubkey.is_some() || !self.text_records.is_empty()
    }
}

impl SubdomainRequest {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.label, self.parent)
    }

    /// 提交前校验：元数据由签名账户写入，注册后它必须是子域所有者
    pub fn check_signer(&self, signer: Address) -> ChainResult<()> {
        if !self.metadata.is_empty() && self.owner != signer {
            return Err(ChainError::InvalidInput(format!(
                "metadata for {} must be written by its owner {:?}, not {:?}",
                self.full_name(),
                self.owner,
                signer
            )));
        }
        Ok(())
    }

    /// 按提交顺序展开为操作序列
    pub fn operations(&self) -> ChainResult<Vec<Operation>> {
        let name = self.full_name();
        let mut ops = vec![Operation::register_subdomain(
            self.parent.clone(),
            self.label.clone(),
            self.owner,
        )?];

        let resolver = match self.metadata.resolver {
            Some(resolver) => resolver,
            None if self.metadata.has_records() => {
                return Err(ChainError::InvalidInput(format!(
                    "resolver records for {} require a resolver",
                    name
                )));
            }
            None => return Ok(ops),
        };

        ops.push(Operation::SetResolver {
            name: name.clone(),
            resolver,
        });
        if let Some((x, y)) = self.metadata.pubkey {
            ops.push(Operation::SetPubkey {
                name: name.clone(),
                resolver,
                x,
                y,
            });
        }
        for (key, value) in &self.metadata.text_records {
            ops.push(Operation::SetText {
                name: name.clone(),
                resolver,
                key: key.clone(),
                value: value.clone(),
            });
        }

        Ok(ops)
    }
}

/// 一次注册的全部确认结果
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub name: String,
    pub transactions: Vec<ConfirmedTransaction>,
}

pub struct SubdomainService {
    connector: ChainConnector,
    builder: TransactorBuilder,
    invoker: Arc<dyn ContractInvoker>,
    tracker: ConfirmationTracker,
}

impl SubdomainService {
    pub fn new(
        connector: ChainConnector,
        invoker: Arc<dyn ContractInvoker>,
        min_balance: U256,
        policy: ConfirmationPolicy,
    ) -> Self {
        let builder = TransactorBuilder::new(connector.clone(), min_balance);
        let tracker = ConfirmationTracker::new(connector.rpc(), policy);
        Self {
            connector,
            builder,
            invoker,
            tracker,
        }
    }

    pub fn connector(&self) -> &ChainConnector {
        &self.connector
    }

    /// 单个操作：构建参数 → 提交 → 等待确认
    pub async fn execute(
        &self,
        signer: &LocalWallet,
        operation: &Operation,
        value: U256,
    ) -> ChainResult<ConfirmedTransaction> {
        let kind = operation.kind();
        let options = self.builder.build(signer, kind, value).await?;

        let handle = self.invoker.submit(operation, options).await.map_err(|e| {
            tracing::error!(
                operation = kind.as_str(),
                name = %operation.name(),
                error = %e,
                "Contract call submission failed"
            );
            e
        })?;

        self.tracker.wait_for_confirmation(handle).await
    }

    /// 注册子域并写入元数据；任一步失败即停止
    pub async fn register_subdomain(
        &self,
        signer: &LocalWallet,
        request: &SubdomainRequest,
    ) -> ChainResult<RegistrationOutcome> {
        let name = request.full_name();
        request.check_signer(signer.address())?;
        let operations = request.operations()?;

        tracing::info!(
            name = %name,
            owner = ?request.owner,
            signer = ?signer.address(),
            steps = operations.len(),
            "Registering subdomain"
        );

        let mut transactions = Vec::with_capacity(operations.len());
        for (step, operation) in operations.iter().enumerate() {
            let confirmed = self.execute(signer, operation, U256::zero()).await?;
            tracing::info!(
                name = %name,
                step = step + 1,
                operation = operation.kind().as_str(),
                tx_hash = %confirmed.handle,
                "Registration step confirmed"
            );
            transactions.push(confirmed);
        }

        Ok(RegistrationOutcome { name, transactions })
    }
}
