// 链上RPC访问层
// 确认跟踪、交易参数构建、日志查询所需的全部远程调用都经过 ChainRpc；
// 所有调用都是无状态的请求/响应，可被多个跟踪器并发共享

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, BlockId, BlockNumber, Filter, Log, U256, U64},
};

use crate::{
    domain::{BlockHeader, Receipt, TxHandle},
    error::{ChainError, ChainResult},
};

/// 远程链RPC接口
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// eth_chainId
    async fn chain_id(&self) -> ChainResult<u64>;

    /// eth_getTransactionReceipt；尚未打包时返回 None
    async fn transaction_receipt(&self, handle: &TxHandle) -> ChainResult<Option<Receipt>>;

    /// eth_blockNumber
    async fn block_number(&self) -> ChainResult<u64>;

    /// eth_getBlockByNumber；节点尚不可见时返回 None
    async fn block_header(&self, number: u64) -> ChainResult<Option<BlockHeader>>;

    /// eth_gasPrice
    async fn gas_price(&self) -> ChainResult<U256>;

    /// eth_getTransactionCount(account, "pending")
    async fn pending_nonce(&self, account: Address) -> ChainResult<U256>;

    /// eth_getBalance(account, "latest")
    async fn balance(&self, account: Address) -> ChainResult<U256>;

    /// eth_getLogs
    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>>;
}

pub type SharedRpc = Arc<dyn ChainRpc>;

/// 基于 ethers-rs HTTP provider 的实现
#[derive(Debug, Clone)]
pub struct EthersRpc {
    provider: Provider<Http>,
    endpoint: String,
}

impl EthersRpc {
    /// 建立连接并探测端点可达性
    pub async fn connect(endpoint: &str, request_timeout: Duration) -> ChainResult<Self> {
        let connect_err = |message: String| ChainError::Connect {
            endpoint: endpoint.to_string(),
            message,
        };

        let url = reqwest::Url::parse(endpoint).map_err(|e| connect_err(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| connect_err(e.to_string()))?;

        let provider = Provider::new(Http::new_with_client(url, client));

        // 探测：端点不可达时在这里失败，而不是在第一次提交时
        let head = provider
            .get_block_number()
            .await
            .map_err(|e| connect_err(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, head = %head, "Connected to RPC endpoint");

        Ok(Self {
            provider,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn provider(&self) -> &Provider<Http> {
        &self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChainRpc for EthersRpc {
    async fn chain_id(&self) -> ChainResult<u64> {
        let id = self.provider.get_chainid().await?;
        if id > U256::from(u64::MAX) {
            return Err(ChainError::Rpc(format!("chain id out of range: {}", id)));
        }
        Ok(id.as_u64())
    }

    async fn transaction_receipt(&self, handle: &TxHandle) -> ChainResult<Option<Receipt>> {
        let receipt = self.provider.get_transaction_receipt(handle.hash()).await?;
        Ok(receipt.as_ref().and_then(Receipt::from_ethers))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    async fn block_header(&self, number: u64) -> ChainResult<Option<BlockHeader>> {
        let id = BlockId::Number(BlockNumber::Number(U64::from(number)));
        let block = self.provider.get_block(id).await?;

        Ok(block.map(|b| BlockHeader {
            number: b.number.map(|n| n.as_u64()).unwrap_or(number),
            hash: b.hash,
        }))
    }

    async fn gas_price(&self) -> ChainResult<U256> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn pending_nonce(&self, account: Address) -> ChainResult<U256> {
        let pending = BlockId::Number(BlockNumber::Pending);
        Ok(self
            .provider
            .get_transaction_count(account, Some(pending))
            .await?)
    }

    async fn balance(&self, account: Address) -> ChainResult<U256> {
        Ok(self.provider.get_balance(account, None).await?)
    }

    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>> {
        Ok(self.provider.get_logs(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let err = EthersRpc::connect("not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Connect { .. }));
        assert!(err.is_pre_submission());
    }

    #[tokio::test]
    async fn test_connect_unreachable_endpoint() {
        // 端口 9 (discard) 在测试环境中不会有 JSON-RPC 服务
        let err = EthersRpc::connect("http://127.0.0.1:9", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "network");
    }
}
