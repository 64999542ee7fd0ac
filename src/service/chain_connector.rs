//! 链连接器
//!
//! `ChainConnector` 只能通过身份校验获得：持有它即说明所连网络的
//! chain id 已与期望值核对过，且每个连接只核对一次。

use std::{sync::Arc, time::Duration};

use crate::{
    domain::ChainIdentity,
    error::{ChainError, ChainResult},
    service::chain_rpc::{ChainRpc, EthersRpc, SharedRpc},
};

/// 已通过身份校验的链连接（只读，可被多个构建器和跟踪器共享）
#[derive(Clone)]
pub struct ChainConnector {
    rpc: SharedRpc,
    chain_id: u64,
    endpoint: String,
}

impl std::fmt::Debug for ChainConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnector")
            .field("chain_id", &self.chain_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ChainConnector {
    /// 连接端点并校验网络身份
    pub async fn connect(
        endpoint: &str,
        identity: ChainIdentity,
        request_timeout: Duration,
    ) -> ChainResult<(Self, Arc<EthersRpc>)> {
        let rpc = Arc::new(EthersRpc::connect(endpoint, request_timeout).await?);
        let connector = Self::verify(rpc.clone(), endpoint, identity).await?;
        Ok((connector, rpc))
    }

    /// 校验已建立连接的网络身份；不一致时拒绝（致命，不重试）
    pub async fn verify(
        rpc: SharedRpc,
        endpoint: impl Into<String>,
        identity: ChainIdentity,
    ) -> ChainResult<Self> {
        let endpoint = endpoint.into();
        let actual = rpc.chain_id().await?;

        if actual != identity.expected_chain_id {
            tracing::error!(
                endpoint = %endpoint,
                expected = identity.expected_chain_id,
                actual = actual,
                "Connected network does not match expected chain id"
            );
            return Err(ChainError::ChainMismatch {
                expected: identity.expected_chain_id,
                actual,
            });
        }

        tracing::info!(endpoint = %endpoint, chain_id = actual, "Chain identity verified");

        Ok(Self {
            rpc,
            chain_id: actual,
            endpoint,
        })
    }

    pub fn rpc(&self) -> SharedRpc {
        self.rpc.clone()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
