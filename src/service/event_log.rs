//! 有界区块范围内的事件日志拉取
//!
//! `LogRange` 按块分段调用 eth_getLogs，每次 `next_batch` 只查询一段，
//! 范围耗尽或 `close` 之后不再发起任何查询。

use ethers::types::{Address, Filter, Log, Topic, ValueOrArray};

use crate::{
    domain::namehash,
    error::{ChainError, ChainResult},
    service::chain_rpc::SharedRpc,
};

/// 注册表在子节点所有者变更时发出的事件
pub const NEW_OWNER_EVENT: &str = "NewOwner(bytes32,bytes32,address)";

/// 默认每段查询的区块数（多数公共节点限制单次 getLogs 的范围）
pub const DEFAULT_CHUNK_SIZE: u64 = 2_000;

/// 选出注册表中 `parent` 节点下的 NewOwner 事件
pub fn new_owner_filter(registry: Address, parent: &str) -> Filter {
    let node: Topic = ValueOrArray::Value(Some(namehash(parent)));
    Filter::new()
        .address(registry)
        .event(NEW_OWNER_EVENT)
        .topic1(node)
}

/// 拉取式日志迭代器
pub struct LogRange {
    rpc: SharedRpc,
    filter: Filter,
    next_from: u64,
    to_block: u64,
    chunk_size: u64,
    closed: bool,
}

impl LogRange {
    pub fn new(
        rpc: SharedRpc,
        filter: Filter,
        from_block: u64,
        to_block: u64,
        chunk_size: u64,
    ) -> ChainResult<Self> {
        if chunk_size == 0 {
            return Err(ChainError::InvalidInput("chunk size must be positive".into()));
        }
        if from_block > to_block {
            return Err(ChainError::InvalidInput(format!(
                "invalid block range {}..={}",
                from_block, to_block
            )));
        }

        Ok(Self {
            rpc,
            filter,
            next_from: from_block,
            to_block,
            chunk_size,
            closed: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 拉取下一段日志；范围耗尽后返回 `None`
    pub async fn next_batch(&mut self) -> ChainResult<Option<Vec<Log>>> {
        if self.closed {
            return Ok(None);
        }

        let from = self.next_from;
        let to = from
            .saturating_add(self.chunk_size - 1)
            .min(self.to_block);

        let filter = self.filter.clone().from_block(from).to_block(to);
        let logs = self.rpc.logs(&filter).await?;

        tracing::debug!(from = from, to = to, count = logs.len(), "Fetched log batch");

        if to >= self.to_block {
            self.close();
        } else {
            self.next_from = to + 1;
        }

        Ok(Some(logs))
    }

    /// 拉取剩余全部日志
    pub async fn collect_all(mut self) -> ChainResult<Vec<Log>> {
        let mut all = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            all.extend(batch);
        }
        Ok(all)
    }

    /// 提前结束；重复调用无副作用
    pub fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{H256, U64};

    use super::*;
    use crate::service::mock_chain::{CallCounts, ScriptedChain};

    fn log_at(block: u64) -> Log {
        Log {
            block_number: Some(U64::from(block)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_chunks_cover_range_exactly_once() {
        let chain = ScriptedChain::new(5)
            .with_logs(vec![log_at(5), log_at(12), log_at(25), log_at(40)])
            .into_arc();
        let mut range = LogRange::new(chain.clone(), Filter::new(), 10, 30, 10).unwrap();

        let first = range.next_batch().await.unwrap().unwrap();
        assert_eq!(first.len(), 1); // 10..=19
        let second = range.next_batch().await.unwrap().unwrap();
        assert_eq!(second.len(), 1); // 20..=29
        let third = range.next_batch().await.unwrap().unwrap();
        assert!(third.is_empty()); // 30..=30

        assert!(range.next_batch().await.unwrap().is_none());
        assert!(range.is_closed());
        assert_eq!(CallCounts::get(&chain.calls.logs), 3);
    }

    #[tokio::test]
    async fn test_close_stops_queries() {
        let chain = ScriptedChain::new(5).into_arc();
        let mut range = LogRange::new(chain.clone(), Filter::new(), 0, 100, 10).unwrap();

        range.next_batch().await.unwrap();
        range.close();
        range.close();

        assert!(range.next_batch().await.unwrap().is_none());
        assert_eq!(CallCounts::get(&chain.calls.logs), 1);
    }

    #[tokio::test]
    async fn test_collect_all() {
        let chain = ScriptedChain::new(5)
            .with_logs(vec![log_at(1), log_at(2), log_at(3), log_at(9)])
            .into_arc();
        let range = LogRange::new(chain, Filter::new(), 1, 3, 2).unwrap();

        assert_eq!(range.collect_all().await.unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let chain = ScriptedChain::new(5).into_arc();
        assert!(LogRange::new(chain.clone(), Filter::new(), 10, 5, 1).is_err());
        assert!(LogRange::new(chain, Filter::new(), 0, 5, 0).is_err());
    }

    #[test]
    fn test_new_owner_filter_topics() {
        let filter = new_owner_filter(Address::repeat_byte(0x01), "fds");
        let expected: H256 = namehash("fds");
        assert_eq!(
            filter.topics[1],
            Some(ValueOrArray::Value(Some(expected)))
        );
        assert!(filter.topics[0].is_some());
    }
}
