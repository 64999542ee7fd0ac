//! 单元测试用的脚本化链桩
//!
//! 每个RPC方法按预设队列依次应答，队列耗尽后给出默认应答；
//! 同时记录每个方法的调用次数，便于断言轮询次数。

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use ethers::types::{Address, Filter, Log, H256, U256};

use crate::{
    domain::{BlockHeader, ExecutionStatus, Receipt, TxHandle},
    error::ChainResult,
    service::chain_rpc::ChainRpc,
};

#[derive(Debug, Default)]
pub(crate) struct CallCounts {
    pub receipt: AtomicU32,
    pub head: AtomicU32,
    pub header: AtomicU32,
    pub balance: AtomicU32,
    pub nonce: AtomicU32,
    pub gas_price: AtomicU32,
    pub logs: AtomicU32,
}

impl CallCounts {
    pub fn get(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

pub(crate) struct ScriptedChain {
    pub chain_id: u64,
    pub balance: U256,
    pub nonce: U256,
    pub gas_price: U256,
    receipts: Mutex<VecDeque<ChainResult<Option<Receipt>>>>,
    heads: Mutex<VecDeque<ChainResult<u64>>>,
    last_head: Mutex<u64>,
    headers: Mutex<VecDeque<ChainResult<bool>>>,
    logs: Mutex<Vec<Log>>,
    latency: Duration,
    pub calls: CallCounts,
}

impl ScriptedChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            balance: U256::exp10(18),
            nonce: U256::from(7u64),
            gas_price: U256::from(2_000_000_000u64),
            receipts: Mutex::new(VecDeque::new()),
            heads: Mutex::new(VecDeque::new()),
            last_head: Mutex::new(0),
            headers: Mutex::new(VecDeque::new()),
            logs: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            calls: CallCounts::default(),
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 连续 `n` 次返回"回执不存在"
    pub fn receipt_missing(self, n: usize) -> Self {
        {
            let mut q = self.receipts.lock().unwrap();
            for _ in 0..n {
                q.push_back(Ok(None));
            }
        }
        self
    }

    pub fn receipt(self, block_number: u64, status: ExecutionStatus) -> Self {
        self.receipts.lock().unwrap().push_back(Ok(Some(Receipt {
            tx_hash: H256::repeat_byte(0x42),
            block_number,
            status,
            gas_used: Some(U256::from(21_000u64)),
        })));
        self
    }

    pub fn receipt_error(self, err: crate::error::ChainError) -> Self {
        self.receipts.lock().unwrap().push_back(Err(err));
        self
    }

    /// 依次返回的链头高度，耗尽后重复最后一个
    pub fn heads(self, heads: &[u64]) -> Self {
        {
            let mut q = self.heads.lock().unwrap();
            q.extend(heads.iter().copied().map(Ok));
        }
        self
    }

    pub fn head_error(self, err: crate::error::ChainError) -> Self {
        self.heads.lock().unwrap().push_back(Err(err));
        self
    }

    /// 依次返回的区块头可见性，耗尽后一律可见
    pub fn headers(self, visible: &[bool]) -> Self {
        {
            let mut q = self.headers.lock().unwrap();
            q.extend(visible.iter().copied().map(Ok));
        }
        self
    }

    /// 回执与链头查询的应答延迟
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn respond_delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub fn with_logs(self, logs: Vec<Log>) -> Self {
        *self.logs.lock().unwrap() = logs;
        self
    }
}

#[async_trait]
impl ChainRpc for ScriptedChain {
    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(self.chain_id)
    }

    async fn transaction_receipt(&self, _handle: &TxHandle) -> ChainResult<Option<Receipt>> {
        self.calls.receipt.fetch_add(1, Ordering::SeqCst);
        self.respond_delay().await;
        self.receipts.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.calls.head.fetch_add(1, Ordering::SeqCst);
        self.respond_delay().await;
        let next = self.heads.lock().unwrap().pop_front();
        let mut last = self.last_head.lock().unwrap();
        match next {
            Some(Ok(head)) => {
                *last = head;
                Ok(head)
            }
            Some(Err(e)) => Err(e),
            None => Ok(*last),
        }
    }

    async fn block_header(&self, number: u64) -> ChainResult<Option<BlockHeader>> {
        self.calls.header.fetch_add(1, Ordering::SeqCst);
        let visible = self.headers.lock().unwrap().pop_front().unwrap_or(Ok(true))?;
        Ok(visible.then(|| BlockHeader {
            number,
            hash: Some(H256::from_low_u64_be(number)),
        }))
    }

    async fn gas_price(&self) -> ChainResult<U256> {
        self.calls.gas_price.fetch_add(1, Ordering::SeqCst);
        Ok(self.gas_price)
    }

    async fn pending_nonce(&self, _account: Address) -> ChainResult<U256> {
        self.calls.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(self.nonce)
    }

    async fn balance(&self, _account: Address) -> ChainResult<U256> {
        self.calls.balance.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>> {
        self.calls.logs.fetch_add(1, Ordering::SeqCst);
        let from = filter.get_from_block().map(|b| b.as_u64()).unwrap_or(0);
        let to = filter.get_to_block().map(|b| b.as_u64()).unwrap_or(u64::MAX);

        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                log.block_number
                    .map(|n| n.as_u64() >= from && n.as_u64() <= to)
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}
