//! 测试辅助模块
//! 提供脚本化的链桩和记录型合约调用器

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use ethers::{
    signers::LocalWallet,
    types::{Address, Filter, Log, H256, U256},
};
use namecore::{
    domain::{
        BlockHeader, ChainIdentity, ConfirmationPolicy, ExecutionStatus, Operation,
        OperationKind, Receipt, TxHandle,
    },
    error::ChainResult,
    service::{ChainConnector, ChainRpc, ContractInvoker, TransactOptions},
};

pub const CHAIN_ID: u64 = 1337;

/// 测试私钥（勿用于真实资产）
pub const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn test_signer() -> LocalWallet {
    TEST_KEY.parse().unwrap()
}

pub fn policy(required: u64, interval_secs: u64, timeout_secs: u64) -> ConfirmationPolicy {
    ConfirmationPolicy::new(
        required,
        Duration::from_secs(interval_secs),
        Duration::from_secs(timeout_secs),
    )
    .unwrap()
}

pub fn tx(byte: u8) -> TxHandle {
    TxHandle::new(H256::repeat_byte(byte))
}

/// 按预设脚本应答的链，记录每类查询的次数
pub struct MockChain {
    receipts: Mutex<VecDeque<Option<Receipt>>>,
    head: Mutex<u64>,
    missing_headers: Mutex<Vec<u64>>,
    pub balance: U256,
    pub receipt_queries: AtomicU32,
    pub head_queries: AtomicU32,
    pub header_queries: AtomicU32,
    pub gas_price_queries: AtomicU32,
    pub nonce_queries: AtomicU32,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            receipts: Mutex::new(VecDeque::new()),
            head: Mutex::new(0),
            missing_headers: Mutex::new(Vec::new()),
            balance: U256::exp10(18),
            receipt_queries: AtomicU32::new(0),
            head_queries: AtomicU32::new(0),
            header_queries: AtomicU32::new(0),
            gas_price_queries: AtomicU32::new(0),
            nonce_queries: AtomicU32::new(0),
        }
    }

    pub fn not_found(self, times: usize) -> Self {
        self.receipts
            .lock()
            .unwrap()
            .extend(std::iter::repeat(None).take(times));
        self
    }

    pub fn mined(self, block_number: u64, status: ExecutionStatus) -> Self {
        self.receipts.lock().unwrap().push_back(Some(Receipt {
            tx_hash: H256::repeat_byte(0x11),
            block_number,
            status,
            gas_used: Some(U256::from(60_000u64)),
        }));
        self
    }

    pub fn head(self, head: u64) -> Self {
        *self.head.lock().unwrap() = head;
        self
    }

    pub fn without_header(self, number: u64) -> Self {
        self.missing_headers.lock().unwrap().push(number);
        self
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = head;
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(CHAIN_ID)
    }

    async fn transaction_receipt(&self, _handle: &TxHandle) -> ChainResult<Option<Receipt>> {
        self.receipt_queries.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.receipts.lock().unwrap();
        // 最后一个脚本应答保持不变
        if queue.len() > 1 {
            Ok(queue.pop_front().flatten())
        } else {
            Ok(queue.front().cloned().flatten())
        }
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.head_queries.fetch_add(1, Ordering::SeqCst);
        Ok(*self.head.lock().unwrap())
    }

    async fn block_header(&self, number: u64) -> ChainResult<Option<BlockHeader>> {
        self.header_queries.fetch_add(1, Ordering::SeqCst);
        if self.missing_headers.lock().unwrap().contains(&number) {
            return Ok(None);
        }
        Ok(Some(BlockHeader {
            number,
            hash: Some(H256::from_low_u64_be(number)),
        }))
    }

    async fn gas_price(&self) -> ChainResult<U256> {
        self.gas_price_queries.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(1_000_000_000u64))
    }

    async fn pending_nonce(&self, _account: Address) -> ChainResult<U256> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(3u64))
    }

    async fn balance(&self, _account: Address) -> ChainResult<U256> {
        Ok(self.balance)
    }

    async fn logs(&self, _filter: &Filter) -> ChainResult<Vec<Log>> {
        Ok(Vec::new())
    }
}

pub async fn connector(chain: Arc<MockChain>) -> ChainConnector {
    ChainConnector::verify(chain, "mock://chain", ChainIdentity::new(CHAIN_ID))
        .await
        .unwrap()
}

/// 记录提交的操作，并按提交顺序分配交易哈希
#[derive(Default)]
pub struct RecordingInvoker {
    pub submitted: Mutex<Vec<(OperationKind, TransactOptions)>>,
}

#[async_trait]
impl ContractInvoker for RecordingInvoker {
    async fn submit(
        &self,
        operation: &Operation,
        options: TransactOptions,
    ) -> ChainResult<TxHandle> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((operation.kind(), options));
        Ok(TxHandle::new(H256::from_low_u64_be(submitted.len() as u64)))
    }
}
