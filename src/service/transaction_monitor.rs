// 交易确认跟踪 - 单笔交易的阻塞式轮询
//
// 状态机：SUBMITTED → PENDING → {FAILED | MINED} → {CONFIRMED | TIMEOUT}
// - 回执不存在：预期内的瞬时状态，睡眠一个轮询间隔后重试
// - 回执失败：立即终止，不做任何确认深度检查
// - 回执成功：等待 head >= 下一区块 + 额外确认数，且下一区块头可取回
// - 其他RPC错误：立即上抛，不重试
// - 每次查询前检查总截止时间；睡眠期间到期的截止时间在下一个决策点生效，
//   进行中的查询在截止时间到达时被放弃

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{sleep, timeout_at, Instant};

use crate::{
    domain::{ConfirmationPolicy, Receipt, TransactionStatus, TxHandle},
    error::{ChainError, ChainResult},
    service::chain_rpc::SharedRpc,
};

/// 确认成功的结果
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedTransaction {
    pub handle: TxHandle,
    pub receipt: Receipt,
    /// 判定确认时观察到的链头高度
    pub head_at_confirmation: u64,
    /// 回执查询次数
    pub receipt_polls: u32,
    /// 链头高度查询次数
    pub depth_checks: u32,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub confirmed_at: DateTime<Utc>,
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

/// 单笔交易的一次跟踪过程
struct TrackingRun {
    handle: TxHandle,
    status: TransactionStatus,
    started: Instant,
    deadline: Instant,
    receipt_polls: u32,
    depth_checks: u32,
}

impl TrackingRun {
    fn advance(&mut self, next: TransactionStatus) {
        debug_assert!(
            self.status.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.status,
            next
        );
        if self.status != next {
            tracing::debug!(
                tx_hash = %self.handle,
                from = %self.status,
                to = %next,
                "Confirmation state changed"
            );
        }
        self.status = next;
    }

    /// 决策点：截止时间已到则转入 TIMEOUT
    fn check_deadline(&mut self) -> ChainResult<()> {
        if Instant::now() < self.deadline {
            return Ok(());
        }
        Err(self.expire())
    }

    /// 单次查询不得越过截止时间
    async fn within_deadline<T, F>(&mut self, query: F) -> ChainResult<T>
    where
        F: Future<Output = ChainResult<T>>,
    {
        match timeout_at(self.deadline, query).await {
            Ok(result) => result,
            Err(_) => Err(self.expire()),
        }
    }

    fn expire(&mut self) -> ChainError {
        let stage = self.status;
        self.advance(TransactionStatus::Timeout);
        let elapsed = self.started.elapsed();

        tracing::warn!(
            tx_hash = %self.handle,
            stage = %stage,
            receipt_polls = self.receipt_polls,
            depth_checks = self.depth_checks,
            elapsed_ms = elapsed.as_millis() as u64,
            "Transaction confirmation timed out"
        );

        ChainError::Timeout {
            tx_hash: self.handle.hash(),
            elapsed,
            stage,
        }
    }
}

/// 交易确认跟踪器
///
/// 多个跟踪器可以并发共享同一个只读 RPC 连接；单个跟踪器内部顺序执行。
#[derive(Clone)]
pub struct ConfirmationTracker {
    rpc: SharedRpc,
    policy: ConfirmationPolicy,
}

impl ConfirmationTracker {
    pub fn new(rpc: SharedRpc, policy: ConfirmationPolicy) -> Self {
        Self { rpc, policy }
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// 跟踪交易直到终态
    ///
    /// 返回 `Ok` 即 CONFIRMED；`ExecutionFailed` / `Timeout` 为另外两个终态，
    /// 其余错误为致命RPC错误。
    pub async fn wait_for_confirmation(&self, handle: TxHandle) -> ChainResult<ConfirmedTransaction> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.policy.overall_timeout())
            .ok_or_else(|| {
                ChainError::InvalidInput(format!(
                    "overall timeout {:?} is out of range",
                    self.policy.overall_timeout()
                ))
            })?;
        let mut run = TrackingRun {
            handle,
            status: TransactionStatus::Submitted,
            started,
            deadline,
            receipt_polls: 0,
            depth_checks: 0,
        };

        tracing::info!(
            tx_hash = %handle,
            required_confirmations = self.policy.required_confirmations(),
            poll_interval_ms = self.policy.poll_interval().as_millis() as u64,
            timeout_secs = self.policy.overall_timeout().as_secs(),
            "Tracking transaction confirmation"
        );

        let receipt = self.wait_for_receipt(&mut run).await?;

        if !receipt.is_success() {
            run.advance(TransactionStatus::Failed);
            tracing::warn!(
                tx_hash = %handle,
                block_number = receipt.block_number,
                receipt_polls = run.receipt_polls,
                "Transaction failed on-chain"
            );
            return Err(ChainError::ExecutionFailed {
                tx_hash: handle.hash(),
                block_number: receipt.block_number,
            });
        }

        run.advance(TransactionStatus::Mined);
        tracing::info!(
            tx_hash = %handle,
            block_number = receipt.block_number,
            receipt_polls = run.receipt_polls,
            "Transaction mined, waiting for confirmation depth"
        );

        let head = self.wait_for_depth(&mut run, &receipt).await?;
        run.advance(TransactionStatus::Confirmed);

        let elapsed = started.elapsed();
        tracing::info!(
            tx_hash = %handle,
            block_number = receipt.block_number,
            head = head,
            receipt_polls = run.receipt_polls,
            depth_checks = run.depth_checks,
            elapsed_ms = elapsed.as_millis() as u64,
            "Transaction confirmed"
        );

        Ok(ConfirmedTransaction {
            handle,
            receipt,
            head_at_confirmation: head,
            receipt_polls: run.receipt_polls,
            depth_checks: run.depth_checks,
            elapsed,
            confirmed_at: Utc::now(),
        })
    }

    /// 查询一次回执；不存在时以 `ReceiptNotFound` 表示
    async fn poll_receipt(&self, handle: &TxHandle) -> ChainResult<Receipt> {
        self.rpc
            .transaction_receipt(handle)
            .await?
            .ok_or(ChainError::ReceiptNotFound(handle.hash()))
    }

    /// 阶段一：等待回执出现
    async fn wait_for_receipt(&self, run: &mut TrackingRun) -> ChainResult<Receipt> {
        loop {
            run.check_deadline()?;
            run.advance(TransactionStatus::Pending);

            run.receipt_polls += 1;
            let handle = run.handle;
            match run.within_deadline(self.poll_receipt(&handle)).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() => {
                    tracing::debug!(
                        tx_hash = %run.handle,
                        attempt = run.receipt_polls,
                        "Receipt not yet available"
                    );
                }
                Err(e) => {
                    tracing::error!(tx_hash = %run.handle, error = %e, "Receipt query failed");
                    return Err(e);
                }
            }

            sleep(self.policy.poll_interval()).await;
        }
    }

    /// 阶段二：等待确认深度，且下一区块头可以独立取回
    async fn wait_for_depth(&self, run: &mut TrackingRun, receipt: &Receipt) -> ChainResult<u64> {
        let required = self.policy.required_confirmations();
        let (next_block, target) = receipt
            .block_number
            .checked_add(1)
            .and_then(|next| Some((next, next.checked_add(required)?)))
            .ok_or_else(|| {
                ChainError::InvalidInput(format!(
                    "confirmation target out of range: block {} + 1 + {}",
                    receipt.block_number, required
                ))
            })?;

        loop {
            run.check_deadline()?;
            run.advance(TransactionStatus::Mined);

            run.depth_checks += 1;
            let head = run.within_deadline(self.rpc.block_number()).await?;

            if head < target {
                tracing::debug!(
                    tx_hash = %run.handle,
                    head = head,
                    target = target,
                    "Confirmation depth not reached"
                );
            } else {
                match run.within_deadline(self.rpc.block_header(next_block)).await? {
                    Some(_) => return Ok(head),
                    // 链头高度领先于实际可查询的区块，视为尚未确认
                    None => {
                        tracing::debug!(
                            tx_hash = %run.handle,
                            head = head,
                            next_block = next_block,
                            "Next block header not yet retrievable"
                        );
                    }
                }
            }

            sleep(self.policy.poll_interval()).await;
        }
    }
}
