//! 确认策略与链身份

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ChainError, ChainResult};

/// 额外确认数上限
pub const MAX_REQUIRED_CONFIRMATIONS: u64 = 1_000_000;

/// 总超时上限（7 天）
pub const MAX_OVERALL_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// 确认策略
///
/// 不变量：`0 < poll_interval < overall_timeout <= MAX_OVERALL_TIMEOUT`，
/// `required_confirmations <= MAX_REQUIRED_CONFIRMATIONS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    required_confirmations: u64,
    poll_interval: Duration,
    overall_timeout: Duration,
}

impl ConfirmationPolicy {
    pub fn new(
        required_confirmations: u64,
        poll_interval: Duration,
        overall_timeout: Duration,
    ) -> ChainResult<Self> {
        if poll_interval.is_zero() {
            return Err(ChainError::InvalidInput(
                "poll interval must be greater than zero".into(),
            ));
        }
        if poll_interval >= overall_timeout {
            return Err(ChainError::InvalidInput(format!(
                "poll interval {:?} must be shorter than overall timeout {:?}",
                poll_interval, overall_timeout
            )));
        }

        if overall_timeout > MAX_OVERALL_TIMEOUT {
            return Err(ChainError::InvalidInput(format!(
                "overall timeout {:?} exceeds maximum {:?}",
                overall_timeout, MAX_OVERALL_TIMEOUT
            )));
        }
        if required_confirmations > MAX_REQUIRED_CONFIRMATIONS {
            return Err(ChainError::InvalidInput(format!(
                "required confirmations {} exceeds maximum {}",
                required_confirmations, MAX_REQUIRED_CONFIRMATIONS
            )));
        }

        Ok(Self {
            required_confirmations,
            poll_interval,
            overall_timeout,
        })
    }

    /// 下一区块之后还需要的额外区块数
    pub fn required_confirmations(&self) -> u64 {
        self.required_confirmations
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn overall_timeout(&self) -> Duration {
        self.overall_timeout
    }
}

/// 期望连接的网络
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIdentity {
    pub expected_chain_id: u64,
}

impl ChainIdentity {
    pub fn new(expected_chain_id: u64) -> Self {
        Self { expected_chain_id }
    }
}
