//! 确认跟踪状态定义
//! 一笔已提交交易从收到句柄到终态的全部状态

use std::fmt;

use serde::{Deserialize, Serialize};

/// 确认跟踪状态机
/// SUBMITTED → PENDING → {FAILED | MINED} → {CONFIRMED | TIMEOUT}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// 刚拿到交易句柄，尚未查询
    Submitted,

    /// 回执尚未出现，等待上链
    Pending,

    /// 已上链且执行成功，等待确认深度
    Mined,

    /// 确认深度已满足且下一区块可取回
    Confirmed,

    /// 链上执行失败
    Failed,

    /// 总截止时间已到
    Timeout,
}

impl TransactionStatus {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Submitted => "交易已提交",
            Self::Pending => "交易待上链",
            Self::Mined => "交易确认中",
            Self::Confirmed => "交易已确认",
            Self::Failed => "交易失败",
            Self::Timeout => "交易超时",
        }
    }

    /// 是否为终态
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::Timeout)
    }

    /// 验证状态转换合法性
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;

        match (self, target) {
            (Submitted, Pending) | (Submitted, Timeout) => true,

            // 回执未出现时停留在 Pending
            (Pending, Pending) | (Pending, Mined) | (Pending, Failed) | (Pending, Timeout) => {
                true
            }

            // 深度不足或下一区块不可取回时停留在 Mined
            (Mined, Mined) | (Mined, Confirmed) | (Mined, Timeout) => true,

            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Pending => "pending",
            Self::Mined => "mined",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
