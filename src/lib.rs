//! namecore - 子域名链上注册与确认跟踪
//!
//! 构建交易参数、提交合约调用，并轮询直到交易执行成功且后续区块足够深

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use error::{ChainError, ChainResult};

pub mod prelude {
    pub use crate::{
        config::Config,
        domain::{
            ChainIdentity, ConfirmationPolicy, ContractAddresses, Operation, OperationKind,
            Receipt, TransactionStatus, TxHandle,
        },
        error::{ChainError, ChainResult},
        service::{
            ChainConnector, ChainRpc, ConfirmationTracker, ConfirmedTransaction,
            ContractInvoker, SubdomainRequest, SubdomainService, TransactorBuilder,
        },
    };
}
