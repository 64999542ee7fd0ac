//! Domain 模块
//!
//! 名称注册与确认跟踪的领域模型

pub mod operation;
pub mod policy;
pub mod receipt;
pub mod transaction_status;

// 重新导出常用类型
pub use operation::{namehash, ContractAddresses, Operation, OperationKind};
pub use policy::{ChainIdentity, ConfirmationPolicy};
pub use receipt::{BlockHeader, ExecutionStatus, Receipt, TxHandle};
pub use transaction_status::TransactionStatus;
