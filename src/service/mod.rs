pub mod chain_connector;
pub mod chain_rpc;
pub mod contract_invoker;
pub mod event_log; // 有界范围事件日志拉取
pub mod subdomain_service;
pub mod transaction_builder;
pub mod transaction_monitor; // 核心：确认跟踪

#[cfg(test)]
pub(crate) mod mock_chain;

pub use chain_connector::ChainConnector;
pub use chain_rpc::{ChainRpc, EthersRpc, SharedRpc};
pub use contract_invoker::{ContractInvoker, RegistryInvoker};
pub use event_log::LogRange;
pub use subdomain_service::{
    RegistrationOutcome, SubdomainMetadata, SubdomainRequest, SubdomainService,
};
pub use transaction_builder::{TransactOptions, TransactorBuilder};
pub use transaction_monitor::{ConfirmationTracker, ConfirmedTransaction};
