//! namecore 主入口
//! 在父域名下注册子域并等待每笔交易确认

use std::sync::Arc;

use anyhow::{Context, Result};
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, H256},
};
use namecore::{
    config::Config,
    infrastructure::{logging, rpc_validator},
    service::{
        ChainConnector, RegistryInvoker, SubdomainMetadata, SubdomainRequest, SubdomainService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量与配置
    dotenvy::dotenv().ok();

    let config = Config::from_env_and_file(std::env::var("CONFIG_PATH").ok())?;
    config.validate()?;

    // 2. 初始化日志（guard 需存活到进程结束）
    let _log_guard = logging::init_logging(&config.logging)?;

    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        chain_id = config.chain.expected_chain_id,
        "Starting namecore"
    );

    // 3. 连接并校验网络身份
    let (connector, rpc) = ChainConnector::connect(
        &config.chain.rpc_url,
        config.chain.identity(),
        config.chain.request_timeout(),
    )
    .await?;

    // 4. 签名账户与合约调用器
    let signer: LocalWallet = std::env::var("SIGNER_PRIVATE_KEY")
        .context("SIGNER_PRIVATE_KEY must be set")?
        .trim_start_matches("0x")
        .parse()
        .context("Invalid SIGNER_PRIVATE_KEY")?;

    let contracts = config.chain.contracts()?;
    let invoker = RegistryInvoker::new(
        rpc.provider().clone(),
        signer.clone(),
        connector.chain_id(),
        contracts,
    );

    let service = SubdomainService::new(
        connector,
        Arc::new(invoker),
        config.chain.min_balance()?,
        config.confirmation.policy()?,
    );

    // 5. 注册
    let request = request_from_env(contracts.public_resolver, signer.address())?;
    let outcome = service.register_subdomain(&signer, &request).await.map_err(|e| {
        tracing::error!(code = e.code(), error = %e, "Subdomain registration failed");
        e
    })?;

    tracing::info!(
        name = %outcome.name,
        transactions = outcome.transactions.len(),
        "Subdomain registration complete"
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

/// 从环境变量读取注册请求
///
/// - SUBDOMAIN_PARENT / SUBDOMAIN_LABEL 必填
/// - SUBDOMAIN_OWNER 缺省为签名账户；写入元数据时必须是签名账户
/// - SUBDOMAIN_PUBKEY: `x:y`，两段均为 32 字节十六进制
/// - SUBDOMAIN_TEXT_RECORDS: `key=value;key=value`
/// 设置了公钥或文本记录时自动先指向公共解析器
fn request_from_env(public_resolver: Address, signer: Address) -> Result<SubdomainRequest> {
    let parent = std::env::var("SUBDOMAIN_PARENT").context("SUBDOMAIN_PARENT must be set")?;
    let label = std::env::var("SUBDOMAIN_LABEL").context("SUBDOMAIN_LABEL must be set")?;
    let owner = match std::env::var("SUBDOMAIN_OWNER") {
        Ok(raw) => rpc_validator::parse_address(&raw).context("Invalid SUBDOMAIN_OWNER")?,
        Err(_) => signer,
    };

    let pubkey = match std::env::var("SUBDOMAIN_PUBKEY") {
        Ok(raw) => Some(parse_pubkey(&raw)?),
        Err(_) => None,
    };

    let text_records = std::env::var("SUBDOMAIN_TEXT_RECORDS")
        .map(|raw| parse_text_records(&raw))
        .unwrap_or_else(|_| Ok(Vec::new()))?;

    let resolver = match std::env::var("SUBDOMAIN_RESOLVER") {
        Ok(raw) => Some(rpc_validator::parse_address(&raw).context("Invalid SUBDOMAIN_RESOLVER")?),
        Err(_) if pubkey.is_some() || !text_records.is_empty() => Some(public_resolver),
        Err(_) => None,
    };

    Ok(SubdomainRequest {
        parent,
        label,
        owner,
        metadata: SubdomainMetadata {
            resolver,
            pubkey,
            text_records,
        },
    })
}

fn parse_pubkey(raw: &str) -> Result<(H256, H256)> {
    let (x, y) = raw
        .split_once(':')
        .context("SUBDOMAIN_PUBKEY must be formatted as x:y")?;
    Ok((parse_word(x)?, parse_word(y)?))
}

fn parse_word(raw: &str) -> Result<H256> {
    let bytes = hex::decode(raw.trim().trim_start_matches("0x"))
        .context("Public key coordinate is not valid hex")?;
    if bytes.len() != 32 {
        anyhow::bail!("Public key coordinate must be 32 bytes, got {}", bytes.len());
    }
    Ok(H256::from_slice(&bytes))
}

fn parse_text_records(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (key, value) = entry
                .split_once('=')
                .with_context(|| format!("Text record '{}' must be key=value", entry))?;
            Ok((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
