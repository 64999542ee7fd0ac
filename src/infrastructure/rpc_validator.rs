// 输入校验模块 - 地址、哈希、金额、名称标签
// 所有来自配置、命令行或RPC的字符串在进入领域模型前都经过这里

use std::str::FromStr;

use ethers::types::{Address, H256, U256};

use crate::error::{ChainError, ChainResult};

/// 名称标签最大长度（DNS 规范）
const MAX_LABEL_LEN: usize = 63;

/// 解析EVM地址（支持EIP-55 Checksum）
pub fn parse_address(address: &str) -> ChainResult<Address> {
    let address = address.trim();

    if !address.starts_with("0x") || address.len() != 42 {
        return Err(ChainError::InvalidInput(format!(
            "invalid address format: {}",
            address
        )));
    }

    let parsed = Address::from_str(address)
        .map_err(|e| ChainError::InvalidInput(format!("invalid address {}: {}", address, e)))?;

    // 含大写字母时按 EIP-55 校验
    let hex_part = &address[2..];
    if hex_part.chars().any(|c| c.is_ascii_uppercase())
        && ethers::utils::to_checksum(&parsed, None) != address
    {
        return Err(ChainError::InvalidInput(format!(
            "address checksum mismatch: {}",
            address
        )));
    }

    Ok(parsed)
}

/// 验证交易哈希格式
pub fn parse_tx_hash(tx_hash: &str) -> ChainResult<H256> {
    let hash = tx_hash.trim().trim_start_matches("0x");

    // 以太坊交易哈希为32字节 = 64个十六进制字符
    if hash.len() != 64 {
        return Err(ChainError::InvalidInput(format!(
            "invalid transaction hash length: expected 64, got {}",
            hash.len()
        )));
    }

    let bytes = hex::decode(hash)
        .map_err(|e| ChainError::InvalidInput(format!("invalid transaction hash: {}", e)))?;

    Ok(H256::from_slice(&bytes))
}

/// 解析十进制 wei 金额
pub fn parse_wei(amount: &str) -> ChainResult<U256> {
    let amount = amount.trim();
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChainError::InvalidInput(format!(
            "invalid wei amount: {:?}",
            amount
        )));
    }

    U256::from_dec_str(amount)
        .map_err(|e| ChainError::InvalidInput(format!("invalid wei amount {}: {}", amount, e)))
}

/// 验证单个名称标签：小写字母、数字、连字符，不以连字符开头或结尾
pub fn validate_label(label: &str) -> ChainResult<()> {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return Err(ChainError::InvalidInput(format!(
            "label length must be 1..={}, got {}",
            MAX_LABEL_LEN,
            label.len()
        )));
    }

    let valid_chars = label
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars || label.starts_with('-') || label.ends_with('-') {
        return Err(ChainError::InvalidInput(format!("invalid label: {:?}", label)));
    }

    Ok(())
}

/// 验证完整名称（以点分隔的标签序列）
pub fn validate_name(name: &str) -> ChainResult<()> {
    if name.is_empty() {
        return Err(ChainError::InvalidInput("name must not be empty".into()));
    }
    name.split('.').try_for_each(validate_label)
}
