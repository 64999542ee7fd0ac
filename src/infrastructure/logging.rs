//! 日志系统配置模块
//! 支持结构化日志、日志级别配置和按天轮转的文件日志

use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const DEFAULT_LOG_FILE_NAME: &str = "namecore.log";

/// 初始化日志系统
///
/// 启用文件日志时返回后台写线程的 guard，调用方需持有到进程退出
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    // 设置日志级别过滤器（RUST_LOG 优先）
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.format == "json" {
        init_json_logging(filter, config)
    } else {
        init_text_logging(filter, config)
    }
}

/// 滚动文件名前缀取 `log_file_path` 的文件名，实际文件带日期后缀
fn log_file_name(config: &LoggingConfig) -> &str {
    config
        .log_file_path
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_NAME)
}

fn log_dir(config: &LoggingConfig) -> &Path {
    config
        .log_file_path
        .as_deref()
        .map(Path::new)
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("./logs"))
}

/// 初始化JSON格式日志（结构化日志）
fn init_json_logging(
    filter: EnvFilter,
    config: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    if config.enable_file_logging {
        let dir = log_dir(config);
        std::fs::create_dir_all(dir)?;

        let (writer, guard) = non_blocking(rolling::daily(dir, log_file_name(config)));

        let file_layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339());
        let stdout_layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339());

        Registry::default()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer)
            .try_init()?;

        Ok(Some(guard))
    } else {
        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init()?;

        Ok(None)
    }
}

/// 初始化文本格式日志
fn init_text_logging(
    filter: EnvFilter,
    config: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    if config.enable_file_logging {
        let dir = log_dir(config);
        std::fs::create_dir_all(dir)?;

        let (writer, guard) = non_blocking(rolling::daily(dir, log_file_name(config)));

        // 文件日志不带颜色
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false);
        let stdout_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(true);

        Registry::default()
            .with(filter)
            .with(file_layer)
            .with(stdout_layer)
            .try_init()?;

        Ok(Some(guard))
    } else {
        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true),
            )
            .try_init()?;

        Ok(None)
    }
}
