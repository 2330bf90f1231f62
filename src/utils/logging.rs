//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化全局日志
///
/// `RUST_LOG` 优先；否则默认 `info`，开启详细日志时本 crate 使用 `debug`。
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "info,smart_teacher_assistant=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // 测试中可能被重复调用，忽略已初始化的错误
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 Smart Teacher Assistant 启动");
    info!(
        "🕒 启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 模型: {} @ {}", config.llm_model_name, config.llm_api_base_url);
    info!("🔍 OCR 命令: {}", config.tesseract_cmd);
    info!("{}", "=".repeat(60));

    if !config.has_api_key() {
        warn!("⚠️ 未设置 GOOGLE_API_KEY，模型调用将返回错误信息");
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
