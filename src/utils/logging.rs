/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::Region;

/// 默认日志级别
const DEFAULT_LEVEL: &str = "info";

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，其次 `LOG_LEVEL`，都没有时为 `info`。
/// 重复调用是安全的（测试中会多次调用）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `regions`: 本次要处理的地区
/// - `cap_min` / `cap_max`: 每日上限范围
pub fn log_startup(regions: &[Region], cap_min: u32, cap_max: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - LinkedIn Easy Apply 自动投递");
    info!(
        "🌎 目标地区 ({}): {}",
        regions.len(),
        regions.iter().map(|r| r.name()).collect::<Vec<_>>().join(", ")
    );
    info!("🎯 每日上限范围: {}-{}", cap_min, cap_max);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_text("Desarrollador Añejo", 13), "Desarrollador...");
        assert_eq!(truncate_text("短文本", 10), "短文本");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init();
        init();
    }
}
