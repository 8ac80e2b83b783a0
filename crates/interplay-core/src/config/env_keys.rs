//! 环境变量 key 常量与别名定义
//!
//! 主变量优先使用 `INTERPLAY_*`，兼容早期的 `INTERACTION_*` 命名。

/// 可观测性与日志
pub mod observability {
    pub const INTERPLAY_QUIET: &str = "INTERPLAY_QUIET";
    pub const QUIET_ALIASES: &[&str] = &["INTERACTION_QUIET"];

    pub const INTERPLAY_LOG_LEVEL: &str = "INTERPLAY_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &["INTERACTION_LOG_LEVEL"];

    pub const INTERPLAY_LOG_JSON: &str = "INTERPLAY_LOG_JSON";
    pub const LOG_JSON_ALIASES: &[&str] = &["INTERACTION_LOG_JSON"];
}

/// RPC bridge：调用超时、correlation id 前缀、过期扫描间隔
pub mod bridge {
    pub const INTERPLAY_CALL_TIMEOUT_MS: &str = "INTERPLAY_CALL_TIMEOUT_MS";
    pub const CALL_TIMEOUT_ALIASES: &[&str] = &["INTERACTION_CALL_TIMEOUT_MS"];

    pub const INTERPLAY_CORRELATION_PREFIX: &str = "INTERPLAY_CORRELATION_PREFIX";

    pub const INTERPLAY_SWEEP_INTERVAL_MS: &str = "INTERPLAY_SWEEP_INTERVAL_MS";
}

/// Validation harness：渲染预算与 lint 规则文件
pub mod harness {
    pub const INTERPLAY_RENDER_TIMEOUT_MS: &str = "INTERPLAY_RENDER_TIMEOUT_MS";
    pub const INTERPLAY_RENDER_MEMORY_MB: &str = "INTERPLAY_RENDER_MEMORY_MB";
    pub const INTERPLAY_LINT_RULES: &str = "INTERPLAY_LINT_RULES";
    pub const LINT_RULES_ALIASES: &[&str] = &["INTERACTION_LINT_RULES"];
}

/// 可展示资源的落盘目录
pub mod cache {
    pub const INTERPLAY_RESOURCE_DIR: &str = "INTERPLAY_RESOURCE_DIR";
    pub const RESOURCE_DIR_ALIASES: &[&str] = &["INTERACTION_RESOURCE_DIR"];
}
