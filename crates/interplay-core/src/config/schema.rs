//! 按领域分组的配置结构体
//!
//! 从环境变量加载，统一 fallback 逻辑。`Default` 实现不读取环境变量，供测试和嵌入方使用。

use super::env_keys::{bridge, cache, harness, observability as obv_keys};
use super::loader::{env_bool, env_optional, env_or, env_parse};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 250;
const DEFAULT_CORRELATION_PREFIX: &str = "rpc";
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_RENDER_MEMORY_MB: usize = 64;

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::INTERPLAY_QUIET, obv_keys::QUIET_ALIASES, false),
                log_level: env_or(
                    obv_keys::INTERPLAY_LOG_LEVEL,
                    obv_keys::LOG_LEVEL_ALIASES,
                    || "interplay=info".to_string(),
                ),
                log_json: env_bool(
                    obv_keys::INTERPLAY_LOG_JSON,
                    obv_keys::LOG_JSON_ALIASES,
                    false,
                ),
            }
        })
    }
}

/// RPC bridge 配置
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// 每个 request/response 调用的默认截止时间
    pub call_timeout: Duration,
    /// correlation id 前缀（`prefix-timestamp-sequence`）
    pub correlation_prefix: String,
    /// 过期扫描间隔
    pub sweep_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            correlation_prefix: DEFAULT_CORRELATION_PREFIX.to_string(),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            call_timeout: Duration::from_millis(env_parse(
                bridge::INTERPLAY_CALL_TIMEOUT_MS,
                bridge::CALL_TIMEOUT_ALIASES,
                DEFAULT_CALL_TIMEOUT_MS,
            )),
            correlation_prefix: env_or(bridge::INTERPLAY_CORRELATION_PREFIX, &[], || {
                DEFAULT_CORRELATION_PREFIX.to_string()
            }),
            sweep_interval: Duration::from_millis(env_parse(
                bridge::INTERPLAY_SWEEP_INTERVAL_MS,
                &[],
                DEFAULT_SWEEP_INTERVAL_MS,
            )),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Validation harness 配置：隔离渲染的时间/内存预算、自定义 lint 规则文件
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub render_timeout: Duration,
    pub render_memory_mb: usize,
    pub lint_rules_path: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            render_timeout: Duration::from_millis(DEFAULT_RENDER_TIMEOUT_MS),
            render_memory_mb: DEFAULT_RENDER_MEMORY_MB,
            lint_rules_path: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            render_timeout: Duration::from_millis(env_parse(
                harness::INTERPLAY_RENDER_TIMEOUT_MS,
                &[],
                DEFAULT_RENDER_TIMEOUT_MS,
            )),
            render_memory_mb: env_parse(
                harness::INTERPLAY_RENDER_MEMORY_MB,
                &[],
                DEFAULT_RENDER_MEMORY_MB,
            ),
            lint_rules_path: env_optional(
                harness::INTERPLAY_LINT_RULES,
                harness::LINT_RULES_ALIASES,
            )
            .map(PathBuf::from),
        }
    }

    pub fn render_memory_bytes(&self) -> usize {
        self.render_memory_mb * 1024 * 1024
    }
}

/// 可展示资源目录配置
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub resource_dir: PathBuf,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let resource_dir = env_optional(cache::INTERPLAY_RESOURCE_DIR, cache::RESOURCE_DIR_ALIASES)
            .map(PathBuf::from)
            .unwrap_or_else(default_resource_dir);
        Self { resource_dir }
    }
}

fn default_resource_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("interplay")
        .join("resources")
}
