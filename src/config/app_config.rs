//! 应用配置管理
//!
//! 配置从 JSON 文件加载，缺省字段用内置默认值补齐，部分字段可由环境变量
//! 覆盖。配置在启动时构造一次，之后作为不可变值传递给各组件。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 生成端点配置
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// 文件处理配置
    #[serde(default)]
    pub processing: ProcessingConfig,
}

/// Ollama 端点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// 服务主机名
    #[serde(default = "default_host")]
    pub host: String,

    /// 服务端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数 (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// top_p 参数
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// 上下文窗口大小
    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// 限流重试次数上限
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 限流重试间隔（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl OllamaConfig {
    /// 端点基础 URL
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// 文件处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// 每批文件数量
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// 批内最大并发任务数（最小1，最大10）
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// 每个文件生成调用结束后的停顿（毫秒）
    #[serde(default = "default_rate_limit_pause_ms")]
    pub rate_limit_pause_ms: u64,

    /// 最大文件大小（字节，默认1MB）
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// 忽略的目录/文件模式
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// 类关系辅助文件名
    #[serde(default = "default_relationships_file")]
    pub relationships_file: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    11434
}

fn default_model() -> String {
    "qwen2.5-coder:7b".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_context_window() -> u32 {
    8192
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    60_000
}

fn default_batch_size() -> usize {
    10
}

fn default_max_concurrent_tasks() -> usize {
    3
}

fn default_rate_limit_pause_ms() -> u64 {
    1_000
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1MB
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "target".to_string(),
        "build".to_string(),
        "out".to_string(),
        "node_modules".to_string(),
        "generated".to_string(),
    ]
}

fn default_relationships_file() -> String {
    "class_relationships.json".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            context_window: default_context_window(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            rate_limit_pause_ms: default_rate_limit_pause_ms(),
            max_file_size: default_max_file_size(),
            ignore_patterns: default_ignore_patterns(),
            relationships_file: default_relationships_file(),
        }
    }
}

impl AppConfig {
    /// 加载配置
    ///
    /// 未指定路径时使用默认值；指定的文件必须存在且可解析。
    /// 环境变量覆盖在文件之后应用。
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    AppError::Config(format!("读取配置文件失败 ({}): {}", p.display(), e))
                })?;
                serde_json::from_str(&content)
                    .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?
            }
            None => AppConfig::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Ok(port) = std::env::var("OLLAMA_PORT") {
            match port.parse() {
                Ok(port) => self.ollama.port = port,
                Err(_) => warn!("Ignoring invalid OLLAMA_PORT value: {}", port),
            }
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ollama.host, "localhost");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.ollama.max_retries, 3);
        assert!((config.ollama.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.processing.batch_size, 10);
        assert_eq!(config.processing.max_concurrent_tasks, 3);
        assert_eq!(config.processing.relationships_file, "class_relationships.json");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"ollama": {"model": "llama3", "port": 8080}}"#).unwrap();
        assert_eq!(config.ollama.model, "llama3");
        assert_eq!(config.ollama.port, 8080);
        // 未给出的字段回落到默认值
        assert_eq!(config.ollama.host, "localhost");
        assert_eq!(config.processing.batch_size, 10);
    }

    #[test]
    fn test_base_url() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url(), "http://localhost:11434");
    }
}
