//! LLM 类型定义

use serde::{Deserialize, Serialize};

/// 聊天消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user, assistant
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 流式响应块
#[derive(Debug, Clone, Default)]
pub struct ChatChunk {
    /// 文本增量
    pub content: Option<String>,
    /// 是否为最后一块
    pub done: bool,
}

/// 聊天选项
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// 温度参数
    pub temperature: Option<f64>,
    /// top_p 参数
    pub top_p: Option<f64>,
    /// 上下文窗口大小
    pub num_ctx: Option<u32>,
}

/// 流式收集结果
#[derive(Debug, Clone, Default)]
pub struct StreamCollectResult {
    /// 完整响应内容
    pub content: String,
    /// chunk 数量
    pub chunk_count: usize,
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 端点限流
    #[error("端点限流: {0}")]
    RateLimited(String),

    /// 流解析错误
    #[error("流解析错误: {0}")]
    StreamError(String),

    /// 端点不可达
    #[error("无法连接生成服务: {0}")]
    Unreachable(String),
}
