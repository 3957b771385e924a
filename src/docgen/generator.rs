//! Javadoc 生成客户端
//!
//! 把单条声明签名交给生成服务，校验并清理返回的注释块。

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::prompts;
use crate::config::OllamaConfig;
use crate::extract::Declaration;
use crate::llm::{ChatMessage, ChatOptions, LlmClient};

/// 注释开始标记
const COMMENT_OPEN: &str = "/**";
/// 注释结束标记
const COMMENT_CLOSE: &str = "*/";

/// 注释来源抽象
///
/// 对一条声明产出一个完整的 Javadoc 块；产出失败或格式不合法时为 `None`,
/// 由调用方跳过该条声明。
pub trait CommentSource: Send + Sync {
    fn generate<'a>(
        &'a self,
        declaration: &'a Declaration,
        related: &'a [String],
    ) -> BoxFuture<'a, Option<String>>;
}

/// 基于 LLM 的注释生成器
pub struct CommentGenerator {
    client: Arc<LlmClient>,
    config: OllamaConfig,
}

impl CommentGenerator {
    pub fn new(client: Arc<LlmClient>, config: OllamaConfig) -> Self {
        Self { client, config }
    }

    /// 请求一条声明的 Javadoc
    ///
    /// 限流由客户端做有界重试；其余错误在这里降级为 `None` 并记录日志，
    /// 不向上扩散。
    async fn generate_comment(
        &self,
        declaration: &Declaration,
        related: &[String],
    ) -> Option<String> {
        let prompt = prompts::format_signature_prompt(
            declaration.kind.as_str(),
            &declaration.signature,
            related,
        );
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let options = ChatOptions {
            temperature: Some(self.config.temperature),
            top_p: Some(self.config.top_p),
            num_ctx: Some(self.config.context_window),
        };

        let response = match self
            .client
            .chat_with_retry(
                messages,
                &self.config.model,
                &options,
                self.config.max_retries,
                Duration::from_millis(self.config.retry_delay_ms),
            )
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("生成 {} 注释失败: {}", declaration.kind.as_str(), e);
                return None;
            }
        };

        match sanitize_comment(&response) {
            Some(comment) => Some(comment),
            None => {
                warn!(
                    "收到的 Javadoc 格式不合法 ({}): {}",
                    declaration.kind.as_str(),
                    declaration.name.as_deref().unwrap_or("<anonymous>")
                );
                debug!("原始响应: {}", response);
                None
            }
        }
    }
}

impl CommentSource for CommentGenerator {
    fn generate<'a>(
        &'a self,
        declaration: &'a Declaration,
        related: &'a [String],
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(self.generate_comment(declaration, related))
    }
}

/// 校验并清理模型返回的注释块
///
/// 去除首尾空白后必须以 `/**` 开头且包含 `*/`；出现多个 `*/` 时在第一个
/// 之后截断。清理后仍不满足开头/结尾约束则判为不合法。
pub fn sanitize_comment(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with(COMMENT_OPEN) {
        return None;
    }

    let close = trimmed.find(COMMENT_CLOSE)?;
    let cleaned = &trimmed[..close + COMMENT_CLOSE.len()];

    if cleaned.ends_with(COMMENT_CLOSE) {
        Some(cleaned.to_string())
    } else {
        None
    }
}
