//! 统一 LLM 客户端

use futures::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

use super::ollama::stream_ollama;
use super::types::{ChatChunk, ChatMessage, ChatOptions, LlmError, StreamCollectResult};

/// Ollama 端点客户端
///
/// 无会话状态，请求之间相互独立，可在工作任务之间共享只读引用。
pub struct LlmClient {
    client: Client,
    base_url: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// 探测端点是否可达
    pub async fn health_check(&self) -> Result<(), LlmError> {
        let endpoint = format!("{}/api/version", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::Unreachable(format!("status {}", response.status())))
        }
    }

    /// 流式聊天
    pub fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: &ChatOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
        stream_ollama(&self.client, &self.base_url, messages, model, options)
    }

    /// 流式请求并收集完整响应
    ///
    /// 整个流消费完毕后才返回，调用方在完整文本上做校验。
    pub async fn stream_and_collect(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: &ChatOptions,
    ) -> Result<StreamCollectResult, LlmError> {
        let mut stream = self.stream_chat(messages, model, options);
        let mut result = StreamCollectResult::default();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            result.chunk_count += 1;
            if let Some(content) = chunk.content {
                result.content.push_str(&content);
            }
        }

        debug!(
            "Stream collected: {} chunks, {} bytes",
            result.chunk_count,
            result.content.len()
        );
        Ok(result)
    }

    /// 带限流重试的完整请求
    ///
    /// 收到限流响应时最多重试 `max_retries` 次，每次间隔 `retry_delay`；
    /// 重试耗尽后把最后一次的限流错误交还调用方。
    pub async fn chat_with_retry(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: &ChatOptions,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self
                .stream_and_collect(messages.clone(), model, options)
                .await
            {
                Ok(result) => return Ok(result.content),
                Err(LlmError::RateLimited(message)) if attempt < max_retries => {
                    attempt += 1;
                    warn!(
                        "Rate limited by endpoint ({}), retry {}/{}",
                        message, attempt, max_retries
                    );
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
