//! Ollama Chat API 流式实现

use async_stream::try_stream;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, error};

use super::types::{ChatChunk, ChatMessage, ChatOptions, LlmError};

/// Ollama 请求载荷
#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// 采样参数
#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

/// NDJSON 响应块
#[derive(Deserialize, Debug)]
struct OllamaStreamChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OllamaMessage {
    content: String,
}

/// 流式调用 Ollama Chat API
///
/// 响应按行到达（每行一个 JSON 对象），`done: true` 标记最后一块。
pub fn stream_ollama(
    client: &Client,
    base_url: &str,
    messages: Vec<ChatMessage>,
    model: &str,
    options: &ChatOptions,
) -> Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>> {
    let endpoint = format!("{}/api/chat", base_url.trim_end_matches('/'));
    let model = model.to_string();
    let options = options.clone();
    let client = client.clone();

    Box::pin(try_stream! {
        // 构建请求体
        let payload = OllamaRequest {
            model: model.clone(),
            messages,
            stream: true,
            options: OllamaOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_ctx: options.num_ctx,
            },
        };

        debug!("Ollama API request: endpoint={}, model={}", endpoint, model);

        // 发送请求
        let response = client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        // 检查状态码；429 单独上报，调用方决定是否重试
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            error!("Ollama API error: status={}, body={}", status_code, error_text);
            if status_code == 429 {
                Err(LlmError::RateLimited(error_text))?;
            } else {
                Err(LlmError::ApiError {
                    status: status_code,
                    message: error_text,
                })?;
            }
            return;
        }

        // 逐行消费 NDJSON 流
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        use futures::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let bytes = chunk_result?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline_pos) = buffer.find('\n') {
                let line = buffer[..newline_pos].trim().to_string();
                buffer = buffer[newline_pos + 1..].to_string();

                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<OllamaStreamChunk>(&line) {
                    Ok(chunk) => {
                        if let Some(message) = chunk.error {
                            Err(LlmError::StreamError(message))?;
                        }
                        let done = chunk.done;
                        yield ChatChunk {
                            content: chunk.message.map(|m| m.content),
                            done,
                        };
                        if done {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!("Failed to parse Ollama response line: {}, data: {}", e, line);
                        // 坏行跳过，不中断流
                    }
                }
            }
        }
    })
}
