//! LLM 模块
//!
//! 面向 Ollama Chat API 的流式客户端。

mod client;
mod ollama;
mod types;

pub use client::LlmClient;
pub use types::*;
