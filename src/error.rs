//! 统一错误处理模块
//!
//! 定义应用级错误类型，各组件的模块级错误在进程边界收敛到这里。

use thiserror::Error;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// LLM 调用错误
    #[error("LLM 错误: {0}")]
    Llm(String),

    /// 源码解析错误
    #[error("解析错误: {0}")]
    Extract(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
