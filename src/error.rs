//! 错误类型定义
//!
//! 插件管理流程中所有失败都归一为 `JenkinsError`：
//! - 标识符解析错误（本地检测，不会发送请求）
//! - 传输错误（连接、DNS、超时，原样透传）
//! - 服务端拒绝（非 200 状态码，经分类后的可读消息）
//! - 本地 IO 错误（下载写入、上传编码时的文件操作）

use thiserror::Error;

/// 插件管理错误
#[derive(Error, Debug)]
pub enum JenkinsError {
    /// 插件标识符格式错误
    #[error("invalid plugin identifier: {0}")]
    InvalidIdentifier(String),

    /// 传输层错误
    #[error("{0}")]
    Transport(String),

    /// 服务端拒绝请求
    ///
    /// 只展示消息本身，`X-Error: boom` 最终显示为 `boom`
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 本地 IO 错误
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// 响应 JSON 解析失败
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// 配置错误
    #[error("{0}")]
    Config(String),
}

impl JenkinsError {
    /// 创建服务端拒绝错误
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        JenkinsError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// 获取对应的 HTTP 状态码（仅服务端拒绝时存在）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            JenkinsError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 获取错误类型字符串
    pub fn error_type(&self) -> &'static str {
        match self {
            JenkinsError::InvalidIdentifier(_) => "resolution_error",
            JenkinsError::Transport(_) => "transport_error",
            JenkinsError::Rejected { .. } => "remote_rejection",
            JenkinsError::Io(_) => "io_error",
            JenkinsError::Decode(_) => "decode_error",
            JenkinsError::Config(_) => "config_error",
        }
    }
}

impl From<reqwest::Error> for JenkinsError {
    fn from(e: reqwest::Error) -> Self {
        JenkinsError::Transport(e.to_string())
    }
}

/// 插件管理结果类型
pub type JenkinsResult<T> = Result<T, JenkinsError>;
