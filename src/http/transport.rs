//! 传输层 Trait 定义
//!
//! 定义访问 Jenkins 控制 API 的核心接口。
//! 传输层只负责发送请求并返回状态码、响应头和响应体，
//! 认证方式、连接复用都由具体实现处理。

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::pin::Pin;

use crate::error::JenkinsResult;

/// 响应字节流类型
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// 请求体字节流类型
///
/// reqwest 包装流式请求体时要求 `Sync`
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync>>;

/// 请求体
pub enum RequestBody {
    /// 空请求体
    Empty,
    /// 流式请求体
    Stream {
        stream: BodyStream,
        content_type: String,
        content_length: u64,
    },
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Stream {
                content_type,
                content_length,
                ..
            } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .field("content_length", content_length)
                .finish(),
        }
    }
}

/// API 请求
///
/// `target` 可以是相对于 Jenkins 根地址的路径（如 `/pluginManager/plugins`），
/// 也可以是完整 URL（如更新中心的下载地址）
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub target: String,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            target: target.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            target: target.into(),
            body: RequestBody::Empty,
        }
    }

    /// 设置请求体
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// 目标是否为完整 URL
    pub fn is_absolute(&self) -> bool {
        let lower = self.target.to_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

/// 完整读取的 API 响应
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 获取某个响应头的全部取值（按出现顺序）
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).to_string())
            .collect()
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// 流式 API 响应（用于下载）
pub struct StreamingResponse {
    pub status: u16,
    /// 响应声明的长度
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// 传输层 Trait
///
/// 由会话/配置管理提供的已认证 HTTP 能力
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求并完整读取响应
    async fn send(&self, request: ApiRequest) -> JenkinsResult<ApiResponse>;

    /// 发送请求并以流的形式返回响应体
    async fn send_streaming(&self, request: ApiRequest) -> JenkinsResult<StreamingResponse>;

    /// 获取传输层名称
    fn name(&self) -> &str;
}
