//! HTTP 客户端工厂
//!
//! 创建访问 Jenkins 的 reqwest 客户端，并提供基于它的 `Transport` 实现。
//! 认证固定为 HTTP Basic（用户名 + API Token）

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, RequestBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::transport::{ApiRequest, ApiResponse, RequestBody, StreamingResponse, Transport};
use crate::config::JenkinsServer;
use crate::error::{JenkinsError, JenkinsResult};
use crate::logger::sanitize_log_message;

/// 客户端构建错误
#[derive(Debug, Error)]
pub enum ClientError {
    /// 无效的 Jenkins 地址
    #[error("invalid Jenkins URL: {0}")]
    InvalidUrl(String),

    /// 客户端构建错误
    #[error("failed to build HTTP client: {0}")]
    ClientBuildError(String),
}

impl From<ClientError> for JenkinsError {
    fn from(e: ClientError) -> Self {
        JenkinsError::Config(e.to_string())
    }
}

/// HTTP 客户端工厂
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    /// 连接超时时间
    connect_timeout: Duration,
    /// 请求超时时间
    request_timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            user_agent: format!("jcli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置连接超时时间
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// 设置请求超时时间
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 校验 Jenkins 根地址
    ///
    /// 只接受 http/https，返回去掉末尾 `/` 的地址
    pub fn normalize_base_url(url: &str) -> Result<String, ClientError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let parsed =
            url::Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{trimmed}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(trimmed.trim_end_matches('/').to_string()),
            other => Err(ClientError::InvalidUrl(format!(
                "unsupported scheme {other}: {trimmed}"
            ))),
        }
    }

    /// 创建 HTTP 客户端
    pub fn create_client(&self) -> Result<Client, ClientError> {
        Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| ClientError::ClientBuildError(e.to_string()))
    }

    /// 为指定 Jenkins 创建传输层
    pub fn create_transport(&self, server: &JenkinsServer) -> Result<ReqwestTransport, ClientError> {
        let base_url = Self::normalize_base_url(&server.url)?;
        let client = self.create_client()?;

        let credentials = if server.username.is_empty() {
            None
        } else {
            Some((server.username.clone(), server.token.clone()))
        };

        Ok(ReqwestTransport {
            client,
            base_url,
            credentials,
        })
    }
}

/// 基于 reqwest 的传输层实现
///
/// 相对路径拼接到 Jenkins 根地址并附带认证；
/// 完整 URL（更新中心、镜像）原样请求，不附带认证
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl ReqwestTransport {
    /// 获取 Jenkins 根地址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 解析请求目标
    pub fn resolve_target(&self, request: &ApiRequest) -> String {
        if request.is_absolute() {
            request.target.clone()
        } else if request.target.starts_with('/') {
            format!("{}{}", self.base_url, request.target)
        } else {
            format!("{}/{}", self.base_url, request.target)
        }
    }

    fn build(&self, request: ApiRequest) -> RequestBuilder {
        let url = self.resolve_target(&request);
        debug!("{} {}", request.method, sanitize_log_message(&url));

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.is_absolute() {
            if let Some((user, token)) = &self.credentials {
                builder = builder.basic_auth(user, Some(token));
            }
        }

        match request.body {
            RequestBody::Empty => builder,
            RequestBody::Stream {
                stream,
                content_type,
                content_length,
            } => builder
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_LENGTH, content_length)
                .body(Body::wrap_stream(stream)),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> JenkinsResult<ApiResponse> {
        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("响应状态: {}, {} 字节", status, body.len());
        Ok(ApiResponse::new(status, headers, body))
    }

    async fn send_streaming(&self, request: ApiRequest) -> JenkinsResult<StreamingResponse> {
        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));

        Ok(StreamingResponse {
            status,
            content_length,
            body: Box::pin(body),
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
