//! 测试用传输层
//!
//! 按顺序返回预设响应，并记录收到的每个请求（请求体完整读出）

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::collections::VecDeque;

use super::transport::{ApiRequest, ApiResponse, RequestBody, StreamingResponse, Transport};
use crate::error::{JenkinsError, JenkinsResult};

/// 预设响应
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        /// 流式响应声明的长度，`None` 表示不声明
        content_length: Option<u64>,
    },
    /// 模拟传输层失败
    Fail(String),
}

impl Scripted {
    pub fn status(status: u16) -> Self {
        Scripted::Respond {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            content_length: None,
        }
    }

    pub fn ok() -> Self {
        Self::status(200)
    }

    pub fn body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Scripted::Respond {
            status,
            headers: Vec::new(),
            content_length: Some(body.len() as u64),
            body,
        }
    }

    /// 不声明长度的下载响应
    pub fn unsized_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Scripted::Respond {
            status,
            headers: Vec::new(),
            body: body.into(),
            content_length: None,
        }
    }

    pub fn with_header(self, name: &str, value: &str) -> Self {
        match self {
            Scripted::Respond {
                status,
                mut headers,
                body,
                content_length,
            } => {
                headers.push((name.to_string(), value.to_string()));
                Scripted::Respond {
                    status,
                    headers,
                    body,
                    content_length,
                }
            }
            fail => fail,
        }
    }
}

/// 已记录的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub target: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// 记录型传输层
#[derive(Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 获取已记录的请求
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// 获取已记录请求的目标地址
    pub fn targets(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.target.clone()).collect()
    }

    async fn record(&self, request: ApiRequest) -> JenkinsResult<Scripted> {
        let (content_type, content_length, body) = match request.body {
            RequestBody::Empty => (None, None, Vec::new()),
            RequestBody::Stream {
                mut stream,
                content_type,
                content_length,
            } => {
                let mut body = Vec::new();
                while let Some(chunk) = stream.next().await {
                    body.extend_from_slice(&chunk?);
                }
                (Some(content_type), Some(content_length), body)
            }
        };

        self.requests.lock().push(RecordedRequest {
            method: request.method,
            target: request.target,
            content_type,
            content_length,
            body,
        });

        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Fail(message)) => Err(JenkinsError::Transport(message)),
            Some(scripted) => Ok(scripted),
            None => Err(JenkinsError::Transport(
                "no scripted response left".to_string(),
            )),
        }
    }
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.append(name, value);
        }
    }
    map
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> JenkinsResult<ApiResponse> {
        match self.record(request).await? {
            Scripted::Respond {
                status,
                headers,
                body,
                ..
            } => Ok(ApiResponse::new(status, header_map(&headers), body)),
            Scripted::Fail(message) => Err(JenkinsError::Transport(message)),
        }
    }

    async fn send_streaming(&self, request: ApiRequest) -> JenkinsResult<StreamingResponse> {
        match self.record(request).await? {
            Scripted::Respond {
                status,
                body,
                content_length,
                ..
            } => {
                // 拆成小块，模拟分段到达
                let chunks: Vec<Result<Bytes, std::io::Error>> = body
                    .chunks(4)
                    .map(|c| Ok(Bytes::copy_from_slice(c)))
                    .collect();
                Ok(StreamingResponse {
                    status,
                    content_length,
                    body: Box::pin(futures::stream::iter(chunks)),
                })
            }
            Scripted::Fail(message) => Err(JenkinsError::Transport(message)),
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}
