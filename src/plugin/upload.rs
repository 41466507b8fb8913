//! 插件上传请求编码
//!
//! 把本地文件编码为 multipart/form-data 流式请求体：
//! 文件字段在前，额外表单字段按键名排序在后，最后是结束分隔符。
//! 请求体总长度在发送前即可确定

use bytes::Bytes;
use futures::{future, stream, StreamExt};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::error::{JenkinsError, JenkinsResult};
use crate::http::{ApiRequest, BodyStream, RequestBody};
use crate::progress::{ProgressCallback, ProgressStream, TransferStage};

/// 插件上传接口
pub const UPLOAD_PLUGIN_API: &str = "/pluginManager/uploadPlugin";

/// 插件上传的文件字段名
pub const UPLOAD_FIELD_NAME: &str = "@name";

/// 上传任务
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub local_path: PathBuf,
    pub endpoint: String,
    pub field_name: String,
    pub extra_fields: BTreeMap<String, String>,
    pub show_progress: bool,
}

impl UploadJob {
    /// 插件上传任务（`@name` 字段，无额外字段）
    pub fn plugin(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            endpoint: UPLOAD_PLUGIN_API.to_string(),
            field_name: UPLOAD_FIELD_NAME.to_string(),
            extra_fields: BTreeMap::new(),
            show_progress: false,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// 文件名（不含目录）
    pub fn file_name(&self) -> JenkinsResult<String> {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                JenkinsError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} is not a file", self.local_path.display()),
                ))
            })
    }
}

/// multipart 分隔与头部
#[derive(Debug, Clone)]
pub struct MultipartFraming {
    boundary: String,
}

impl Default for MultipartFraming {
    fn default() -> Self {
        Self::new(format!("jcli-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl MultipartFraming {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// 文件内容之前的部分
    pub fn prefix(&self, field_name: &str, file_name: &str) -> Bytes {
        Bytes::from(format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            self.boundary,
            escape_quotes(field_name),
            escape_quotes(file_name)
        ))
    }

    /// 文件内容之后的部分：额外字段 + 结束分隔符
    pub fn suffix(&self, fields: &BTreeMap<String, String>) -> Bytes {
        let mut suffix = String::new();
        for (key, value) in fields {
            suffix.push_str(&format!(
                "\r\n--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                self.boundary,
                escape_quotes(key),
                value
            ));
        }
        suffix.push_str(&format!("\r\n--{}--\r\n", self.boundary));
        Bytes::from(suffix)
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 编码后的上传请求
pub struct EncodedUpload {
    pub request: ApiRequest,
    /// 文件大小
    pub file_size: u64,
    /// 请求体总长度
    pub content_length: u64,
}

/// 上传编码器
#[derive(Debug, Clone, Default)]
pub struct UploadEncoder {
    framing: Option<MultipartFraming>,
}

impl UploadEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用固定分隔符
    pub fn with_framing(framing: MultipartFraming) -> Self {
        Self {
            framing: Some(framing),
        }
    }

    /// 编码上传请求
    ///
    /// 文件在发送前打开并读取大小，打开失败不会产生任何网络请求
    pub async fn encode(
        &self,
        job: &UploadJob,
        progress: Arc<dyn ProgressCallback>,
    ) -> JenkinsResult<EncodedUpload> {
        let file_name = job.file_name()?;
        let file = tokio::fs::File::open(&job.local_path).await?;
        let file_size = file.metadata().await?.len();

        let framing = self.framing.clone().unwrap_or_default();
        let prefix = framing.prefix(&job.field_name, &file_name);
        let suffix = framing.suffix(&job.extra_fields);
        let content_length = prefix.len() as u64 + file_size + suffix.len() as u64;

        debug!(
            "上传 {:?}: 文件 {} bytes, 请求体 {} bytes",
            job.local_path, file_size, content_length
        );

        // 进度只统计文件内容，不含 multipart 头尾
        let file_stream: BodyStream = if job.show_progress {
            Box::pin(ProgressStream::new(
                ReaderStream::new(file),
                TransferStage::Uploading,
                file_name,
                file_size,
                progress,
            ))
        } else {
            Box::pin(ReaderStream::new(file))
        };

        let body_stream: BodyStream = Box::pin(
            stream::once(future::ready(Ok::<_, std::io::Error>(prefix)))
                .chain(file_stream)
                .chain(stream::once(future::ready(Ok(suffix)))),
        );

        let request = ApiRequest::post(job.endpoint.clone()).with_body(RequestBody::Stream {
            stream: body_stream,
            content_type: framing.content_type(),
            content_length,
        });

        Ok(EncodedUpload {
            request,
            file_size,
            content_length,
        })
    }
}
