//! 响应分类
//!
//! 把 Jenkins 返回的状态码、`X-Error` 响应头统一转换为成功或一个可读的错误。
//! 开启调试时，失败响应的原始内容写入工作目录下的 `debug.html`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{JenkinsError, JenkinsResult};
use crate::http::ApiResponse;
use crate::logger::sanitize_log_message;

/// 调试日志文件名
pub const DEBUG_LOG_FILE: &str = "debug.html";

/// Jenkins 插件管理器携带错误信息的响应头
pub const ERROR_HEADER: &str = "X-Error";

/// 非 200 状态码的错误描述方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    /// `unexpected status code: <code>`
    Unexpected,
    /// `StatusCode: <code>`（上传接口）
    Upload,
}

impl StatusMessage {
    fn format(&self, status: u16) -> String {
        match self {
            StatusMessage::Unexpected => format!("unexpected status code: {}", status),
            StatusMessage::Upload => format!("StatusCode: {}", status),
        }
    }
}

/// 失败响应的调试输出
#[derive(Debug, Clone)]
pub struct Diagnostics {
    enabled: bool,
    path: PathBuf,
}

impl Diagnostics {
    pub fn new(enabled: bool, work_dir: &Path) -> Self {
        Self {
            enabled,
            path: work_dir.join(DEBUG_LOG_FILE),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Path::new("."))
    }

    /// 写入原始响应内容，覆盖旧内容；写入失败只记录日志
    pub fn record(&self, body: &[u8]) {
        if !self.enabled {
            return;
        }

        let result = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(body));

        match result {
            Ok(()) => debug!("失败响应已写入 {:?}", self.path),
            Err(e) => debug!("写入调试文件失败 {:?}: {}", self.path, e),
        }
    }
}

/// 响应分类器
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    diagnostics: Diagnostics,
}

impl ResponseClassifier {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// 分类批量安装响应
    ///
    /// - 200：成功
    /// - 400 且带 `X-Error`：以最后一个取值作为错误信息
    /// - 400 不带 `X-Error`：`cannot found plugins <query>`
    /// - 其他：带状态码的错误
    pub fn install(&self, response: &ApiResponse, query: &str) -> JenkinsResult<()> {
        if response.is_ok() {
            return Ok(());
        }

        let error = if response.status == 400 {
            match response.header_values(ERROR_HEADER).pop() {
                Some(message) => JenkinsError::rejected(400, message),
                None => JenkinsError::rejected(400, format!("cannot found plugins {}", query)),
            }
        } else {
            JenkinsError::rejected(response.status, StatusMessage::Unexpected.format(response.status))
        };

        self.fail(response, error)
    }

    /// 要求状态码为 200
    pub fn expect_ok(&self, response: &ApiResponse, style: StatusMessage) -> JenkinsResult<()> {
        if response.is_ok() {
            return Ok(());
        }

        let error = JenkinsError::rejected(response.status, style.format(response.status));
        self.fail(response, error)
    }

    fn fail(&self, response: &ApiResponse, error: JenkinsError) -> JenkinsResult<()> {
        warn!("请求失败: {}", error);
        let preview = String::from_utf8_lossy(&response.body[..response.body.len().min(512)]);
        debug!("响应内容: {}", sanitize_log_message(&preview));

        self.diagnostics.record(&response.body);
        Err(error)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use tempfile::TempDir;

    fn response(status: u16, errors: &[&'static str], body: &'static str) -> ApiResponse {
        let mut headers = HeaderMap::new();
        for e in errors {
            headers.append(ERROR_HEADER, HeaderValue::from_static(e));
        }
        ApiResponse::new(status, headers, body)
    }

    fn classifier() -> ResponseClassifier {
        ResponseClassifier::new(Diagnostics::disabled())
    }

    #[test]
    fn test_install_ok() {
        assert!(classifier().install(&response(200, &[], ""), "plugin.git=").is_ok());
    }

    #[test]
    fn test_install_error_header() {
        let err = classifier()
            .install(&response(400, &["boom"], ""), "plugin.git=")
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn test_install_error_header_last_value_wins() {
        let err = classifier()
            .install(&response(400, &["first", "second"], ""), "plugin.git=")
            .unwrap_err();
        assert_eq!(err.to_string(), "second");
    }

    #[test]
    fn test_install_not_found() {
        let err = classifier()
            .install(&response(400, &[], ""), "plugin.foo=&plugin.bar=")
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot found plugins plugin.foo=&plugin.bar=");
    }

    #[test]
    fn test_install_other_status() {
        let err = classifier()
            .install(&response(503, &[], ""), "plugin.git=")
            .unwrap_err();
        assert!(err.to_string().contains("503"));
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn test_expect_ok_styles() {
        let c = classifier();
        assert!(c.expect_ok(&response(200, &[], ""), StatusMessage::Upload).is_ok());
        assert_eq!(
            c.expect_ok(&response(500, &[], ""), StatusMessage::Upload)
                .unwrap_err()
                .to_string(),
            "StatusCode: 500"
        );
        assert_eq!(
            c.expect_ok(&response(404, &[], ""), StatusMessage::Unexpected)
                .unwrap_err()
                .to_string(),
            "unexpected status code: 404"
        );
    }

    #[test]
    fn test_diagnostics_written_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let c = ResponseClassifier::new(Diagnostics::new(true, dir.path()));
        let path = dir.path().join(DEBUG_LOG_FILE);

        let _ = c.expect_ok(&response(500, &[], "<html>first failure</html>"), StatusMessage::Upload);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>first failure</html>");

        let _ = c.install(&response(400, &[], "short"), "plugin.git=");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_diagnostics_not_written_on_success_or_when_disabled() {
        let dir = TempDir::new().unwrap();
        let enabled = ResponseClassifier::new(Diagnostics::new(true, dir.path()));
        enabled.install(&response(200, &[], "ok"), "").unwrap();
        assert!(!dir.path().join(DEBUG_LOG_FILE).exists());

        let disabled = ResponseClassifier::new(Diagnostics::new(false, dir.path()));
        let _ = disabled.install(&response(503, &[], "down"), "");
        assert!(!dir.path().join(DEBUG_LOG_FILE).exists());
    }

    #[test]
    fn test_diagnostics_write_failure_does_not_mask_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-dir");
        let c = ResponseClassifier::new(Diagnostics::new(true, &missing));

        let err = c
            .install(&response(400, &["boom"], "body"), "plugin.git=")
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
