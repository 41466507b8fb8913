//! 传输进度
//!
//! 定义下载/上传过程中的进度类型、回调 trait，以及终端进度条实现

use bytes::Bytes;
use futures::Stream;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// 传输阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStage {
    /// 下载中
    Downloading,
    /// 上传中
    Uploading,
}

impl std::fmt::Display for TransferStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStage::Downloading => write!(f, "Downloading"),
            TransferStage::Uploading => write!(f, "Uploading"),
        }
    }
}

/// 传输进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// 当前阶段
    pub stage: TransferStage,
    /// 传输对象（插件名或文件名）
    pub name: String,
    /// 已传输字节数
    pub transferred: u64,
    /// 总字节数，0 表示未知
    pub total: u64,
}

impl TransferProgress {
    pub fn new(stage: TransferStage, name: impl Into<String>, transferred: u64, total: u64) -> Self {
        Self {
            stage,
            name: name.into(),
            transferred,
            total,
        }
    }

    /// 进度百分比 (0-100)，总量未知时返回 None
    pub fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let percent = self.transferred as f64 / self.total as f64 * 100.0;
        Some(percent.min(100.0) as u8)
    }

    /// 是否已完成（总量未知时无法判断）
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.transferred >= self.total
    }
}

/// 进度回调 trait
pub trait ProgressCallback: Send + Sync {
    /// 进度更新回调
    fn on_progress(&self, progress: &TransferProgress);
}

/// 空进度回调实现
pub struct NoopProgressCallback;

impl ProgressCallback for NoopProgressCallback {
    fn on_progress(&self, _progress: &TransferProgress) {}
}

/// 函数进度回调实现
///
/// 将闭包包装为 ProgressCallback
pub struct FnProgressCallback<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    callback: F,
}

impl<F> FnProgressCallback<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressCallback for FnProgressCallback<F>
where
    F: Fn(&TransferProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &TransferProgress) {
        (self.callback)(progress);
    }
}

/// 终端进度条
///
/// 在 stderr 上原地刷新一行进度，总量未知时只显示已传输字节数
pub struct TerminalProgress {
    width: usize,
    /// 上次渲染的 (阶段, 名称, 百分比)，用于避免重复刷新
    last: Mutex<Option<(TransferStage, String, Option<u8>)>>,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self {
            width: 30,
            last: Mutex::new(None),
        }
    }
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// 渲染一行进度
    pub fn render(&self, progress: &TransferProgress) -> String {
        match progress.percent() {
            Some(percent) => {
                let filled = self.width * percent as usize / 100;
                let bar: String = "=".repeat(filled) + &" ".repeat(self.width - filled);
                format!(
                    "{} {} [{}] {:>3}% ({}/{} bytes)",
                    progress.stage, progress.name, bar, percent, progress.transferred, progress.total
                )
            }
            None => format!(
                "{} {} {} bytes",
                progress.stage, progress.name, progress.transferred
            ),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, progress: &TransferProgress) {
        let key = (progress.stage, progress.name.clone(), progress.percent());
        {
            let mut last = self.last.lock();
            // 总量已知时按百分比节流
            if key.2.is_some() && last.as_ref() == Some(&key) {
                return;
            }
            *last = Some(key);
        }

        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", self.render(progress));
        if progress.is_complete() {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// 带进度观察的字节流包装器
///
/// 按内部流产出的字节数更新进度，不修改任何字节
pub struct ProgressStream<S> {
    inner: S,
    progress: TransferProgress,
    callback: Arc<dyn ProgressCallback>,
}

impl<S> ProgressStream<S> {
    pub fn new(
        inner: S,
        stage: TransferStage,
        name: impl Into<String>,
        total: u64,
        callback: Arc<dyn ProgressCallback>,
    ) -> Self {
        Self {
            inner,
            progress: TransferProgress::new(stage, name, 0, total),
            callback,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = Result<Bytes, std::io::Error>> + Unpin,
{
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            let len = chunk.len() as u64;
            let this = &mut *self;
            this.progress.transferred += len;
            this.callback.on_progress(&this.progress);
        }
        polled
    }
}
