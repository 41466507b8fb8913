//! 插件包下载
//!
//! 将指定版本的插件包下载到工作目录下的 `<name>.hpi`，
//! 返回的 `ScratchFile` 在离开作用域时删除该文件

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{JenkinsError, JenkinsResult};
use crate::http::{ApiRequest, Transport};
use crate::progress::{ProgressCallback, TransferProgress, TransferStage};

/// 临时插件文件
///
/// 独占所指向的文件，Drop 时删除（成功、失败、提前返回都会执行）
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// 接管指定路径，文件可以尚未创建
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// 插件文件路径：`<dir>/<name>.hpi`
    pub fn for_plugin(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(format!("{}.hpi", name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("已删除临时文件 {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("删除临时文件失败 {:?}: {}", self.path, e),
        }
    }
}

/// 插件包下载器
pub struct ArtifactFetcher {
    transport: Arc<dyn Transport>,
    work_dir: PathBuf,
}

impl ArtifactFetcher {
    pub fn new(transport: Arc<dyn Transport>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            work_dir: work_dir.into(),
        }
    }

    /// 下载插件包（可选进度回调）
    ///
    /// 只尝试一次，不做重试；失败时已写入的部分文件同样会被删除
    pub async fn fetch(
        &self,
        url: &str,
        name: &str,
        progress: Option<&dyn ProgressCallback>,
    ) -> JenkinsResult<ScratchFile> {
        info!("开始下载: {} -> {}.hpi", url, name);

        let response = self.transport.send_streaming(ApiRequest::get(url)).await?;
        if !(200..300).contains(&response.status) {
            return Err(JenkinsError::rejected(
                response.status,
                format!("cannot download {}, status code: {}", url, response.status),
            ));
        }

        let total = response.content_length.unwrap_or(0);
        debug!("文件大小: {} bytes", total);

        let scratch = ScratchFile::for_plugin(&self.work_dir, name);
        let mut file = fs::File::create(scratch.path()).await?;

        let mut report = TransferProgress::new(TransferStage::Downloading, name, 0, total);
        let mut stream = response.body;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| JenkinsError::Transport(e.to_string()))?;
            file.write_all(&chunk).await?;
            report.transferred += chunk.len() as u64;
            if let Some(callback) = progress {
                callback.on_progress(&report);
            }
        }
        file.flush().await?;

        info!("下载完成: {:?} ({} bytes)", scratch.path(), report.transferred);
        Ok(scratch)
    }
}
