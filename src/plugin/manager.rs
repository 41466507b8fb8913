//! 插件管理器
//!
//! 插件安装流程的入口：
//! - install_plugin: 未指定版本的插件一次批量安装，指定版本的插件逐个下载后上传
//! - uninstall_plugin: 卸载插件
//! - upload: 上传本地插件文件
//! - check_update: 刷新更新中心
//! - get_plugins / get_available_plugins: 查询插件列表
//!
//! 整个流程是顺序执行的，遇到第一个失败立即返回

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::classifier::{Diagnostics, ResponseClassifier, StatusMessage};
use super::fetcher::ArtifactFetcher;
use super::identifier::{InstallPlan, VersionedPlugin};
use super::mirror::MirrorConfig;
use super::types::{AvailablePluginList, InstalledPluginList};
use super::upload::{UploadEncoder, UploadJob};
use crate::error::JenkinsResult;
use crate::http::{ApiRequest, ApiResponse, Transport};
use crate::progress::{NoopProgressCallback, ProgressCallback};

/// 更新中心刷新时的响应处理器
pub type CheckUpdateHandler<'a> = &'a (dyn Fn(&ApiResponse) + Send + Sync);

/// 插件管理器
pub struct PluginManager {
    transport: Arc<dyn Transport>,
    mirror: MirrorConfig,
    show_progress: bool,
    progress: Arc<dyn ProgressCallback>,
    debug: bool,
    work_dir: PathBuf,
}

impl PluginManager {
    /// 创建插件管理器，默认不使用镜像、不显示进度、不写调试文件，工作目录为当前目录
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            mirror: MirrorConfig::default(),
            show_progress: false,
            progress: Arc::new(NoopProgressCallback),
            debug: false,
            work_dir: PathBuf::from("."),
        }
    }

    /// 设置下载镜像
    pub fn with_mirror(mut self, mirror: MirrorConfig) -> Self {
        self.mirror = mirror;
        self
    }

    /// 开启进度显示
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.show_progress = true;
        self.progress = progress;
        self
    }

    /// 失败时写入调试文件
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 设置工作目录（临时插件文件、调试文件所在目录）
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn classifier(&self) -> ResponseClassifier {
        ResponseClassifier::new(Diagnostics::new(self.debug, &self.work_dir))
    }

    /// 安装插件
    ///
    /// 所有标识符先全部解析，格式错误时不会发出任何请求。
    /// 批量安装失败时不再处理指定版本的插件；指定版本的插件按输入顺序逐个安装，
    /// 遇到第一个失败即返回
    pub async fn install_plugin<S: AsRef<str>>(&self, identifiers: &[S]) -> JenkinsResult<()> {
        let plan = InstallPlan::resolve(identifiers)?;

        if let Some(query) = plan.query() {
            self.install_without_version(&query).await?;
        }

        for plugin in &plan.versioned {
            self.install_with_version(plugin).await?;
        }
        Ok(())
    }

    async fn install_without_version(&self, query: &str) -> JenkinsResult<()> {
        info!("批量安装插件: {}", query);
        let response = self
            .transport
            .send(ApiRequest::post(format!("/pluginManager/install?{}", query)))
            .await?;
        self.classifier().install(&response, query)
    }

    async fn install_with_version(&self, plugin: &VersionedPlugin) -> JenkinsResult<()> {
        info!("安装指定版本插件: {}", plugin);
        let url = self.mirror.resolve(&plugin.download_url());

        let fetcher = ArtifactFetcher::new(self.transport.clone(), self.work_dir.clone());
        let progress: Option<&dyn ProgressCallback> =
            self.show_progress.then_some(&*self.progress);
        let scratch = fetcher.fetch(&url, &plugin.name, progress).await?;

        self.upload(scratch.path()).await
    }

    /// 卸载插件
    pub async fn uninstall_plugin(&self, name: &str) -> JenkinsResult<()> {
        info!("卸载插件: {}", name);
        let api = format!(
            "/pluginManager/plugin/{}/doUninstall",
            urlencoding::encode(name)
        );
        let response = self.transport.send(ApiRequest::post(api)).await?;
        self.classifier()
            .expect_ok(&response, StatusMessage::Unexpected)
    }

    /// 上传本地插件文件
    pub async fn upload(&self, local_path: &Path) -> JenkinsResult<()> {
        let job = UploadJob::plugin(local_path).with_progress(self.show_progress);
        let encoded = UploadEncoder::new()
            .encode(&job, self.progress.clone())
            .await?;
        info!("上传插件: {:?} ({} bytes)", local_path, encoded.file_size);

        let response = self.transport.send(encoded.request).await?;
        self.classifier().expect_ok(&response, StatusMessage::Upload)
    }

    /// 刷新更新中心
    ///
    /// 请求成功发出后把原始响应交给处理器，处理器为 None 时不做任何事
    pub async fn check_update(&self, handler: Option<CheckUpdateHandler<'_>>) -> JenkinsResult<()> {
        let response = self
            .transport
            .send(ApiRequest::post("/pluginManager/checkUpdatesServer"))
            .await?;

        if let Some(handle) = handler {
            handle(&response);
        }
        Ok(())
    }

    /// 已安装插件列表
    ///
    /// depth 小于 2 时按 1 处理；depth 越大返回的依赖、版本信息越完整
    pub async fn get_plugins(&self, depth: u32) -> JenkinsResult<InstalledPluginList> {
        let depth = depth.max(1);
        let response = self
            .transport
            .send(ApiRequest::get(format!(
                "/pluginManager/api/json?depth={}",
                depth
            )))
            .await?;

        self.classifier()
            .expect_ok(&response, StatusMessage::Unexpected)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// 可用插件列表
    pub async fn get_available_plugins(&self) -> JenkinsResult<AvailablePluginList> {
        let response = self
            .transport
            .send(ApiRequest::get("/pluginManager/plugins"))
            .await?;

        self.classifier()
            .expect_ok(&response, StatusMessage::Unexpected)?;
        Ok(serde_json::from_slice(&response.body)?)
    }
}
