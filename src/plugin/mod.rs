//! 插件管理模块
//!
//! 通过 Jenkins 插件管理器 API 管理插件：
//! - 批量安装最新版本插件
//! - 下载指定版本插件（支持镜像）后上传安装
//! - 卸载、上传、刷新更新中心
//! - 查询已安装和可用插件

mod classifier;
mod fetcher;
mod identifier;
mod manager;
mod mirror;
mod types;
mod upload;

pub use classifier::{Diagnostics, ResponseClassifier, StatusMessage, DEBUG_LOG_FILE, ERROR_HEADER};
pub use fetcher::{ArtifactFetcher, ScratchFile};
pub use identifier::{InstallPlan, PluginIdentifier, VersionedPlugin, UPDATE_CENTER_DOWNLOAD_URL};
pub use manager::{CheckUpdateHandler, PluginManager};
pub use mirror::MirrorConfig;
pub use types::{
    AvailablePlugin, AvailablePluginList, InstalledPlugin, InstalledPluginList, Plugin,
    PluginDependency,
};
pub use upload::{
    EncodedUpload, MultipartFraming, UploadEncoder, UploadJob, UPLOAD_FIELD_NAME,
    UPLOAD_PLUGIN_API,
};
