//! jcli: Jenkins 命令行工具
//!
//! 通过 Jenkins 插件管理器 API 安装、卸载、上传、查询插件，
//! 并管理本地的 Jenkins 服务配置

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod plugin;
pub mod progress;

pub use error::{JenkinsError, JenkinsResult};
