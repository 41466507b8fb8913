//! 配置管理
//!
//! 配置文件默认位于 `~/.jenkins-cli.yaml`，保存 Jenkins 列表、当前选中的 Jenkins
//! 以及插件下载镜像列表

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{JenkinsError, JenkinsResult};
use crate::plugin::MirrorConfig;

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = ".jenkins-cli.yaml";

/// 默认镜像名称
pub const DEFAULT_MIRROR: &str = "default";

/// Jenkins 服务配置
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JenkinsServer {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub description: String,
}

/// 插件下载镜像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsMirror {
    pub name: String,
    pub url: String,
}

impl JenkinsMirror {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// 内置镜像
///
/// 镜像改写只替换协议、主机和端口，只有在站点根路径下提供
/// `/download/plugins/...` 的镜像才能放在这里
fn default_mirrors() -> Vec<JenkinsMirror> {
    vec![JenkinsMirror::new(DEFAULT_MIRROR, "https://updates.jenkins.io/")]
}

/// 配置文件内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// 当前使用的 Jenkins 名称
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub jenkins_servers: Vec<JenkinsServer>,
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<JenkinsMirror>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current: String::new(),
            jenkins_servers: Vec::new(),
            mirrors: default_mirrors(),
        }
    }
}

impl Config {
    /// 默认配置文件路径
    pub fn default_path() -> JenkinsResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| JenkinsError::Config("cannot find home directory".to_string()))
    }

    /// 读取配置，文件不存在时返回默认配置
    pub fn load(path: &Path) -> JenkinsResult<Self> {
        if !path.exists() {
            debug!("配置文件不存在，使用默认配置: {:?}", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| JenkinsError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// 写回配置文件
    pub fn save(&self, path: &Path) -> JenkinsResult<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| JenkinsError::Config(format!("cannot serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        info!("配置已保存: {:?}", path);
        Ok(())
    }

    pub fn find_jenkins_by_name(&self, name: &str) -> Option<&JenkinsServer> {
        self.jenkins_servers.iter().find(|s| s.name == name)
    }

    /// 当前选中的 Jenkins
    pub fn current_jenkins(&self) -> Option<&JenkinsServer> {
        self.find_jenkins_by_name(&self.current)
    }

    /// 添加 Jenkins
    ///
    /// 名称不能为空且不能重复；第一个添加的 Jenkins 自动成为当前 Jenkins
    pub fn add_jenkins(&mut self, server: JenkinsServer) -> JenkinsResult<()> {
        if server.name.is_empty() {
            return Err(JenkinsError::Config("Name cannot be empty".to_string()));
        }

        if self.find_jenkins_by_name(&server.name).is_some() {
            return Err(JenkinsError::Config(format!(
                "Jenkins {} is existed",
                server.name
            )));
        }

        if self.current.is_empty() {
            self.current = server.name.clone();
        }
        self.jenkins_servers.push(server);
        Ok(())
    }

    /// 删除 Jenkins，不允许删除当前 Jenkins
    pub fn remove_jenkins(&mut self, name: &str) -> JenkinsResult<()> {
        if name == self.current {
            return Err(JenkinsError::Config(
                "You cannot remove current Jenkins, if you want to remove it, can select other items before"
                    .to_string(),
            ));
        }

        let index = self
            .jenkins_servers
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| JenkinsError::Config(format!("Cannot found by name {}", name)))?;

        self.jenkins_servers.remove(index);
        Ok(())
    }

    /// 切换当前 Jenkins
    pub fn select(&mut self, name: &str) -> JenkinsResult<()> {
        if self.find_jenkins_by_name(name).is_none() {
            return Err(JenkinsError::Config(format!("Cannot found by name {}", name)));
        }
        self.current = name.to_string();
        Ok(())
    }

    pub fn find_mirror(&self, name: &str) -> Option<&JenkinsMirror> {
        self.mirrors.iter().find(|m| m.name == name)
    }

    /// 按名称构建镜像配置
    ///
    /// 找不到镜像时返回空地址，镜像解析会退回官方地址
    pub fn mirror_config(&self, name: &str, use_mirror: bool) -> MirrorConfig {
        let mirror_url = self
            .find_mirror(name)
            .map(|m| m.url.clone())
            .unwrap_or_default();
        MirrorConfig {
            use_mirror,
            mirror_url,
        }
    }
}
