//! 插件标识符解析
//!
//! 用户输入的插件标识符有两种形式：
//! - `name`：安装最新版本，由服务端解析
//! - `name@version`：安装指定版本，需要本地下载后上传
//!
//! 所有标识符在发出任何请求之前一次性解析完毕，格式错误直接拒绝

use std::fmt;
use std::str::FromStr;

use crate::error::JenkinsError;

/// 更新中心官方下载地址
pub const UPDATE_CENTER_DOWNLOAD_URL: &str = "http://updates.jenkins-ci.org/download/plugins";

/// 插件标识符
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginIdentifier {
    /// 未指定版本
    Unversioned(String),
    /// 指定版本
    Versioned(VersionedPlugin),
}

/// 指定版本的插件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedPlugin {
    pub name: String,
    pub version: String,
}

impl VersionedPlugin {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// 官方下载地址（未经镜像改写）
    pub fn download_url(&self) -> String {
        format!(
            "{}/{}/{}/{}.hpi",
            UPDATE_CENTER_DOWNLOAD_URL, self.name, self.version, self.name
        )
    }
}

impl fmt::Display for VersionedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl PluginIdentifier {
    pub fn name(&self) -> &str {
        match self {
            PluginIdentifier::Unversioned(name) => name,
            PluginIdentifier::Versioned(plugin) => &plugin.name,
        }
    }
}

impl FromStr for PluginIdentifier {
    type Err = JenkinsError;

    /// 解析单个标识符（调用方负责跳过空白标识符）
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        let invalid = || JenkinsError::InvalidIdentifier(raw.to_string());

        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        match token.split_once('@') {
            None => {
                if !is_path_safe(token) {
                    return Err(invalid());
                }
                Ok(PluginIdentifier::Unversioned(token.to_string()))
            }
            Some((name, version)) => {
                if name.is_empty()
                    || version.is_empty()
                    || version.contains('@')
                    || !is_path_safe(name)
                    || !is_path_safe(version)
                {
                    return Err(invalid());
                }
                Ok(PluginIdentifier::Versioned(VersionedPlugin::new(
                    name, version,
                )))
            }
        }
    }
}

/// 名称和版本会拼进下载路径和本地文件名，不能含路径分隔符或 `..`
fn is_path_safe(segment: &str) -> bool {
    !segment.contains(['/', '\\']) && !segment.contains("..")
}

/// 安装计划
///
/// 由一次 `install_plugin` 调用的全部标识符构建：
/// 未指定版本的插件合并为一次批量请求，指定版本的插件按输入顺序逐个处理
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub unversioned: Vec<String>,
    pub versioned: Vec<VersionedPlugin>,
}

impl InstallPlan {
    /// 解析标识符列表，空白标识符静默跳过，任一格式错误则整体失败
    pub fn resolve<S: AsRef<str>>(identifiers: &[S]) -> Result<Self, JenkinsError> {
        let mut plan = InstallPlan::default();

        for raw in identifiers {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                continue;
            }
            match raw.parse::<PluginIdentifier>()? {
                PluginIdentifier::Unversioned(name) => plan.unversioned.push(name),
                PluginIdentifier::Versioned(plugin) => plan.versioned.push(plugin),
            }
        }

        Ok(plan)
    }

    /// 批量安装查询串，没有未指定版本的插件时返回 None
    pub fn query(&self) -> Option<String> {
        if self.unversioned.is_empty() {
            return None;
        }

        Some(
            self.unversioned
                .iter()
                .map(|name| format!("plugin.{}=", urlencoding::encode(name)))
                .collect::<Vec<_>>()
                .join("&"),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.unversioned.is_empty() && self.versioned.is_empty()
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_parse_unversioned() {
        assert_eq!(
            "git".parse::<PluginIdentifier>().unwrap(),
            PluginIdentifier::Unversioned("git".to_string())
        );
        assert_eq!(
            "  git  ".parse::<PluginIdentifier>().unwrap().name(),
            "git"
        );
    }

    #[test]
    fn test_parse_versioned() {
        let parsed = "bar@1.2".parse::<PluginIdentifier>().unwrap();
        assert_eq!(
            parsed,
            PluginIdentifier::Versioned(VersionedPlugin::new("bar", "1.2"))
        );
        assert_eq!(parsed.name(), "bar");
    }

    #[test]
    fn test_parse_malformed() {
        for raw in ["git@", "@1.0", "a@b@c", "@", "my plugin", ""] {
            assert!(
                matches!(
                    raw.parse::<PluginIdentifier>(),
                    Err(JenkinsError::InvalidIdentifier(_))
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_path_components() {
        for raw in [
            "../victim@1.0",
            "a/b@1.0",
            "a\\b@1.0",
            "bar@../1.0",
            "bar@1/2",
            "../victim",
            "..",
            "a..b@1.0",
        ] {
            assert!(
                matches!(
                    raw.parse::<PluginIdentifier>(),
                    Err(JenkinsError::InvalidIdentifier(_))
                ),
                "{raw:?} should be rejected"
            );
        }
        assert!("maven-plugin@3.1.2".parse::<PluginIdentifier>().is_ok());
    }

    #[test]
    fn test_download_url() {
        assert_eq!(
            VersionedPlugin::new("bar", "1.2").download_url(),
            "http://updates.jenkins-ci.org/download/plugins/bar/1.2/bar.hpi"
        );
        assert_eq!(VersionedPlugin::new("bar", "1.2").to_string(), "bar@1.2");
    }

    #[test]
    fn test_resolve_partitions_in_order() {
        let plan = InstallPlan::resolve(&["foo", "bar@1.2", "", "baz", "  ", "qux@2.0"]).unwrap();
        assert_eq!(plan.unversioned, vec!["foo", "baz"]);
        assert_eq!(
            plan.versioned,
            vec![
                VersionedPlugin::new("bar", "1.2"),
                VersionedPlugin::new("qux", "2.0")
            ]
        );
        assert_eq!(plan.query().unwrap(), "plugin.foo=&plugin.baz=");
    }

    #[test]
    fn test_resolve_versioned_only_has_no_query() {
        let plan = InstallPlan::resolve(&["bar@1.2"]).unwrap();
        assert_eq!(plan.query(), None);
        assert!(!plan.is_empty());
    }

    #[test]
    fn test_resolve_empty() {
        let plan = InstallPlan::resolve::<&str>(&[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.query(), None);

        let blanks = InstallPlan::resolve(&["", " "]).unwrap();
        assert!(blanks.is_empty());
    }

    #[test]
    fn test_resolve_rejects_malformed_token() {
        let result = InstallPlan::resolve(&["foo", "bar@"]);
        assert!(matches!(result, Err(JenkinsError::InvalidIdentifier(t)) if t == "bar@"));
    }
}
