//! 插件数据类型
//!
//! Jenkins 插件管理器 JSON 响应的只读映射，只做反序列化，不在本地修改

use serde::{Deserialize, Deserializer, Serialize};

/// Jenkins 对缺省字段常返回 `null`，按默认值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 插件公共状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plugin {
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub bundled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub downgradable: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
}

/// 插件依赖
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginDependency {
    #[serde(deserialize_with = "null_as_default")]
    pub short_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub optional: bool,
}

/// 已安装插件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstalledPlugin {
    #[serde(flatten)]
    pub plugin: Plugin,

    #[serde(deserialize_with = "null_as_default")]
    pub short_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub long_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub has_update: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub pinned: bool,
    pub required_core_version: Option<String>,
    pub minimum_java_version: Option<String>,
    pub supports_dynamic_load: Option<String>,
    pub backup_version: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<PluginDependency>,
}

/// 已安装插件列表（`/pluginManager/api/json`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstalledPluginList {
    #[serde(deserialize_with = "null_as_default")]
    pub plugins: Vec<InstalledPlugin>,
}

impl InstalledPluginList {
    /// 按名称过滤（不区分大小写，匹配短名称或长名称）
    pub fn filter(&self, keyword: &str) -> Vec<&InstalledPlugin> {
        let keyword = keyword.to_lowercase();
        self.plugins
            .iter()
            .filter(|p| {
                p.short_name.to_lowercase().contains(&keyword)
                    || p.long_name.to_lowercase().contains(&keyword)
            })
            .collect()
    }

    /// 有更新的插件
    pub fn updatable(&self) -> Vec<&InstalledPlugin> {
        self.plugins.iter().filter(|p| p.has_update).collect()
    }
}

/// 可用插件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailablePlugin {
    #[serde(flatten)]
    pub plugin: Plugin,

    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub installed: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// 可用插件列表（`/pluginManager/plugins`）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailablePluginList {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<AvailablePlugin>,
}

impl AvailablePluginList {
    /// 按名称或标题搜索（不区分大小写）
    pub fn search(&self, keyword: &str) -> Vec<&AvailablePlugin> {
        let keyword = keyword.to_lowercase();
        self.data
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&keyword) || p.title.to_lowercase().contains(&keyword)
            })
            .collect()
    }
}
