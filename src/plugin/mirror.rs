//! 下载镜像解析
//!
//! 将更新中心的官方下载地址改写到镜像站点，只替换协议、主机和端口，
//! 路径与查询参数保持不变。镜像配置有误时退回官方地址，不报错

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// 镜像配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub use_mirror: bool,
    pub mirror_url: String,
}

impl MirrorConfig {
    pub fn new(mirror_url: impl Into<String>) -> Self {
        Self {
            use_mirror: true,
            mirror_url: mirror_url.into(),
        }
    }

    /// 是否需要改写
    pub fn is_active(&self) -> bool {
        self.use_mirror && !self.mirror_url.trim().is_empty()
    }

    /// 解析实际下载地址
    pub fn resolve(&self, canonical: &str) -> String {
        if !self.is_active() {
            return canonical.to_string();
        }

        match rewrite_origin(canonical, self.mirror_url.trim()) {
            Some(url) => url,
            None => {
                warn!(
                    "镜像地址无效，使用官方地址: mirror={}, url={}",
                    self.mirror_url, canonical
                );
                canonical.to_string()
            }
        }
    }
}

fn rewrite_origin(canonical: &str, mirror: &str) -> Option<String> {
    let mirror = Url::parse(mirror).ok()?;
    if !matches!(mirror.scheme(), "http" | "https") {
        return None;
    }
    let host = mirror.host_str()?;

    let mut target = Url::parse(canonical).ok()?;
    target.set_scheme(mirror.scheme()).ok()?;
    target.set_host(Some(host)).ok()?;
    target.set_port(mirror.port()).ok()?;
    Some(target.to_string())
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    const CANONICAL: &str = "http://updates.jenkins-ci.org/download/plugins/bar/1.2/bar.hpi";

    #[test]
    fn test_disabled_is_noop() {
        let config = MirrorConfig {
            use_mirror: false,
            mirror_url: "https://mirror.example.com".to_string(),
        };
        assert_eq!(config.resolve(CANONICAL), CANONICAL);
    }

    #[test]
    fn test_empty_mirror_is_noop() {
        assert_eq!(MirrorConfig::new("").resolve(CANONICAL), CANONICAL);
        assert_eq!(MirrorConfig::new("   ").resolve(CANONICAL), CANONICAL);
    }

    #[test]
    fn test_rewrite_origin() {
        assert_eq!(
            MirrorConfig::new("https://mirrors.example.com").resolve(CANONICAL),
            "https://mirrors.example.com/download/plugins/bar/1.2/bar.hpi"
        );
        assert_eq!(
            MirrorConfig::new("http://127.0.0.1:9000/").resolve(CANONICAL),
            "http://127.0.0.1:9000/download/plugins/bar/1.2/bar.hpi"
        );
    }

    #[test]
    fn test_mirror_path_is_ignored() {
        assert_eq!(
            MirrorConfig::new("https://mirror.example.com/jenkins/").resolve(CANONICAL),
            "https://mirror.example.com/download/plugins/bar/1.2/bar.hpi"
        );
    }

    #[test]
    fn test_query_preserved() {
        let canonical = "http://updates.jenkins-ci.org/download/plugins/bar/1.2/bar.hpi?a=1&b=2";
        assert_eq!(
            MirrorConfig::new("https://m.example.com").resolve(canonical),
            "https://m.example.com/download/plugins/bar/1.2/bar.hpi?a=1&b=2"
        );
    }

    #[test]
    fn test_malformed_mirror_degrades_to_canonical() {
        for mirror in ["not a url", "ftp://mirror.example.com", "mailto:a@b.c", "file:///tmp"] {
            assert_eq!(MirrorConfig::new(mirror).resolve(CANONICAL), CANONICAL, "{mirror}");
        }
    }

    #[test]
    fn test_malformed_canonical_is_returned_as_is() {
        assert_eq!(
            MirrorConfig::new("https://m.example.com").resolve("::not-a-url::"),
            "::not-a-url::"
        );
    }
}
