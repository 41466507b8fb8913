//! 插件管理命令
//!
//! 针对当前选中的 Jenkins 执行插件安装、卸载、上传、查询

use anyhow::{anyhow, Result};
use clap::Subcommand;
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, DEFAULT_MIRROR};
use crate::http::{ApiResponse, HttpClientFactory};
use crate::plugin::{InstalledPlugin, PluginManager};
use crate::progress::TerminalProgress;

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Install plugins, use `name@version` to pin a version
    Install {
        #[arg(required = true, value_name = "PLUGIN")]
        plugins: Vec<String>,

        /// Mirror used to download pinned versions
        #[arg(long, default_value = DEFAULT_MIRROR)]
        mirror: String,

        /// Download pinned versions from the mirror
        #[arg(long)]
        use_mirror: bool,

        /// Show transfer progress
        #[arg(long)]
        show_progress: bool,
    },

    /// Uninstall a plugin
    Uninstall {
        /// Plugin short name
        name: String,
    },

    /// Upload a local .hpi file
    Upload {
        file: PathBuf,

        /// Show transfer progress
        #[arg(long)]
        show_progress: bool,
    },

    /// Refresh the update center
    Check,

    /// List installed plugins
    List {
        /// Depth of the plugin manager API
        #[arg(long, default_value_t = 1)]
        depth: u32,

        /// Only show plugins whose name contains the text
        #[arg(long)]
        filter: Option<String>,

        /// Only show plugins that have an update
        #[arg(long)]
        updatable: bool,
    },

    /// Search available plugins
    Search {
        keyword: String,
    },
}

/// 针对当前 Jenkins 执行插件命令
pub async fn execute<W: Write>(
    command: PluginCommand,
    config: &Config,
    debug: bool,
    out: &mut W,
) -> Result<()> {
    let server = config
        .current_jenkins()
        .ok_or_else(|| anyhow!("no Jenkins selected, add one with 'jcli config add'"))?;
    debug!("当前 Jenkins: {} ({})", server.name, server.url);

    let transport = HttpClientFactory::new().create_transport(server)?;
    let manager = PluginManager::new(Arc::new(transport)).with_debug(debug);
    let manager = configure(manager, &command, config);

    dispatch(&manager, command, out).await
}

/// 按命令参数补充镜像、进度设置
fn configure(manager: PluginManager, command: &PluginCommand, config: &Config) -> PluginManager {
    match command {
        PluginCommand::Install {
            mirror,
            use_mirror,
            show_progress,
            ..
        } => {
            let manager = manager.with_mirror(config.mirror_config(mirror, *use_mirror));
            with_terminal_progress(manager, *show_progress)
        }
        PluginCommand::Upload { show_progress, .. } => {
            with_terminal_progress(manager, *show_progress)
        }
        _ => manager,
    }
}

fn with_terminal_progress(manager: PluginManager, show_progress: bool) -> PluginManager {
    if show_progress {
        manager.with_progress(Arc::new(TerminalProgress::new()))
    } else {
        manager
    }
}

async fn dispatch<W: Write>(
    manager: &PluginManager,
    command: PluginCommand,
    out: &mut W,
) -> Result<()> {
    match command {
        PluginCommand::Install { plugins, .. } => {
            manager.install_plugin(&plugins).await?;
            writeln!(out, "installed: {}", plugins.join(" "))?;
        }
        PluginCommand::Uninstall { name } => {
            manager.uninstall_plugin(&name).await?;
            writeln!(out, "uninstalled: {}", name)?;
        }
        PluginCommand::Upload { file, .. } => {
            manager.upload(&file).await?;
            writeln!(out, "uploaded: {}", file.display())?;
        }
        PluginCommand::Check => {
            let status = Mutex::new(None);
            let handler = |response: &ApiResponse| *status.lock() = Some(response.status);
            manager.check_update(Some(&handler)).await?;

            match status.into_inner() {
                Some(200) => writeln!(out, "update center refreshed")?,
                Some(code) => writeln!(out, "update center responded with status code {}", code)?,
                None => {}
            }
        }
        PluginCommand::List {
            depth,
            filter,
            updatable,
        } => {
            let list = manager.get_plugins(depth).await?;
            let mut plugins: Vec<&InstalledPlugin> = match &filter {
                Some(keyword) => list.filter(keyword),
                None => list.plugins.iter().collect(),
            };
            if updatable {
                let candidates = list.updatable();
                plugins.retain(|p| candidates.iter().any(|c| std::ptr::eq(*c, *p)));
            }
            for plugin in plugins {
                writeln!(
                    out,
                    "{:<40} {:<16} {}",
                    plugin.short_name,
                    plugin.version,
                    if plugin.has_update { "update available" } else { "" }
                )?;
            }
        }
        PluginCommand::Search { keyword } => {
            let list = manager.get_available_plugins().await?;
            for plugin in list.search(&keyword) {
                writeln!(
                    out,
                    "{:<40} {:<10} {}",
                    plugin.name,
                    if plugin.installed { "installed" } else { "" },
                    plugin.title
                )?;
            }
        }
    }
    Ok(())
}
