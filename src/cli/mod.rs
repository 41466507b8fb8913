//! 命令行入口
//!
//! - `jcli plugin ...`: 插件管理
//! - `jcli config ...`: Jenkins 配置管理

mod config_cmd;
mod plugin_cmd;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

use crate::config::Config;

pub use config_cmd::ConfigCommand;
pub use plugin_cmd::PluginCommand;

/// Jenkins CLI
#[derive(Parser, Debug)]
#[command(name = "jcli")]
#[command(version, about = "Manage Jenkins plugins and server profiles")]
#[command(after_help = "Use 'jcli <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    /// Configuration file path (defaults to ~/.jenkins-cli.yaml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write the body of failed responses into debug.html
    #[arg(long, global = true)]
    pub debug: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the plugins of the current Jenkins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },

    /// Manage Jenkins server profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

impl Cli {
    /// 配置文件路径
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::default_path()?),
        }
    }
}

/// 执行命令
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path()?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Plugin { command } => {
            let config = Config::load(&config_path)?;
            plugin_cmd::execute(command, &config, cli.debug, &mut stdout).await
        }
        Commands::Config { command } => config_cmd::execute(command, &config_path, &mut stdout),
    }
}

/// 记录命令失败并返回进程退出码
pub fn report<W: Write>(result: Result<()>, err_out: &mut W) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            let _ = writeln!(err_out, "Error: {}", e);
            1
        }
    }
}
