//! Jenkins 配置命令

use anyhow::Result;
use clap::Subcommand;
use std::io::Write;
use std::path::Path;

use crate::config::{Config, JenkinsServer};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Add a Jenkins server
    Add {
        /// Name of the Jenkins
        #[arg(short, long)]
        name: String,

        /// URL of the Jenkins
        #[arg(long)]
        url: String,

        /// Login user
        #[arg(short, long, default_value = "")]
        username: String,

        /// API token of the user
        #[arg(short, long, default_value = "")]
        token: String,

        /// Description of the Jenkins
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Remove a Jenkins server
    Remove {
        name: String,
    },

    /// List all Jenkins servers
    List,

    /// Select the current Jenkins server
    Select {
        name: String,
    },
}

/// 执行配置命令，修改类命令执行成功后写回配置文件
pub fn execute<W: Write>(command: ConfigCommand, path: &Path, out: &mut W) -> Result<()> {
    let mut config = Config::load(path)?;

    match command {
        ConfigCommand::Add {
            name,
            url,
            username,
            token,
            description,
        } => {
            config.add_jenkins(JenkinsServer {
                name,
                url,
                username,
                token,
                description,
            })?;
            config.save(path)?;
        }
        ConfigCommand::Remove { name } => {
            config.remove_jenkins(&name)?;
            config.save(path)?;
        }
        ConfigCommand::Select { name } => {
            config.select(&name)?;
            config.save(path)?;
        }
        ConfigCommand::List => {
            for server in &config.jenkins_servers {
                let marker = if server.name == config.current { "*" } else { " " };
                writeln!(
                    out,
                    "{} {:<20} {:<40} {}",
                    marker, server.name, server.url, server.description
                )?;
            }
        }
    }
    Ok(())
}
