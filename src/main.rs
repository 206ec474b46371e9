#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use,
    dead_code
)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::FmtSubscriber;

mod config;
mod launcher;
mod manager;
mod services;
mod updater;
mod util;
mod wizard;

use config::Paths;

/// `MoFox-Core` 一键管理程序。
#[derive(Parser, Debug)]
#[command(name = "onekey")]
#[command(author = "MoFox-Studio")]
#[command(version = "1.2.0")]
#[command(about = "MoFox-Bot 的启动、配置与更新入口。", long_about = None)]
struct Cli {
    /// 安装根目录（默认为可执行文件所在目录）
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行交互式配置向导（EULA、bot_config、model_config）
    Wizard,
    /// 更新所有 git 仓库管理的服务
    Update,
}

struct CompactTimer;

impl FormatTime for CompactTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(w, "{}", now.format("%Y%m%d %H:%M:%S"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_timer(CompactTimer)
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("初始化日志失败")?;

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_exe()
            .context("无法获取当前可执行文件路径")?
            .parent()
            .context("可执行文件没有父目录")?
            .to_path_buf(),
    };
    let paths = Paths::new(base_dir);

    match cli.command {
        None => manager::Manager::new(paths).run(),
        Some(Commands::Wizard) => wizard::run(&paths),
        Some(Commands::Update) => {
            let mut prompter = wizard::editor::ConsolePrompter;
            updater::update_all(&paths, &mut prompter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }
}
