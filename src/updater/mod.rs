//! 仓库更新与依赖安装。
//!
//! 更新走 git：校正 remote、处理本地脏改动、切换跟踪分支、拉取。
//! 依赖安装走虚拟环境 pip，优先清华镜像，全部失败再回落官方源。

use anyhow::{bail, Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::Paths;
use crate::services::{ServiceDescriptor, ServiceKind};
use crate::util::{run_capture, CmdOutput};
use crate::wizard::editor::Prompter;

/// pip 首选镜像源。
pub const PIP_MIRROR: &str = "https://pypi.tuna.tsinghua.edu.cn/simple";

/// 定位 git 可执行文件：PATH 优先，再试几个常见安装位置。
pub fn find_git() -> Result<PathBuf> {
    if let Ok(path) = which::which("git") {
        return Ok(path);
    }
    for candidate in ["/usr/bin/git", "/usr/local/bin/git", "/bin/git"] {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }
    bail!("找不到 git，请先安装 git 再使用更新功能")
}

fn git_in(git: &Path, dir: &Path, args: &[&str]) -> Result<CmdOutput> {
    let mut cmd = Command::new(git);
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0");
    debug!("git {}", args.join(" "));
    run_capture(&mut cmd)
}

/// 把一个服务的仓库同步到远端分支。
///
/// 服务没有配置仓库时视为无事可做，返回 `Ok(true)`；
/// 仓库目录缺失或任何 git 步骤失败返回 `Ok(false)`，错误原样打印。
pub fn sync(
    desc: &ServiceDescriptor,
    base_dir: &Path,
    prompter: &mut dyn Prompter,
) -> Result<bool> {
    let Some(repo_url) = desc.repo_url else {
        println!("{}", style(format!("{} 不是 git 仓库管理的服务，跳过", desc.name)).yellow());
        return Ok(true);
    };
    let branch = desc.branch.context("服务缺少分支配置")?;
    let dir = desc.path(base_dir);
    if !dir.join(".git").exists() {
        println!(
            "{}",
            style(format!("{} 的仓库不存在: {}", desc.name, dir.display())).red()
        );
        return Ok(false);
    }

    let git = find_git()?;
    println!("{}", style(format!("正在更新 {}...", desc.name)).blue());

    // 远端地址可能被用户改过，先校正回来
    let out = git_in(&git, &dir, &["remote", "set-url", "origin", repo_url])?;
    if !out.success {
        println!("{}", style(format!("设置远端地址失败: {}", out.stderr.trim())).red());
        return Ok(false);
    }

    let status = git_in(&git, &dir, &["status", "--porcelain"])?;
    if !status.stdout.trim().is_empty() {
        println!("{}", style("检测到本地有未提交的修改:").yellow());
        println!("{}", status.stdout.trim_end());
        if !prompter.confirm("是否丢弃这些本地修改并继续更新?", false)? {
            println!("{}", style("已取消更新，本地修改保持原样").yellow());
            return Ok(false);
        }
        let reset = git_in(&git, &dir, &["reset", "--hard"])?;
        if !reset.success {
            println!("{}", style(format!("丢弃本地修改失败: {}", reset.stderr.trim())).red());
            return Ok(false);
        }
    }

    let fetch = git_in(&git, &dir, &["fetch", "origin"])?;
    if !fetch.success {
        println!("{}", style(format!("获取远端更新失败: {}", fetch.stderr.trim())).red());
        return Ok(false);
    }

    let current = git_in(&git, &dir, &["branch", "--show-current"])?;
    if current.stdout.trim() != branch {
        let checkout = git_in(&git, &dir, &["checkout", branch])?;
        if !checkout.success {
            // 本地没有这个分支，建一个跟踪远端的
            let track = git_in(
                &git,
                &dir,
                &["checkout", "-b", branch, &format!("origin/{branch}")],
            )?;
            if !track.success {
                println!(
                    "{}",
                    style(format!("切换到分支 {branch} 失败: {}", track.stderr.trim())).red()
                );
                return Ok(false);
            }
        }
    }

    let pull = git_in(&git, &dir, &["pull", "origin", branch])?;
    if !pull.success {
        println!("{}", style(format!("拉取更新失败: {}", pull.stderr.trim())).red());
        return Ok(false);
    }
    println!("{}", pull.stdout.trim_end());
    println!("{}", style(format!("✅ {} 更新完成", desc.name)).green());
    Ok(true)
}

/// 查看一个服务落后远端多少提交，不做任何改动。
pub fn check_status(desc: &ServiceDescriptor, base_dir: &Path) -> Result<()> {
    if desc.repo_url.is_none() {
        println!("{}", style(format!("{} 不是 git 仓库管理的服务", desc.name)).yellow());
        return Ok(());
    }
    let branch = desc.branch.context("服务缺少分支配置")?;
    let dir = desc.path(base_dir);
    if !dir.join(".git").exists() {
        println!(
            "{}",
            style(format!("{} 的仓库不存在: {}", desc.name, dir.display())).red()
        );
        return Ok(());
    }

    let git = find_git()?;
    println!("{}", style(format!("检查 {} 的更新...", desc.name)).blue());

    let fetch = git_in(&git, &dir, &["fetch", "origin"])?;
    if !fetch.success {
        println!("{}", style(format!("获取远端信息失败: {}", fetch.stderr.trim())).red());
        return Ok(());
    }

    let log = git_in(
        &git,
        &dir,
        &["log", &format!("HEAD..origin/{branch}"), "--oneline"],
    )?;
    let pending = log.stdout.trim();
    if pending.is_empty() {
        println!("{}", style(format!("{} 已是最新", desc.name)).green());
    } else {
        let count = pending.lines().count();
        println!(
            "{}",
            style(format!("{} 落后远端 {count} 个提交:", desc.name)).yellow()
        );
        println!("{pending}");
    }
    Ok(())
}

/// 依赖安装的候选命令，按顺序尝试，成功即止。
///
/// 前几条走镜像源，最后一条回落官方源。
pub fn pip_install_commands(python: &Path, requirements: &Path) -> Vec<Vec<String>> {
    let base = |extra: &[&str]| -> Vec<String> {
        let mut cmd = vec![
            python.display().to_string(),
            "-m".into(),
            "pip".into(),
            "install".into(),
            "-r".into(),
            requirements.display().to_string(),
        ];
        cmd.extend(extra.iter().map(|s| (*s).to_string()));
        cmd
    };
    vec![
        base(&["-i", PIP_MIRROR]),
        base(&["-i", PIP_MIRROR, "--user"]),
        base(&["-i", PIP_MIRROR, "--force-reinstall"]),
        base(&["-i", PIP_MIRROR, "--no-cache-dir"]),
        base(&[]),
    ]
}

/// 为一个 Python 服务安装依赖。没有 requirements.txt 时静默跳过。
pub fn install_dependencies(desc: &ServiceDescriptor, paths: &Paths) -> Result<bool> {
    if desc.kind != ServiceKind::Python {
        return Ok(true);
    }
    let requirements = desc.path(&paths.base_dir).join("requirements.txt");
    if !requirements.exists() {
        println!(
            "{}",
            style(format!("{} 没有 requirements.txt，跳过", desc.name)).yellow()
        );
        return Ok(true);
    }
    if !paths.venv_python.exists() {
        println!(
            "{}",
            style(format!("虚拟环境不存在: {}", paths.venv_python.display())).red()
        );
        return Ok(false);
    }

    println!("{}", style(format!("正在为 {} 安装依赖...", desc.name)).blue());
    let candidates = pip_install_commands(&paths.venv_python, &requirements);
    for argv in &candidates {
        let (program, args) = argv
            .split_first()
            .context("依赖安装命令为空")?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        if crate::util::run_streamed(&mut cmd)? {
            println!("{}", style(format!("✅ {} 依赖安装完成", desc.name)).green());
            return Ok(true);
        }
        println!("{}", style("安装失败，尝试下一个源...").yellow());
    }
    println!("{}", style(format!("{} 依赖安装失败，所有源都不可用", desc.name)).red());
    println!("你可以稍后手动执行以下命令之一:");
    for argv in &candidates {
        println!("  {}", argv.join(" "));
    }
    Ok(false)
}

/// 依次更新所有配置了仓库的服务，更新成功后重装依赖。
pub fn update_all(paths: &Paths, prompter: &mut dyn Prompter) -> Result<()> {
    for desc in crate::services::all_services() {
        if desc.repo_url.is_none() {
            continue;
        }
        if sync(desc, &paths.base_dir, prompter)? {
            install_dependencies(desc, paths)?;
        } else {
            println!("{}", style(format!("{} 更新未完成，继续下一个", desc.name)).yellow());
        }
        println!();
    }
    Ok(())
}
