//! 菜单式进程管理器。
//!
//! 单线程 REPL：清屏、画菜单、读一个编号、执行对应动作、回到菜单。
//! 动作出错只在菜单里用红字报告，不终止程序；读输入失败（Ctrl-C、
//! 输入流关闭）视为退出请求，先停掉所有已登记进程再返回。

use anyhow::Result;
use console::style;
use std::process::Command;
use tracing::info;

use crate::config::Paths;
use crate::launcher::{ProcessRegistry, ProcessState};
use crate::services::{self, ServiceDescriptor};
use crate::updater;
use crate::util::{clear_screen, run_capture};
use crate::wizard::{self, editor::ConsolePrompter, editor::Prompter};

/// 主菜单可触发的动作。编号到动作的映射见 [`action_for`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// 启动第 n 个服务组合。
    StartGroup(usize),
    /// 启动第 n 个单独服务。
    StartService(usize),
    ShowStatus,
    StopAll,
    UpdateRepos,
    InstallDeps,
    CheckUpdates,
    Wizard,
    SystemInfo,
    Exit,
}

/// 把用户输入的编号解析为菜单动作。
///
/// 编号布局：0 退出；1..=组合数 是组合；随后是单独服务；再往后是
/// 固定的管理功能。非数字或越界输入返回 `None`。
pub fn action_for(choice: &str) -> Option<MenuAction> {
    let n: usize = choice.trim().parse().ok()?;
    if n == 0 {
        return Some(MenuAction::Exit);
    }
    let group_count = services::all_groups().len();
    let service_count = services::all_services().len();
    if n <= group_count {
        return Some(MenuAction::StartGroup(n - 1));
    }
    let n = n - group_count;
    if n <= service_count {
        return Some(MenuAction::StartService(n - 1));
    }
    match n - service_count {
        1 => Some(MenuAction::ShowStatus),
        2 => Some(MenuAction::StopAll),
        3 => Some(MenuAction::UpdateRepos),
        4 => Some(MenuAction::InstallDeps),
        5 => Some(MenuAction::CheckUpdates),
        6 => Some(MenuAction::Wizard),
        7 => Some(MenuAction::SystemInfo),
        _ => None,
    }
}

pub struct Manager {
    paths: Paths,
    registry: ProcessRegistry,
}

impl Manager {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            registry: ProcessRegistry::new(),
        }
    }

    /// 管理器主循环。
    pub fn run(&mut self) -> Result<()> {
        if updater::find_git().is_err() {
            println!(
                "{}",
                style("警告: 未检测到 git，更新相关功能将不可用。").yellow()
            );
        }

        let mut prompter = ConsolePrompter;
        loop {
            clear_screen();
            self.print_menu();

            let choice = match prompter.input("请输入选项编号") {
                Ok(choice) => choice,
                Err(_) => {
                    // 输入流断开，收尾退出
                    println!();
                    info!("输入中断，正在退出");
                    self.registry.stop_all();
                    return Ok(());
                }
            };

            let Some(action) = action_for(&choice) else {
                println!("{}", style("无效选项，请重新输入。").yellow());
                pause(&mut prompter);
                continue;
            };

            if action == MenuAction::Exit {
                self.registry.stop_all();
                println!("{}", style("再见！").cyan());
                return Ok(());
            }

            if let Err(err) = self.dispatch(action, &mut prompter) {
                println!("{}", style(format!("操作失败: {err:#}")).red());
            }
            pause(&mut prompter);
        }
    }

    fn print_menu(&self) {
        println!("{}", style("=".repeat(50)).cyan());
        println!("{}", style("       MoFox-Core 一键管理程序").cyan().bold());
        println!("{}", style("=".repeat(50)).cyan());

        let mut index = 1;
        println!("{}", style("[启动组合]").bold());
        for group in services::all_groups() {
            println!("  {index}. {} - {}", group.name, group.description);
            index += 1;
        }
        println!("{}", style("[单独启动]").bold());
        for service in services::all_services() {
            println!("  {index}. {} - {}", service.name, service.description);
            index += 1;
        }
        println!("{}", style("[管理]").bold());
        for label in [
            "查看服务状态",
            "停止所有服务",
            "更新仓库",
            "安装/更新依赖",
            "检查更新状态",
            "配置向导",
            "系统信息",
        ] {
            println!("  {index}. {label}");
            index += 1;
        }
        println!("  0. 退出");
        println!("{}", style("=".repeat(50)).cyan());
    }

    fn dispatch(&mut self, action: MenuAction, prompter: &mut dyn Prompter) -> Result<()> {
        match action {
            MenuAction::StartGroup(i) => self.start_group(i),
            MenuAction::StartService(i) => self.start_service(i),
            MenuAction::ShowStatus => {
                self.show_status();
                Ok(())
            }
            MenuAction::StopAll => {
                self.registry.stop_all();
                Ok(())
            }
            MenuAction::UpdateRepos => self.update_repos(prompter),
            MenuAction::InstallDeps => self.install_deps(),
            MenuAction::CheckUpdates => self.check_updates(),
            MenuAction::Wizard => wizard::run(&self.paths),
            MenuAction::SystemInfo => {
                self.show_system_info();
                Ok(())
            }
            MenuAction::Exit => Ok(()),
        }
    }

    fn start_group(&mut self, index: usize) -> Result<()> {
        let Some(group) = services::all_groups().get(index) else {
            println!("{}", style("无效的组合编号").yellow());
            return Ok(());
        };
        println!("{}", style(format!("正在启动 {}...", group.name)).blue());
        for key in group.members {
            if let Some(desc) = services::find(key) {
                self.registry.launch(desc, &self.paths)?;
            }
        }
        Ok(())
    }

    fn start_service(&mut self, index: usize) -> Result<()> {
        let Some(desc) = services::all_services().get(index) else {
            println!("{}", style("无效的服务编号").yellow());
            return Ok(());
        };
        self.registry.launch(desc, &self.paths)?;
        Ok(())
    }

    fn show_status(&mut self) {
        println!("{}", style("服务状态:").bold());
        for desc in services::all_services() {
            let (icon, text) = match self.registry.poll(desc.key) {
                ProcessState::Running(pid) => ("🟢", format!("运行中 (PID: {pid})")),
                ProcessState::Exited => ("🔴", "已退出".to_string()),
                ProcessState::NotStarted => ("⚪", "未启动".to_string()),
            };
            println!("  {icon} {} - {text}", desc.name);
        }
    }

    /// 更新子菜单：选一个仓库或全部。
    fn update_repos(&mut self, prompter: &mut dyn Prompter) -> Result<()> {
        let targets: Vec<&'static ServiceDescriptor> = services::all_services()
            .iter()
            .filter(|s| s.repo_url.is_some())
            .collect();
        println!("{}", style("[更新仓库]").bold());
        for (i, desc) in targets.iter().enumerate() {
            println!("  {}. {}", i + 1, desc.name);
        }
        println!("  0. 全部更新");

        let choice = prompter.input("请选择要更新的仓库")?;
        let Ok(n) = choice.trim().parse::<usize>() else {
            println!("{}", style("无效选项").yellow());
            return Ok(());
        };
        if n == 0 {
            updater::update_all(&self.paths, prompter)?;
        } else if let Some(desc) = targets.get(n - 1) {
            updater::sync(desc, &self.paths.base_dir, prompter)?;
        } else {
            println!("{}", style("无效选项").yellow());
        }
        Ok(())
    }

    fn install_deps(&mut self) -> Result<()> {
        for desc in services::all_services() {
            updater::install_dependencies(desc, &self.paths)?;
        }
        Ok(())
    }

    fn check_updates(&mut self) -> Result<()> {
        for desc in services::all_services() {
            if desc.repo_url.is_some() {
                updater::check_status(desc, &self.paths.base_dir)?;
            }
        }
        Ok(())
    }

    fn show_system_info(&mut self) {
        println!("{}", style("系统信息:").bold());
        println!("  操作系统: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        println!("  安装目录: {}", self.paths.base_dir.display());
        if self.paths.venv_python.exists() {
            let version = run_capture(Command::new(&self.paths.venv_python).arg("--version"))
                .map(|out| out.stdout.trim().to_string())
                .unwrap_or_else(|_| "未知版本".to_string());
            println!("  虚拟环境: 已就绪 ({version})");
        } else {
            println!("  虚拟环境: 未找到");
        }
        println!("  服务目录:");
        for desc in services::all_services() {
            let mark = if desc.path(&self.paths.base_dir).exists() {
                "✅"
            } else {
                "❌"
            };
            println!("    {mark} {} ({})", desc.name, desc.dir);
        }
        match updater::find_git() {
            Ok(git) => {
                let version = run_capture(Command::new(&git).arg("--version"))
                    .map(|out| out.stdout.trim().to_string())
                    .unwrap_or_else(|_| "未知版本".to_string());
                println!("  git: {version} ({})", git.display());
            }
            Err(_) => println!("  git: 未安装"),
        }
    }
}

fn pause(prompter: &mut dyn Prompter) {
    let _ = prompter.input("按 Enter 返回菜单");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_always_exits() {
        assert_eq!(action_for("0"), Some(MenuAction::Exit));
        assert_eq!(action_for(" 0 "), Some(MenuAction::Exit));
    }

    #[test]
    fn leading_numbers_map_to_groups_then_services() {
        let groups = services::all_groups().len();
        assert_eq!(action_for("1"), Some(MenuAction::StartGroup(0)));
        assert_eq!(
            action_for(&(groups + 1).to_string()),
            Some(MenuAction::StartService(0))
        );
    }

    #[test]
    fn trailing_numbers_map_to_management_actions() {
        let offset = services::all_groups().len() + services::all_services().len();
        assert_eq!(
            action_for(&(offset + 1).to_string()),
            Some(MenuAction::ShowStatus)
        );
        assert_eq!(
            action_for(&(offset + 7).to_string()),
            Some(MenuAction::SystemInfo)
        );
        assert_eq!(action_for(&(offset + 8).to_string()), None);
    }

    #[test]
    fn garbage_input_maps_to_nothing() {
        assert_eq!(action_for("abc"), None);
        assert_eq!(action_for(""), None);
        assert_eq!(action_for("-1"), None);
    }
}
