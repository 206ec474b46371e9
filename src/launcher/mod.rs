//! 外部进程启动与存活跟踪。
//!
//! 启动是"发射后不管"：在新终端窗口里拉起服务并记下进程句柄，
//! 之后只在用户查看状态时轮询句柄是否还活着。除此之外与子进程
//! 没有任何通信。

use anyhow::Result;
use console::style;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Child, Command};
use tracing::warn;

use crate::config::Paths;
use crate::services::{ServiceDescriptor, ServiceKind};

/// 轮询得到的进程状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    NotStarted,
    Running(u32),
    Exited,
}

/// 运行中进程的登记表。随管理器一起构造，显式传给各个处理函数。
pub struct ProcessRegistry {
    children: HashMap<&'static str, Child>,
    use_terminal: bool,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
            use_terminal: true,
        }
    }

    /// 不尝试图形终端、直接后台拉起的登记表（无图形环境或测试用）。
    pub fn headless() -> Self {
        Self {
            children: HashMap::new(),
            use_terminal: false,
        }
    }

    /// 启动一个服务。目录或主程序文件缺失时返回 `false` 且不登记。
    pub fn launch(&mut self, desc: &'static ServiceDescriptor, paths: &Paths) -> Result<bool> {
        let dir = desc.path(&paths.base_dir);
        if !dir.exists() {
            println!(
                "{}",
                style(format!("服务目录不存在: {}", dir.display())).red()
            );
            return Ok(false);
        }
        let entry = dir.join(desc.entry);
        if !entry.exists() {
            println!(
                "{}",
                style(format!("主程序文件不存在: {}", entry.display())).red()
            );
            return Ok(false);
        }

        if let Some(child) = self.children.get_mut(desc.key) {
            if child.try_wait().map(|s| s.is_none()).unwrap_or(false) {
                println!("{}", style(format!("{} 已经在运行中", desc.name)).yellow());
                return Ok(true);
            }
        }

        println!("{}", style(format!("正在启动 {}...", desc.name)).blue());

        // shell 脚本和可执行文件先确保有执行权限
        #[cfg(unix)]
        if matches!(desc.kind, ServiceKind::Shell | ServiceKind::Executable) {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&entry, std::fs::Permissions::from_mode(0o755));
        }

        let command_line = match desc.kind {
            ServiceKind::Python => format!(
                "cd '{}' && '{}' '{}'; echo; read -p 'Press Enter to exit...'",
                dir.display(),
                paths.venv_python.display(),
                desc.entry
            ),
            ServiceKind::Shell | ServiceKind::Executable => format!(
                "cd '{}' && './{}'; echo; read -p 'Press Enter to exit...'",
                dir.display(),
                desc.entry
            ),
        };

        let child = if self.use_terminal {
            match spawn_in_terminal(&command_line, &dir) {
                Some(child) => child,
                None => {
                    println!(
                        "{}",
                        style("未找到图形终端，将在后台运行...").yellow()
                    );
                    self.spawn_background(desc, &dir, paths)?
                }
            }
        } else {
            self.spawn_background(desc, &dir, paths)?
        };

        let pid = child.id();
        self.children.insert(desc.key, child);
        println!(
            "{}",
            style(format!("✅ {} 已启动 (PID: {pid})", desc.name)).green()
        );
        Ok(true)
    }

    fn spawn_background(
        &self,
        desc: &ServiceDescriptor,
        dir: &Path,
        paths: &Paths,
    ) -> Result<Child> {
        let mut command = match desc.kind {
            ServiceKind::Python => {
                let mut cmd = Command::new(&paths.venv_python);
                cmd.arg(desc.entry);
                cmd
            }
            ServiceKind::Shell | ServiceKind::Executable => Command::new(format!("./{}", desc.entry)),
        };
        command
            .current_dir(dir)
            .spawn()
            .map_err(|err| anyhow::anyhow!("启动 {} 失败: {err}", desc.name))
    }

    /// 轮询服务状态；已退出的句柄在此惰性清除。
    pub fn poll(&mut self, key: &str) -> ProcessState {
        let Some(child) = self.children.get_mut(key) else {
            return ProcessState::NotStarted;
        };
        match child.try_wait() {
            Ok(None) => ProcessState::Running(child.id()),
            Ok(Some(_)) | Err(_) => {
                self.children.remove(key);
                ProcessState::Exited
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// 尽力终止所有已登记的进程并清空登记表。
    pub fn stop_all(&mut self) {
        if self.children.is_empty() {
            println!("{}", style("没有正在运行的服务").yellow());
            return;
        }
        println!("{}", style("正在停止所有服务...").blue());
        for (key, child) in &mut self.children {
            let name = crate::services::find(key).map_or(*key, |s| s.name);
            match child.kill() {
                Ok(()) => println!("{}", style(format!("✅ 已停止 {name}")).green()),
                Err(err) => {
                    warn!("停止 {name} 失败: {err}");
                    println!("{}", style(format!("停止 {name} 失败: {err}")).red());
                }
            }
            let _ = child.wait();
        }
        self.children.clear();
        println!("{}", style("所有服务已停止").green());
    }
}

/// 依次尝试常见的图形终端，第一个能拉起的胜出。
fn spawn_in_terminal(command_line: &str, dir: &Path) -> Option<Child> {
    let wrapped = format!("bash -c \"{command_line}\"");
    let candidates: [(&str, Vec<String>); 4] = [
        (
            "gnome-terminal",
            vec![
                "--".into(),
                "bash".into(),
                "-c".into(),
                command_line.to_string(),
            ],
        ),
        (
            "konsole",
            vec![
                "-e".into(),
                "bash".into(),
                "-c".into(),
                command_line.to_string(),
            ],
        ),
        ("xfce4-terminal", vec!["--command".into(), wrapped.clone()]),
        ("xterm", vec!["-e".into(), wrapped]),
    ];

    for (program, args) in candidates {
        match Command::new(program).args(&args).current_dir(dir).spawn() {
            Ok(child) => return Some(child),
            Err(_) => continue,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    static SLEEPER: ServiceDescriptor = ServiceDescriptor {
        key: "sleeper",
        name: "长跑测试服务",
        dir: "Sleeper",
        entry: "run.sh",
        description: "一直睡",
        repo_url: None,
        branch: None,
        kind: ServiceKind::Shell,
    };

    static QUITTER: ServiceDescriptor = ServiceDescriptor {
        key: "quitter",
        name: "速退测试服务",
        dir: "Quitter",
        entry: "run.sh",
        description: "立刻退出",
        repo_url: None,
        branch: None,
        kind: ServiceKind::Shell,
    };

    static GHOST: ServiceDescriptor = ServiceDescriptor {
        key: "ghost",
        name: "缺文件测试服务",
        dir: "Ghost",
        entry: "missing.sh",
        description: "主程序缺失",
        repo_url: None,
        branch: None,
        kind: ServiceKind::Shell,
    };

    fn setup(desc: &ServiceDescriptor, script: &str, base: &Path) -> Paths {
        let dir = desc.path(base);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(desc.entry), script).unwrap();
        Paths::new(PathBuf::from(base))
    }

    #[test]
    fn launch_without_entry_file_leaves_no_registry_entry() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(GHOST.path(base.path())).unwrap();
        let paths = Paths::new(base.path().to_path_buf());

        let mut registry = ProcessRegistry::headless();
        let ok = registry.launch(&GHOST, &paths).unwrap();
        assert!(!ok);
        assert_eq!(registry.poll("ghost"), ProcessState::NotStarted);
        assert!(registry.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn running_service_is_polled_and_stopped() {
        let base = tempfile::tempdir().unwrap();
        let paths = setup(&SLEEPER, "#!/bin/sh\nsleep 30\n", base.path());

        let mut registry = ProcessRegistry::headless();
        assert!(registry.launch(&SLEEPER, &paths).unwrap());
        assert!(matches!(registry.poll("sleeper"), ProcessState::Running(_)));

        registry.stop_all();
        assert_eq!(registry.poll("sleeper"), ProcessState::NotStarted);
        assert!(registry.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn exited_service_is_lazily_evicted() {
        let base = tempfile::tempdir().unwrap();
        let paths = setup(&QUITTER, "#!/bin/sh\nexit 0\n", base.path());

        let mut registry = ProcessRegistry::headless();
        assert!(registry.launch(&QUITTER, &paths).unwrap());

        let mut state = ProcessState::NotStarted;
        for _ in 0..100 {
            state = registry.poll("quitter");
            if state == ProcessState::Exited {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(state, ProcessState::Exited);
        // 句柄已被惰性清除
        assert_eq!(registry.poll("quitter"), ProcessState::NotStarted);
    }
}
