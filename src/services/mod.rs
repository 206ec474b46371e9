//! 服务描述表：OneKey 能够启动和更新的外部程序。
//!
//! 这是进程管理器持有的唯一"业务数据"，随二进制编译，运行期只读。

use std::path::{Path, PathBuf};

/// 服务的启动方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// 虚拟环境 Python 脚本。
    Python,
    /// Shell 脚本。
    Shell,
    /// 原生可执行文件。
    Executable,
}

/// 一个可启动的外部程序。
#[derive(Debug)]
pub struct ServiceDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    /// 相对安装根目录的路径。
    pub dir: &'static str,
    pub entry: &'static str,
    pub description: &'static str,
    pub repo_url: Option<&'static str>,
    pub branch: Option<&'static str>,
    pub kind: ServiceKind,
}

impl ServiceDescriptor {
    pub fn path(&self, base_dir: &Path) -> PathBuf {
        let mut path = base_dir.to_path_buf();
        for part in self.dir.split('/') {
            path.push(part);
        }
        path
    }

    pub fn entry_path(&self, base_dir: &Path) -> PathBuf {
        self.path(base_dir).join(self.entry)
    }
}

/// 一组一起启动的服务。
#[derive(Debug)]
pub struct ServiceGroup {
    pub name: &'static str,
    pub description: &'static str,
    pub members: &'static [&'static str],
}

static SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor {
        key: "bot",
        name: "MoFox_Bot 主程序",
        dir: "Bot",
        entry: "bot.py",
        description: "AI聊天机器人主程序",
        repo_url: Some("https://github.com/MoFox-Studio/MoFox-Core.git"),
        branch: Some("master"),
        kind: ServiceKind::Python,
    },
    ServiceDescriptor {
        key: "adapter",
        name: "Napcat Adapter",
        dir: "Adapter",
        entry: "main.py",
        description: "QQ消息适配器",
        repo_url: Some("https://github.com/MoFox-Studio/Napcat-Adapter.git"),
        branch: Some("master"),
        kind: ServiceKind::Python,
    },
    ServiceDescriptor {
        key: "matcha_adapter",
        name: "Matcha Adapter",
        dir: "Matcha-Adapter",
        entry: "main.py",
        description: "Matcha消息适配器",
        repo_url: Some("https://github.com/MoFox-Studio/Matcha-Adapter.git"),
        branch: Some("master"),
        kind: ServiceKind::Python,
    },
    ServiceDescriptor {
        key: "napcat",
        name: "Napcat 服务",
        dir: "Napcat/Shell",
        entry: "napcat.sh",
        description: "QQ协议服务",
        repo_url: None,
        branch: None,
        kind: ServiceKind::Shell,
    },
    ServiceDescriptor {
        key: "matcha",
        name: "Matcha 程序",
        dir: "Matcha",
        entry: "matcha",
        description: "Matcha客户端程序",
        repo_url: None,
        branch: None,
        kind: ServiceKind::Executable,
    },
];

static GROUPS: &[ServiceGroup] = &[
    ServiceGroup {
        name: "QQ机器人组合",
        description: "MoFox_Bot主程序 + Napcat Adapter + Napcat服务，用于连接QQ平台",
        members: &["bot", "adapter", "napcat"],
    },
    ServiceGroup {
        name: "Matcha机器人组合",
        description: "MoFox_Bot主程序 + Matcha Adapter + Matcha程序，用于连接Matcha平台",
        members: &["bot", "matcha_adapter", "matcha"],
    },
];

/// 全部服务描述。
pub fn all_services() -> &'static [ServiceDescriptor] {
    SERVICES
}

/// 全部启动组合。
pub fn all_groups() -> &'static [ServiceGroup] {
    GROUPS
}

/// 按 key 查找服务。
pub fn find(key: &str) -> Option<&'static ServiceDescriptor> {
    SERVICES.iter().find(|s| s.key == key)
}
