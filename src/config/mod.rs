//! 安装目录布局与配置文件读写。
//!
//! 配置文件通过 `toml_edit` 以保留注释和排版的方式读写，
//! 向导对文档的修改不会破坏用户手写的注释。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// 安装目录下各个文件的位置。
#[derive(Debug, Clone)]
pub struct Paths {
    /// 安装根目录（默认为可执行文件所在目录）。
    pub base_dir: PathBuf,
    /// Bot 主配置文件。
    pub bot_config: PathBuf,
    /// 模型配置文件。
    pub model_config: PathBuf,
    /// Bot 的 `.env` 文件（EULA 确认状态等）。
    pub env_file: PathBuf,
    /// 虚拟环境中的 Python 解释器。
    pub venv_python: PathBuf,
}

impl Paths {
    pub fn new(base_dir: PathBuf) -> Self {
        let bot_dir = base_dir.join("Bot");
        Self {
            bot_config: bot_dir.join("config").join("bot_config.toml"),
            model_config: bot_dir.join("config").join("model_config.toml"),
            env_file: bot_dir.join(".env"),
            venv_python: base_dir.join(".venv").join("bin").join("python"),
            base_dir,
        }
    }
}

/// 读取一个 TOML 配置文件为可变文档。文件不存在时给出明确的提示。
pub fn load_document(path: &Path) -> Result<DocumentMut> {
    if !path.exists() {
        anyhow::bail!("找不到配置文件，路径：{}", path.display());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("读取失败 {}", path.display()))?;
    content
        .parse::<DocumentMut>()
        .with_context(|| format!("解析 TOML 失败 {}", path.display()))
}

/// 将文档写回磁盘，保留原有排版与注释。
pub fn save_document(path: &Path, doc: &DocumentMut) -> Result<()> {
    fs::write(path, doc.to_string()).with_context(|| format!("写入失败 {}", path.display()))
}

/// 简单的 `.env` 文件（`KEY=value` 行），保留键的出现顺序。
#[derive(Debug, Default)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// 读取 `.env`；文件不存在时返回空内容。
    pub fn load(path: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        if path.exists() {
            let content =
                fs::read_to_string(path).with_context(|| format!("读取失败 {}", path.display()))?;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    entries.push((key.trim().to_string(), value.trim().to_string()));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("创建目录失败 {}", parent.display()))?;
        }
        let mut content = String::new();
        for (key, value) in &self.entries {
            content.push_str(key);
            content.push('=');
            content.push_str(value);
            content.push('\n');
        }
        fs::write(path, content).with_context(|| format!("写入 .env 文件失败 {}", path.display()))
    }
}
