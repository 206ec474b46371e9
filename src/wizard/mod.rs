//! 首次启动配置向导。
//!
//! 引导用户完成 EULA 确认、`bot_config.toml` 和 `model_config.toml` 的
//! 基本设置。所有修改都在内存里完成，每个文件在整轮遍历结束后一次性写回。

pub mod catalog;
pub mod editor;

use anyhow::Result;
use console::style;
use toml_edit::Item;

use crate::config::{self, EnvFile, Paths};
use self::editor::{update_comment, ConsolePrompter, Prompter, SettingsEditor};

const EULA_KEY: &str = "EULA_CONFIRMED";

/// 向导入口：EULA → bot 配置 → 模型配置。
pub fn run(paths: &Paths) -> Result<()> {
    let mut prompter = ConsolePrompter;

    if !check_eula(paths, &mut prompter)? {
        return Ok(());
    }

    println!();
    println!("{}", "=".repeat(60));
    println!(
        "{}",
        style("欢迎使用 MoFox-Bot 配置向导！").cyan().bold()
    );
    println!("接下来，我会引导你完成一些基本设置。");
    println!("如果不想修改，直接按 Enter 键跳过即可。");
    println!("{}", "=".repeat(60));
    println!();

    configure_bot(paths, &mut prompter)?;
    configure_model(paths, &mut prompter)?;

    println!();
    println!("{}", style("==============================================").green());
    println!(
        "{}",
        style("所有配置已完成！现在你可以启动主程序了。").green().bold()
    );
    println!("{}", style("==============================================").green());
    Ok(())
}

/// 检查并处理 EULA 协议确认。返回用户是否同意。
pub fn check_eula(paths: &Paths, prompter: &mut dyn Prompter) -> Result<bool> {
    let mut env = EnvFile::load(&paths.env_file)?;
    if env
        .get(EULA_KEY)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        println!("您已同意 EULA 协议。");
        return Ok(true);
    }

    println!("{}", "=".repeat(60));
    println!("{}", style("MoFox-Bot 用户许可协议 (EULA) 确认").bold());
    println!("{}", "=".repeat(60));
    println!("在使用 MoFox-Bot 之前,您需要同意 EULA 和隐私条款。");
    println!("请花时间阅读以下文件(它们应该在 Bot 目录下):");
    println!("  - EULA.md (用户许可协议)");
    println!("  - PRIVACY.md (隐私条款)");
    println!("{}", "-".repeat(60));

    loop {
        let answer = prompter
            .input("您是否同意上述用户许可协议和隐私条款? (yes/no)")?
            .trim()
            .to_lowercase();
        match answer.as_str() {
            "yes" | "y" => {
                env.set(EULA_KEY, "true");
                env.save(&paths.env_file)?;
                println!("{}", style("感谢您的同意! EULA 状态已更新。").green());
                return Ok(true);
            }
            "no" | "n" => {
                println!(
                    "{}",
                    style("您必须同意协议才能使用 MoFox-Bot。程序即将退出。").red()
                );
                return Ok(false);
            }
            _ => println!("{}", style("无效输入,请输入 'yes' 或 'no'。").yellow()),
        }
    }
}

/// 配置 `bot_config.toml`。文件缺失只报告，不让向导崩溃。
pub fn configure_bot(paths: &Paths, prompter: &mut dyn Prompter) -> Result<()> {
    let mut doc = match config::load_document(&paths.bot_config) {
        Ok(doc) => doc,
        Err(err) => {
            println!("{}", style(format!("错误：{err:#}")).red());
            return Ok(());
        }
    };

    println!("\n--- 开始配置 `bot_config.toml` ---");
    let mut editor = SettingsEditor::new(prompter);
    editor.edit_document(&mut doc, catalog::bot_config_catalog())?;

    config::save_document(&paths.bot_config, &doc)?;
    println!("\n`bot_config.toml` 配置完成！");
    Ok(())
}

/// 配置 `model_config.toml`：主要是 SiliconFlow 的 API Key。
pub fn configure_model(paths: &Paths, prompter: &mut dyn Prompter) -> Result<()> {
    let mut doc = match config::load_document(&paths.model_config) {
        Ok(doc) => doc,
        Err(err) => {
            println!("{}", style(format!("错误：{err:#}")).red());
            return Ok(());
        }
    };

    println!("\n--- 开始配置 `model_config.toml` ---");
    println!("主要配置 SiliconFlow 的 API Key。");

    let mut found = false;
    if let Some(providers) = doc
        .get_mut("api_providers")
        .and_then(Item::as_array_of_tables_mut)
    {
        for provider in providers.iter_mut() {
            if provider.get("name").and_then(Item::as_str) != Some("SiliconFlow") {
                continue;
            }
            found = true;
            let current = provider
                .get("api_key")
                .and_then(Item::as_str)
                .unwrap_or("")
                .to_string();
            println!("-> 正在配置 'SiliconFlow' API Key:");
            println!("   当前值: {current}");

            let api_key = prompter.input(
                "   请输入你的 SiliconFlow API Key(如果没有可以在 https://cloud.siliconflow.cn 注册) (直接回车则不修改)",
            )?;
            let api_key = api_key.trim();
            if !api_key.is_empty() {
                provider.insert("api_key", toml_edit::value(api_key));
                println!("   SiliconFlow API Key 已更新！");
            }
            if let Some(value) = provider.get_mut("api_key").and_then(Item::as_value_mut) {
                update_comment(value, "在这里填入你的 SiliconFlow API Key");
            }
            break;
        }
    }

    if !found {
        println!(
            "{}",
            style("未找到 SiliconFlow 的配置项，请检查 `model_config.toml` 文件。").yellow()
        );
    }

    config::save_document(&paths.model_config, &doc)?;
    println!("\n`model_config.toml` 配置完成！");
    Ok(())
}
