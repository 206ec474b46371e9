use anyhow::{Context, Result};
use std::process::{Command, Stdio};

/// 外部命令的捕获结果。
#[derive(Debug)]
pub struct CmdOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// 运行命令并捕获输出（不回显到控制台）。
pub fn run_capture(command: &mut Command) -> Result<CmdOutput> {
    let output = command.output().context("启动命令失败")?;
    Ok(CmdOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// 运行命令，输出直接流向控制台，仅返回是否成功。
pub fn run_streamed(command: &mut Command) -> Result<bool> {
    let status = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("启动命令失败")?;
    Ok(status.success())
}

/// 运行命令，失败时携带 stderr 报错。
pub fn run_checked(command: &mut Command) -> Result<()> {
    let output = command.output().context("启动命令失败")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("命令执行失败: {}", stderr.trim());
    }
    Ok(())
}

/// 清屏（ANSI 终端）。
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_capture_reads_stdout() {
        let out = run_capture(Command::new("sh").args(["-lc", "echo hello"]))
            .expect("stdout capture should succeed");
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn run_capture_reads_stderr() {
        let out = run_capture(Command::new("sh").args(["-lc", "echo warn 1>&2; exit 3"]))
            .expect("stderr capture should succeed");
        assert!(!out.success);
        assert_eq!(out.stderr.trim(), "warn");
    }

    #[test]
    fn run_checked_errors_on_non_zero_status() {
        let err = run_checked(Command::new("sh").args(["-lc", "exit 17"]))
            .expect_err("non-zero exit should error");
        assert!(err.to_string().contains("命令执行失败"));
    }
}
