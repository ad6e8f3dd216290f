//! 命令执行器
//!
//! 提供统一的外部命令执行接口，支持：
//! - 实时日志转发（逐行写入 tracing）
//! - 超时控制
//! - 取消支持

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn command: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Command timed out")]
    Timeout,

    #[error("Command was cancelled")]
    Cancelled,

    #[error("Failed to wait for command: {0}")]
    WaitFailed(#[source] std::io::Error),
}

/// 命令执行结果
pub struct CommandResult {
    /// 退出状态
    pub status: ExitStatus,
    /// 是否因超时而终止
    pub timed_out: bool,
}

impl CommandRunner {
    /// 执行命令并把输出逐行转发到 tracing
    ///
    /// 用于输出值得保留的长步骤（apt-get / git / cargo build）
    pub async fn run_logged(
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
        work_dir: &Path,
        cancel: CancellationToken,
        timeout: Duration,
    ) -> Result<CommandResult, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .envs(envs.iter().copied())
            .current_dir(work_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let tag = program.to_string();
        let stdout_task = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(command = %tag, "{}", line);
                }
            }
        });

        let tag = program.to_string();
        let stderr_task = tokio::spawn(async move {
            if let Some(stderr) = stderr {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(command = %tag, "{}", line);
                }
            }
        });

        // 等待命令完成，支持超时和取消
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                warn!(command = %program, "Command cancelled, killing process");
                let _ = child.kill().await;
                Err(CommandError::Cancelled)
            }
            _ = tokio::time::sleep(timeout) => {
                error!(command = %program, "Command timed out after {:?}", timeout);
                let _ = child.kill().await;
                // 等待进程实际终止
                let status = child.wait().await.map_err(CommandError::WaitFailed)?;
                Ok(CommandResult { status, timed_out: true })
            }
            status = child.wait() => {
                let status = status.map_err(CommandError::WaitFailed)?;
                Ok(CommandResult { status, timed_out: false })
            }
        };

        // 等待日志转发完成
        let _ = stdout_task.await;
        let _ = stderr_task.await;

        result
    }

    /// 执行简单命令（收集输出，不转发）
    ///
    /// 用于短命令（systemctl / hostname）
    pub async fn run_simple(
        program: &str,
        args: &[&str],
        work_dir: &Path,
        timeout: Duration,
    ) -> Result<std::process::Output, CommandError> {
        let child = Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .output();

        tokio::select! {
            result = child => {
                result.map_err(CommandError::SpawnFailed)
            }
            _ = tokio::time::sleep(timeout) => {
                Err(CommandError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_run_simple_success() {
        let result = CommandRunner::run_simple(
            "echo",
            &["hello"],
            &PathBuf::from("/tmp"),
            Duration::from_secs(5),
        )
        .await;

        assert!(result.is_ok());
        let output = result.unwrap();
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("hello"));
    }

    #[tokio::test]
    async fn test_run_simple_not_found() {
        let result = CommandRunner::run_simple(
            "nonexistent_command_12345",
            &[],
            &PathBuf::from("/tmp"),
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(CommandError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_run_logged_exit_code() {
        let result = CommandRunner::run_logged(
            "sh",
            &["-c", "exit 3"],
            &[],
            &PathBuf::from("/tmp"),
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.status.code(), Some(3));
    }

    #[tokio::test]
    async fn test_run_logged_timeout_kills_process() {
        let result = CommandRunner::run_logged(
            "sh",
            &["-c", "sleep 5"],
            &[],
            &PathBuf::from("/tmp"),
            CancellationToken::new(),
            Duration::from_millis(100),
        )
        .await
        .unwrap();

        assert!(result.timed_out);
    }

    #[tokio::test]
    async fn test_run_logged_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = CommandRunner::run_logged(
            "sh",
            &["-c", "sleep 5"],
            &[],
            &PathBuf::from("/tmp"),
            cancel,
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(CommandError::Cancelled)));
    }
}
