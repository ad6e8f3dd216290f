//! 服务生命周期安装器
//!
//! 把主机收敛到 `roulette.service` 已安装、已启用、运行中的状态：
//! 停止旧实例 -> 安装系统包 -> 重建安装目录 -> 获取源 -> 写入单元 ->
//! reload/enable/restart -> 探测状态并报告服务地址。
//!
//! 步骤严格顺序执行。致命步骤失败立即中止（shell 严格模式语义），
//! 可抑制步骤（停止旧实例、状态探测）失败只记录不中止（`|| true` 语义）。

pub mod source;
pub mod systemd;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::config::env::constants::{
    APT_TIMEOUT_SECS, OS_PACKAGES, SERVICE_UNIT, STATUS_PROBE_DELAY_SECS,
};
use crate::config::InstallConfig;
use crate::domain::install::{InstallReport, InstallStep};
use crate::infra::command::{CommandError, CommandRunner};
use crate::infra::net;
use crate::state::get_shutdown_token;

/// 安装错误类型
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Step '{step}' failed: {detail}")]
    StepFailed { step: String, detail: String },

    #[error("RUN_FROM_REPO=1 requires REPO_URL to be set")]
    MissingRepoUrl,

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// 步骤在报告中的固定位置
const STOP: usize = 0;
const PACKAGES: usize = 1;
const PREPARE: usize = 2;
const FETCH: usize = 3;
const BUILD: usize = 4;
const UNIT: usize = 5;
const RELOAD: usize = 6;
const ENABLE: usize = 7;
const RESTART: usize = 8;
const PROBE: usize = 9;

/// 服务生命周期安装器
pub struct Installer {
    config: InstallConfig,
}

impl Installer {
    /// 创建安装器
    pub fn new(config: InstallConfig) -> Self {
        Self { config }
    }

    /// 执行完整安装流程
    pub async fn install(&self) -> Result<InstallReport, InstallError> {
        // Pre-flight: repo 模式必须有仓库地址
        if self.config.run_from_repo && self.config.repo_url.is_none() {
            return Err(InstallError::MissingRepoUrl);
        }

        let cancel = get_shutdown_token();
        let mut report = InstallReport::new(
            SERVICE_UNIT.to_string(),
            systemd::unit_path().display().to_string(),
        );
        let mut steps = vec![
            InstallStep::new("stop_service", "Stop previous instance", false),
            InstallStep::new("install_packages", "Install OS packages", true),
            InstallStep::new("prepare_dir", "Prepare install directory", true),
            InstallStep::new("fetch_source", "Fetch service files", true),
            InstallStep::new("build_release", "Build release binary", true),
            InstallStep::new("write_unit", "Write systemd unit", true),
            InstallStep::new("daemon_reload", "Reload systemd", true),
            InstallStep::new("enable_service", "Enable unit", true),
            InstallStep::new("restart_service", "Restart unit", true),
            InstallStep::new("probe_status", "Probe service status", false),
        ];

        tracing::info!(
            unit = SERVICE_UNIT,
            install_dir = %self.config.install_dir.display(),
            run_from_repo = self.config.run_from_repo,
            "=== Starting install ==="
        );

        // 停止旧实例（单元可能尚不存在，失败可抑制）
        steps[STOP].start();
        match systemd::systemctl(&["stop", SERVICE_UNIT]).await {
            Ok(out) if out.status.success() => steps[STOP].finish(true, None),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                tracing::warn!(unit = SERVICE_UNIT, %stderr, "Stop failed, continuing");
                steps[STOP].finish(false, Some(stderr));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stop failed, continuing");
                steps[STOP].finish(false, Some(e.to_string()));
            }
        }

        // 安装固定系统包
        steps[PACKAGES].start();
        self.install_packages(&cancel, &mut steps[PACKAGES]).await?;

        // 重建安装目录（先 rm -rf 再创建）
        steps[PREPARE].start();
        if self.config.install_dir.exists() {
            if let Err(e) = tokio::fs::remove_dir_all(&self.config.install_dir).await {
                return Err(fatal(&mut steps[PREPARE], e.to_string()));
            }
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.config.install_dir).await {
            return Err(fatal(&mut steps[PREPARE], e.to_string()));
        }
        steps[PREPARE].finish(true, None);

        // 获取源：repo 模式 clone + 构建，copy 模式复制当前二进制
        steps[FETCH].start();
        let exec_path = if self.config.run_from_repo {
            if let Err(e) = source::clone_repo(&self.config, cancel.clone()).await {
                return Err(fatal(&mut steps[FETCH], e.to_string()));
            }
            steps[FETCH].finish(true, self.config.repo_url.clone());

            steps[BUILD].start();
            match source::build_release(&self.config, cancel.clone()).await {
                Ok(path) => {
                    steps[BUILD].finish(true, None);
                    path
                }
                Err(e) => return Err(fatal(&mut steps[BUILD], e.to_string())),
            }
        } else {
            match source::install_current_binary(&self.config).await {
                Ok(path) => {
                    steps[FETCH].finish(true, Some(path.display().to_string()));
                    steps[BUILD].skip(Some("copy mode".to_string()));
                    path
                }
                Err(e) => return Err(fatal(&mut steps[FETCH], e.to_string())),
            }
        };

        // 写入单元文件
        steps[UNIT].start();
        let unit_content = systemd::render_unit(&self.config, &exec_path);
        if let Err(e) = tokio::fs::write(systemd::unit_path(), unit_content).await {
            return Err(fatal(&mut steps[UNIT], e.to_string()));
        }
        steps[UNIT].finish(true, None);

        // reload / enable / restart
        systemctl_step(&mut steps[RELOAD], &["daemon-reload"]).await?;
        systemctl_step(&mut steps[ENABLE], &["enable", SERVICE_UNIT]).await?;
        systemctl_step(&mut steps[RESTART], &["restart", SERVICE_UNIT]).await?;

        // 状态探测（失败可抑制：安装仍然完成并报告）
        steps[PROBE].start();
        tokio::time::sleep(Duration::from_secs(STATUS_PROBE_DELAY_SECS)).await;
        match systemd::unit_state().await {
            Ok(state) => {
                let active = state == "active";
                if !active {
                    tracing::warn!(unit = SERVICE_UNIT, %state, "Unit is not active after install");
                }
                steps[PROBE].finish(active, Some(state));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Status probe failed, continuing");
                steps[PROBE].finish(false, Some(e.to_string()));
            }
        }

        // 报告预期服务地址
        let url = net::service_url(net::primary_ip(), self.config.port);
        tracing::info!(unit = SERVICE_UNIT, url = %url, "=== Install complete ===");

        report.steps = steps;
        report.complete(Some(url));
        Ok(report)
    }

    /// 卸载：停止、禁用、移除单元与安装目录
    pub async fn uninstall(&self) -> Result<(), InstallError> {
        // 停止与禁用失败可抑制（单元可能不存在）
        if let Err(e) = systemd::systemctl(&["stop", SERVICE_UNIT]).await {
            tracing::warn!(error = %e, "Stop failed, continuing");
        }
        if let Err(e) = systemd::systemctl(&["disable", SERVICE_UNIT]).await {
            tracing::warn!(error = %e, "Disable failed, continuing");
        }

        match tokio::fs::remove_file(systemd::unit_path()).await {
            Ok(()) => tracing::info!(unit = SERVICE_UNIT, "Removed unit file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(InstallError::Io(e)),
        }

        let out = systemd::systemctl(&["daemon-reload"]).await?;
        if !out.status.success() {
            return Err(InstallError::StepFailed {
                step: "daemon_reload".to_string(),
                detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        match tokio::fs::remove_dir_all(&self.config.install_dir).await {
            Ok(()) => {
                tracing::info!(dir = %self.config.install_dir.display(), "Removed install directory")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(InstallError::Io(e)),
        }

        Ok(())
    }

    /// 启动服务
    pub async fn start(&self) -> Result<(), InstallError> {
        run_unit_command("start").await
    }

    /// 停止服务
    pub async fn stop(&self) -> Result<(), InstallError> {
        run_unit_command("stop").await
    }

    /// 查询服务状态
    pub async fn status(&self) -> Result<String, InstallError> {
        Ok(systemd::unit_state().await?)
    }

    /// apt-get update + install（同一步骤内两条命令，任一失败即致命）
    async fn install_packages(
        &self,
        cancel: &tokio_util::sync::CancellationToken,
        step: &mut InstallStep,
    ) -> Result<(), InstallError> {
        let noninteractive = [("DEBIAN_FRONTEND", "noninteractive")];
        let timeout = Duration::from_secs(APT_TIMEOUT_SECS);

        let update = CommandRunner::run_logged(
            "apt-get",
            &["update"],
            &noninteractive,
            Path::new("/"),
            cancel.clone(),
            timeout,
        )
        .await;
        match update {
            Ok(res) if res.status.success() => {}
            Ok(res) => {
                return Err(fatal(
                    step,
                    format!("apt-get update exited with {:?}", res.status.code()),
                ))
            }
            Err(e) => return Err(fatal(step, e.to_string())),
        }

        let mut args = vec!["install", "-y"];
        args.extend_from_slice(OS_PACKAGES);
        let install = CommandRunner::run_logged(
            "apt-get",
            &args,
            &noninteractive,
            Path::new("/"),
            cancel.clone(),
            timeout,
        )
        .await;
        match install {
            Ok(res) if res.status.success() => {
                step.finish(true, Some(OS_PACKAGES.join(" ")));
                Ok(())
            }
            Ok(res) => Err(fatal(
                step,
                format!("apt-get install exited with {:?}", res.status.code()),
            )),
            Err(e) => Err(fatal(step, e.to_string())),
        }
    }
}

/// 标记致命失败并生成对应错误
fn fatal(step: &mut InstallStep, detail: impl Into<String>) -> InstallError {
    let detail = detail.into();
    step.finish(false, Some(detail.clone()));
    tracing::error!(step = %step.name, %detail, "Fatal step failure, aborting install");
    InstallError::StepFailed {
        step: step.name.clone(),
        detail,
    }
}

/// 致命的 systemctl 步骤
async fn systemctl_step(step: &mut InstallStep, args: &[&str]) -> Result<(), InstallError> {
    step.start();
    match systemd::systemctl(args).await {
        Ok(out) if out.status.success() => {
            step.finish(true, None);
            Ok(())
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("systemctl {} failed", args.join(" "))
            } else {
                stderr
            };
            Err(fatal(step, detail))
        }
        Err(e) => Err(fatal(step, e.to_string())),
    }
}

/// start/stop 的共用封装
async fn run_unit_command(verb: &str) -> Result<(), InstallError> {
    let out = systemd::systemctl(&[verb, SERVICE_UNIT]).await?;
    if out.status.success() {
        Ok(())
    } else {
        Err(InstallError::StepFailed {
            step: verb.to_string(),
            detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}
