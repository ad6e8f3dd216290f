//! systemd 单元管理
//!
//! 单元文件渲染与 systemctl 封装

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::env::constants::{SERVICE_NAME, SERVICE_UNIT, SYSTEMCTL_TIMEOUT_SECS, UNIT_DIR};
use crate::config::InstallConfig;
use crate::infra::command::{CommandError, CommandRunner};

/// 渲染 systemd 单元文件内容
///
/// ExecStart 携带监听地址与端口，重装后端口以单元文件为准
pub fn render_unit(config: &InstallConfig, exec_path: &Path) -> String {
    format!(
        "[Unit]\n\
         Description={description}\n\
         After=network.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         WorkingDirectory={work_dir}\n\
         ExecStart={exec} --host {host} --port {port}\n\
         Restart=always\n\
         RestartSec=3\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        description = SERVICE_NAME,
        work_dir = config.install_dir.display(),
        exec = exec_path.display(),
        host = config.host,
        port = config.port,
    )
}

/// 单元文件的固定安装路径
pub fn unit_path() -> PathBuf {
    Path::new(UNIT_DIR).join(SERVICE_UNIT)
}

/// 调用 systemctl
pub async fn systemctl(args: &[&str]) -> Result<std::process::Output, CommandError> {
    CommandRunner::run_simple(
        "systemctl",
        args,
        Path::new("/"),
        Duration::from_secs(SYSTEMCTL_TIMEOUT_SECS),
    )
    .await
}

/// 查询单元当前状态 ("active" / "inactive" / "failed" / ...)
///
/// `is-active` 对非 active 状态返回非零退出码，但 stdout 仍然携带状态字
pub async fn unit_state() -> Result<String, CommandError> {
    let output = systemctl(&["is-active", SERVICE_UNIT]).await?;
    let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if state.is_empty() {
        Ok("unknown".to_string())
    } else {
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::constants::{DEFAULT_HOST, DEFAULT_PORT};

    fn test_config() -> InstallConfig {
        InstallConfig {
            install_dir: PathBuf::from("/opt/roulette-tracker"),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            run_from_repo: false,
            repo_url: None,
            repo_branch: None,
        }
    }

    #[test]
    fn test_render_unit_structure() {
        let config = test_config();
        let unit = render_unit(&config, &config.installed_binary());

        assert!(unit.starts_with("[Unit]\n"));
        assert!(unit.contains("[Service]\n"));
        assert!(unit.contains("WantedBy=multi-user.target"));
        assert!(unit.contains("WorkingDirectory=/opt/roulette-tracker"));
        assert!(unit.contains(
            "ExecStart=/opt/roulette-tracker/roulette-tracker --host 0.0.0.0 --port 8000"
        ));
        assert!(unit.contains("Restart=always"));
    }

    #[test]
    fn test_render_unit_port_matches_config() {
        // 打印的 URL 端口与单元文件端口必须一致
        let mut config = test_config();
        config.port = 9123;
        let unit = render_unit(&config, &config.installed_binary());
        let url = crate::infra::net::service_url(
            std::net::IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 5)),
            config.port,
        );

        assert!(unit.contains("--port 9123"));
        assert!(url.ends_with(":9123"));
    }

    #[test]
    fn test_unit_path() {
        assert_eq!(
            unit_path(),
            PathBuf::from("/etc/systemd/system/roulette.service")
        );
    }
}
