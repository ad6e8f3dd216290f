//! 安装生命周期领域模型
//!
//! 安装流程由一串顺序执行的步骤构成，每一步要么致命（失败即中止，
//! 对应 shell 严格模式），要么可抑制（失败只记录，对应 `|| true`）

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 步骤状态
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }
}

/// 安装步骤信息
#[derive(Clone, Debug, Serialize)]
pub struct InstallStep {
    /// 步骤标识 (e.g., "stop_service", "write_unit")
    pub name: String,
    /// 显示名称 (e.g., "Stop previous instance")
    pub display_name: String,
    /// 是否致命：失败时中止整个安装
    pub critical: bool,
    /// 开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 结束时间
    pub finished_at: Option<DateTime<Utc>>,
    /// 持续时间（毫秒）
    pub duration_ms: Option<i64>,
    /// 步骤状态
    pub status: StepStatus,
    /// 附加信息
    pub message: Option<String>,
}

impl InstallStep {
    /// 创建新的待执行步骤
    pub fn new(name: &str, display_name: &str, critical: bool) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            critical,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            status: StepStatus::Pending,
            message: None,
        }
    }

    /// 开始执行步骤
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StepStatus::Running;
    }

    /// 完成步骤
    pub fn finish(&mut self, success: bool, message: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.status = if success {
            StepStatus::Success
        } else {
            StepStatus::Failed
        };
        self.message = message;
        if let Some(started) = self.started_at {
            self.duration_ms = Some((now - started).num_milliseconds());
        }
    }

    /// 跳过步骤
    pub fn skip(&mut self, reason: Option<String>) {
        self.status = StepStatus::Skipped;
        self.message = reason;
    }

    /// 是否为需要中止安装的失败
    pub fn is_fatal_failure(&self) -> bool {
        self.critical && self.status == StepStatus::Failed
    }
}

/// 安装报告
///
/// 记录一次完整安装的每个步骤以及最终的服务地址
#[derive(Clone, Debug, Serialize)]
pub struct InstallReport {
    /// systemd 单元名 (e.g., "roulette.service")
    pub service: String,
    /// 单元文件路径
    pub unit_path: String,
    /// 预期服务地址 (e.g., "http://192.168.1.10:8000")
    pub url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<InstallStep>,
}

impl InstallReport {
    /// 创建新报告
    pub fn new(service: String, unit_path: String) -> Self {
        Self {
            service,
            unit_path,
            url: None,
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    /// 完成报告
    pub fn complete(&mut self, url: Option<String>) {
        self.finished_at = Some(Utc::now());
        self.url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_status_as_str() {
        assert_eq!(StepStatus::Pending.as_str(), "pending");
        assert_eq!(StepStatus::Success.as_str(), "success");
        assert_eq!(StepStatus::Skipped.as_str(), "skipped");
    }

    #[test]
    fn test_install_step_lifecycle() {
        let mut step = InstallStep::new("write_unit", "Write systemd unit", true);
        assert_eq!(step.status, StepStatus::Pending);

        step.start();
        assert_eq!(step.status, StepStatus::Running);
        assert!(step.started_at.is_some());

        step.finish(true, Some("Done".to_string()));
        assert_eq!(step.status, StepStatus::Success);
        assert!(step.finished_at.is_some());
        assert!(step.duration_ms.is_some());
        assert!(!step.is_fatal_failure());
    }

    #[test]
    fn test_fatal_failure_requires_critical() {
        let mut suppressed = InstallStep::new("stop_service", "Stop previous instance", false);
        suppressed.start();
        suppressed.finish(false, Some("unit not found".to_string()));
        assert!(!suppressed.is_fatal_failure());

        let mut critical = InstallStep::new("daemon_reload", "Reload systemd", true);
        critical.start();
        critical.finish(false, None);
        assert!(critical.is_fatal_failure());
    }

    #[test]
    fn test_install_report_complete() {
        let mut report = InstallReport::new(
            "roulette.service".to_string(),
            "/etc/systemd/system/roulette.service".to_string(),
        );
        assert!(report.url.is_none());

        report.complete(Some("http://10.0.0.5:8000".to_string()));
        assert!(report.finished_at.is_some());
        assert_eq!(report.url.as_deref(), Some("http://10.0.0.5:8000"));
    }
}
