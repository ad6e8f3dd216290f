//! 环境变量配置加载

use std::env;
use std::path::PathBuf;

use crate::config::env::constants::{DEFAULT_HOST, DEFAULT_INSTALL_DIR, DEFAULT_PORT};

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 服务监听地址
    pub host: String,
    /// 服务监听端口
    pub port: u16,
    /// 安装配置
    pub install: InstallConfig,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host,
            port,
            install: InstallConfig::from_env(),
        }
    }
}

/// 安装配置
///
/// 对应安装脚本的固定路径与 `RUN_FROM_REPO` 开关
#[derive(Clone, Debug)]
pub struct InstallConfig {
    /// 安装目录
    pub install_dir: PathBuf,
    /// 服务监听地址（写入 unit 文件）
    pub host: String,
    /// 服务监听端口（写入 unit 文件）
    pub port: u16,
    /// 源获取方式：true = git clone + 构建，false = 复制当前二进制
    pub run_from_repo: bool,
    /// 仓库地址（repo 模式必填）
    pub repo_url: Option<String>,
    /// 仓库分支（可选）
    pub repo_branch: Option<String>,
}

impl InstallConfig {
    /// 从环境变量加载安装配置
    pub fn from_env() -> Self {
        let install_dir = env::var("INSTALL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_INSTALL_DIR));

        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let run_from_repo = env::var("RUN_FROM_REPO")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let repo_url = env::var("REPO_URL").ok().filter(|s| !s.is_empty());
        let repo_branch = env::var("REPO_BRANCH").ok().filter(|s| !s.is_empty());

        Self {
            install_dir,
            host,
            port,
            run_from_repo,
            repo_url,
            repo_branch,
        }
    }

    /// 安装后的可执行文件路径（copy 模式）
    pub fn installed_binary(&self) -> PathBuf {
        self.install_dir.join(constants::BINARY_NAME)
    }

    /// 安装后的可执行文件路径（repo 模式，release 构建产物）
    pub fn repo_binary(&self) -> PathBuf {
        self.install_dir
            .join("target")
            .join("release")
            .join(constants::BINARY_NAME)
    }
}

/// 解析 "0"/"1"/"true"/"false" 形式的环境变量开关
fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// 常量
pub mod constants {
    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 服务显示名
    pub const SERVICE_NAME: &str = "Roulette Tracker Prediction Server";

    /// systemd 单元名
    pub const SERVICE_UNIT: &str = "roulette.service";

    /// systemd 单元目录
    pub const UNIT_DIR: &str = "/etc/systemd/system";

    /// 可执行文件名
    pub const BINARY_NAME: &str = "roulette-tracker";

    /// 默认监听地址
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// 默认监听端口
    pub const DEFAULT_PORT: u16 = 8000;

    /// 默认安装目录
    pub const DEFAULT_INSTALL_DIR: &str = "/opt/roulette-tracker";

    /// 固定安装的系统包
    pub const OS_PACKAGES: &[&str] = &["git", "curl", "ca-certificates"];

    /// 状态探测前的等待时间（秒）
    pub const STATUS_PROBE_DELAY_SECS: u64 = 3;

    /// systemctl 调用超时（秒）
    pub const SYSTEMCTL_TIMEOUT_SECS: u64 = 30;

    /// apt-get 安装超时（秒）
    pub const APT_TIMEOUT_SECS: u64 = 600;

    /// git clone 超时（秒）
    pub const GIT_TIMEOUT_SECS: u64 = 600;

    /// release 构建超时（秒）- 30 分钟
    pub const BUILD_TIMEOUT_SECS: u64 = 1800;
}
