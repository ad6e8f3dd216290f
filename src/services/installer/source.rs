//! Source acquisition
//!
//! Two ways to place the service files into the install directory,
//! selected by `RUN_FROM_REPO`:
//! - copy mode: copy the currently-running executable
//! - repo mode: clone the repository and build a release binary

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::env::constants::{BUILD_TIMEOUT_SECS, GIT_TIMEOUT_SECS};
use crate::config::InstallConfig;
use crate::infra::command::CommandRunner;

use super::InstallError;

/// Copy the running executable into the install directory
pub async fn install_current_binary(config: &InstallConfig) -> Result<PathBuf, InstallError> {
    let source = std::env::current_exe()?;
    let target = config.installed_binary();

    tracing::info!(
        source = %source.display(),
        target = %target.display(),
        "Copying service binary"
    );

    tokio::fs::copy(&source, &target).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).await?;
    }

    Ok(target)
}

/// Clone the configured repository into the install directory
pub async fn clone_repo(config: &InstallConfig, cancel: CancellationToken) -> Result<(), InstallError> {
    let repo_url = config.repo_url.as_deref().ok_or(InstallError::MissingRepoUrl)?;
    let target = config.install_dir.display().to_string();

    let mut args = vec!["clone", "--depth", "1"];
    if let Some(ref branch) = config.repo_branch {
        args.push("--branch");
        args.push(branch);
    }
    args.push(repo_url);
    args.push(&target);

    tracing::info!(repo = %repo_url, target = %target, "Cloning repository");

    let result = CommandRunner::run_logged(
        "git",
        &args,
        &[],
        Path::new("/"),
        cancel,
        Duration::from_secs(GIT_TIMEOUT_SECS),
    )
    .await?;

    if result.status.success() {
        Ok(())
    } else {
        Err(InstallError::StepFailed {
            step: "fetch_source".to_string(),
            detail: format!("git clone exited with {:?}", result.status.code()),
        })
    }
}

/// Build a release binary inside the cloned repository
pub async fn build_release(
    config: &InstallConfig,
    cancel: CancellationToken,
) -> Result<PathBuf, InstallError> {
    tracing::info!(work_dir = %config.install_dir.display(), "Building release binary");

    let result = CommandRunner::run_logged(
        "cargo",
        &["build", "--release"],
        &[],
        &config.install_dir,
        cancel,
        Duration::from_secs(BUILD_TIMEOUT_SECS),
    )
    .await?;

    if !result.status.success() {
        return Err(InstallError::StepFailed {
            step: "build_release".to_string(),
            detail: format!("cargo build exited with {:?}", result.status.code()),
        });
    }

    let binary = config.repo_binary();
    if !binary.exists() {
        return Err(InstallError::StepFailed {
            step: "build_release".to_string(),
            detail: format!("expected binary missing: {}", binary.display()),
        });
    }

    Ok(binary)
}
