//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod install;
pub mod marks;
pub mod wheel;

// Re-exports for convenience
pub use install::{InstallReport, InstallStep, StepStatus};
pub use marks::{MarksRequest, MarksResponse, SpinDirection};
