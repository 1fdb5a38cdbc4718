//! native_fixtures - 运行时夹具与本地方法桥接
//!
//! 由若干小型夹具组成，演示一次性绑定的本地方法桥接
//!
//! # 模块划分
//!
//! - **types**: 泛型二元组容器
//! - **workload**: 32 位 / 64 位试除法负载
//! - **fixtures**: 互相独立的夹具场景
//! - **bridge**: 本地方法接口、一次性绑定、注册表与动态库加载
//! - **config / runner**: 配置驱动的场景运行
//!
//! # 特性
//!
//! - **显式绑定**: 绑定是启动时的显式步骤，不依赖隐式静态初始化
//! - **失败即中止**: 绑定失败为致命错误，绑定前调用会明确报错
//! - **接口隔离**: 调用方只依赖 `NativeMethods` 接口

pub mod bridge;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod runner;
pub mod types;
pub mod workload;

// 重新导出核心类型
pub use bridge::{Binder, BoundLibrary, NativeMethods, NativeStub};
pub use error::*;
pub use fixtures::*;
pub use types::*;

use config::LoggingConfig;

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "native_fixtures";

/// 初始化日志系统
///
/// 重复调用时保留第一次安装的订阅者。
pub fn initialize(logging: &LoggingConfig) -> Result<()> {
    let level: tracing::Level = logging.level.into();
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }

    tracing::info!("🚀 Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    Ok(())
}
