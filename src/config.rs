//! 配置管理系统
//!
//! 支持 YAML / TOML / JSON 配置文件驱动的场景运行

use crate::runner::Scenario;
use crate::workload::TraceMode;
use crate::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 夹具内置的负载上界
///
/// `0xcafebabe` 作为 32 位有符号数读取后再符号扩展，各宽度下均为负数。
pub const DEFAULT_BOUND: i64 = 0xcafe_babe_u32 as i32 as i64;

/// 配置文件中的默认负载上界
pub const DEFAULT_WORKLOAD_BOUND: i64 = 10_000;

/// 默认本地库名
pub const DEFAULT_LIBRARY: &str = "fnord";

/// 默认声明类名
pub const DEFAULT_CLASS: &str = "Test";

/// 顶层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// 本地库绑定配置
    pub bridge: BridgeConfig,
    /// 负载配置
    pub workload: WorkloadConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 本地库绑定配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 库名，按平台规则映射为文件名
    pub library_name: String,
    /// 声明本地方法的类名，用于推导导出符号
    pub class_name: String,
    /// 动态库搜索路径，按顺序查找
    pub search_paths: Vec<PathBuf>,
    /// 绑定失败时是否中止启动
    pub required: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_name: DEFAULT_LIBRARY.to_string(),
            class_name: DEFAULT_CLASS.to_string(),
            search_paths: vec![
                PathBuf::from("."),
                PathBuf::from("target/debug"),
                PathBuf::from("target/release"),
            ],
            required: true,
        }
    }
}

/// 负载配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadConfig {
    /// 试除法上界，配置 `narrow` 场景时不得超过 `i32::MAX`
    pub bound: i64,
    /// 计数器追踪方式
    pub trace: TraceMode,
    /// 要运行的场景
    pub scenarios: Vec<String>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            bound: DEFAULT_WORKLOAD_BOUND,
            trace: TraceMode::Tracing,
            scenarios: Scenario::ALL.iter().map(|s| s.name().to_string()).collect(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFileFormat {
    /// 按扩展名推断格式
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFileFormat::Yaml),
            Some("toml") => Ok(ConfigFileFormat::Toml),
            Some("json") => Ok(ConfigFileFormat::Json),
            _ => Err(FixtureError::config(&format!(
                "Unsupported config file extension: {:?}",
                path
            ))),
        }
    }
}

/// 配置管理器
#[derive(Debug, Default)]
pub struct ConfigManager {
    config: FixtureConfig,
}

impl ConfigManager {
    /// 从文件加载配置
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFileFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FixtureError::config(&format!("Failed to read config file {:?}: {}", path, e)))?;

        let config = Self::parse(&content, format)?;
        Ok(Self { config })
    }

    /// 解析配置文本
    pub fn parse(content: &str, format: ConfigFileFormat) -> Result<FixtureConfig> {
        let config: FixtureConfig = match format {
            ConfigFileFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFileFormat::Toml => toml::from_str(content)?,
            ConfigFileFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// 创建默认配置
    pub fn new_default() -> Self {
        Self::default()
    }

    pub fn from_config(config: FixtureConfig) -> Self {
        Self { config }
    }

    /// 保存配置到文件
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFileFormat::from_path(path)? {
            ConfigFileFormat::Yaml => serde_yaml::to_string(&self.config)?,
            ConfigFileFormat::Toml => toml::to_string_pretty(&self.config)?,
            ConfigFileFormat::Json => serde_json::to_string_pretty(&self.config)?,
        };

        tokio::fs::write(path, content)
            .await
            .map_err(|e| FixtureError::config(&format!("Failed to write config file {:?}: {}", path, e)))?;

        Ok(())
    }

    /// 获取配置
    pub fn get_config(&self) -> &FixtureConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut FixtureConfig {
        &mut self.config
    }

    /// 解析后的场景列表
    pub fn scenarios(&self) -> Result<Vec<Scenario>> {
        self.config
            .workload
            .scenarios
            .iter()
            .map(|name| Scenario::from_str(name))
            .collect()
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let bridge = &self.config.bridge;
        if bridge.library_name.trim().is_empty() {
            return Err(FixtureError::config("Library name cannot be empty"));
        }

        if bridge.library_name.contains(['/', '\\']) {
            return Err(FixtureError::config(
                "Library name must be a bare name, use search_paths for directories",
            ));
        }

        if bridge.class_name.trim().is_empty() {
            return Err(FixtureError::config("Class name cannot be empty"));
        }

        if self.config.workload.bound < 0 {
            return Err(FixtureError::config("Workload bound cannot be negative"));
        }

        if self.config.workload.scenarios.is_empty() {
            return Err(FixtureError::config("At least one scenario must be configured"));
        }

        let scenarios = self.scenarios()?;
        if scenarios.contains(&Scenario::Narrow) && self.config.workload.bound > i32::MAX as i64 {
            return Err(FixtureError::config(&format!(
                "Workload bound {} exceeds the 32-bit range of the narrow scenario",
                self.config.workload.bound
            )));
        }

        tracing::info!("Configuration validation passed");
        Ok(())
    }
}

/// 生成默认配置文件
pub async fn generate_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let config_manager = ConfigManager::new_default();
    config_manager.save_to_file(path).await?;
    Ok(())
}
