//! 错误处理系统
//!
//! 统一的错误类型和错误处理机制

use thiserror::Error;

/// 统一错误类型
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to bind native library '{library}': {message}")]
    Bind { library: String, message: String },

    #[error("Native method '{method}' called before the native library was bound")]
    NotBound { method: String },

    #[error("Native library '{bound}' is already bound, refusing to bind '{requested}'")]
    AlreadyBound { bound: String, requested: String },

    #[error("Symbol '{symbol}' not found in native library '{library}'")]
    SymbolMissing { library: String, symbol: String },

    #[error("Invalid method descriptor '{descriptor}': {message}")]
    Descriptor { descriptor: String, message: String },

    #[error("Native error: {message}")]
    Native { message: String },

    #[error("Scenario error: {message}")]
    Scenario { message: String },
}

impl FixtureError {
    /// 创建配置相关错误
    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }

    /// 创建绑定相关错误
    pub fn bind(library: &str, message: &str) -> Self {
        Self::Bind {
            library: library.to_string(),
            message: message.to_string(),
        }
    }

    /// 创建未绑定错误
    pub fn not_bound(method: &str) -> Self {
        Self::NotBound {
            method: method.to_string(),
        }
    }

    /// 创建描述符相关错误
    pub fn descriptor(descriptor: &str, message: &str) -> Self {
        Self::Descriptor {
            descriptor: descriptor.to_string(),
            message: message.to_string(),
        }
    }

    /// 创建本地调用相关错误
    pub fn native(message: &str) -> Self {
        Self::Native {
            message: message.to_string(),
        }
    }

    /// 创建场景相关错误
    pub fn scenario(message: &str) -> Self {
        Self::Scenario {
            message: message.to_string(),
        }
    }

    /// 是否为绑定阶段的致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Bind { .. } | Self::AlreadyBound { .. } | Self::SymbolMissing { .. }
        )
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, FixtureError>;
