//! 本地方法桥接层
//!
//! 五个入口点的实现由外部提供，按库名在进程内绑定一次：
//!
//! - 绑定前调用任何入口点都会返回 [`FixtureError::NotBound`]
//! - 同名重复绑定为幂等操作，不同库名的二次绑定返回 [`FixtureError::AlreadyBound`]
//! - 绑定失败是致命错误，调用方应中止启动
//!
//! 调用方只依赖 [`NativeMethods`]，不感知实现来自注册表还是动态库。

pub mod descriptor;
pub mod dynamic_loader;
pub mod registry;
pub mod table;

pub use descriptor::*;
pub use dynamic_loader::*;
pub use registry::*;
pub use table::*;

use crate::config::BridgeConfig;
use crate::{FixtureError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::{Lazy, OnceCell};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// 由外部实现的本地方法
#[cfg_attr(test, mockall::automock)]
pub trait NativeMethods: Send + Sync {
    /// `void fnord()`
    fn fnord(&self) -> Result<()>;

    /// `void fnord(int)`
    fn fnord_int(&self, i: i32) -> Result<()>;

    /// `void fnord(int, String)`
    fn fnord_int_text(&self, i: i32, s: &str) -> Result<()>;

    /// `String fnord2()`
    fn fnord2(&self) -> Result<String>;

    /// `String fnord2(int)`
    fn fnord2_int(&self, i: i32) -> Result<String>;
}

/// 实现来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSource {
    /// 进程内注册表
    Registry,
    /// 动态库文件
    DynamicLibrary(PathBuf),
}

/// 绑定结果
pub struct BoundLibrary {
    library: String,
    source: ProviderSource,
    table: NativeMethodTable,
    methods: Arc<dyn NativeMethods>,
    bound_at: DateTime<Utc>,
}

impl BoundLibrary {
    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn source(&self) -> &ProviderSource {
        &self.source
    }

    pub fn table(&self) -> &NativeMethodTable {
        &self.table
    }

    pub fn bound_at(&self) -> DateTime<Utc> {
        self.bound_at
    }

    /// 共享的实现
    pub fn methods(&self) -> Arc<dyn NativeMethods> {
        self.methods.clone()
    }
}

impl std::fmt::Debug for BoundLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundLibrary")
            .field("library", &self.library)
            .field("source", &self.source)
            .field("class_name", &self.table.class_name())
            .field("bound_at", &self.bound_at)
            .finish()
    }
}

/// 一次性绑定器
///
/// 进程级实例见 [`global`]；测试可创建独立实例。
#[derive(Debug)]
pub struct Binder {
    registry: ProviderRegistry,
    binding: OnceCell<Arc<BoundLibrary>>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// 带内置提供者的绑定器
    pub fn new() -> Self {
        Self::with_registry(ProviderRegistry::with_builtins())
    }

    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            binding: OnceCell::new(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// 按配置绑定
    ///
    /// 并发调用时只有一个解析过程会执行，其余调用观察到同一结果。
    pub fn bind(&self, config: &BridgeConfig) -> Result<Arc<BoundLibrary>> {
        let requested = config.library_name.as_str();
        let bound = self
            .binding
            .get_or_try_init(|| self.resolve(config).map(Arc::new))
            .map_err(|e| {
                error!("Native library '{}' failed to bind: {}", requested, e);
                e
            })?;

        if bound.library != requested {
            return Err(FixtureError::AlreadyBound {
                bound: bound.library.clone(),
                requested: requested.to_string(),
            });
        }
        Ok(bound.clone())
    }

    pub fn is_bound(&self) -> bool {
        self.binding.get().is_some()
    }

    pub fn bound_library(&self) -> Option<String> {
        self.binding.get().map(|b| b.library.clone())
    }

    /// 已绑定的库，未绑定时以 `method` 为名报错
    pub fn require(&self, method: &str) -> Result<Arc<BoundLibrary>> {
        self.binding
            .get()
            .cloned()
            .ok_or_else(|| FixtureError::not_bound(method))
    }

    pub fn bound(&self) -> Result<Arc<BoundLibrary>> {
        self.require("<bound>")
    }

    fn resolve(&self, config: &BridgeConfig) -> Result<BoundLibrary> {
        let library = config.library_name.as_str();
        let table = NativeMethodTable::standard(&config.class_name)
            .map_err(|e| FixtureError::bind(library, &e.to_string()))?;

        let (methods, source) = match self.registry.instantiate(library, &table) {
            Some(methods) => (methods?, ProviderSource::Registry),
            None => {
                // 当前目录始终最先搜索
                let mut loader = DynamicLoader::new();
                for path in &config.search_paths {
                    loader.add_search_path(path.clone());
                }
                let provider = loader.load(library, &table)?;
                let path = provider.path().to_path_buf();
                (
                    Arc::new(provider) as Arc<dyn NativeMethods>,
                    ProviderSource::DynamicLibrary(path),
                )
            }
        };

        info!(
            "🔗 Bound native library '{}' for class {} ({:?})",
            library,
            table.class_name(),
            source
        );
        Ok(BoundLibrary {
            library: library.to_string(),
            source,
            table,
            methods,
            bound_at: Utc::now(),
        })
    }
}

static GLOBAL: Lazy<Arc<Binder>> = Lazy::new(|| Arc::new(Binder::new()));

/// 进程级绑定器
pub fn global() -> Arc<Binder> {
    GLOBAL.clone()
}

/// 绑定进程级本地库
pub fn bind(config: &BridgeConfig) -> Result<Arc<BoundLibrary>> {
    GLOBAL.bind(config)
}

pub fn bound() -> Result<Arc<BoundLibrary>> {
    GLOBAL.bound()
}

pub fn is_bound() -> bool {
    GLOBAL.is_bound()
}

pub fn bound_library() -> Option<String> {
    GLOBAL.bound_library()
}

/// 延迟解析的本地方法桩
///
/// 每次调用时查找绑定，未绑定时返回 `NotBound`。
#[derive(Debug, Clone)]
pub struct NativeStub {
    binder: Arc<Binder>,
}

impl NativeStub {
    pub fn new(binder: Arc<Binder>) -> Self {
        Self { binder }
    }

    fn target(&self, method: &str) -> Result<Arc<dyn NativeMethods>> {
        Ok(self.binder.require(method)?.methods())
    }
}

impl NativeMethods for NativeStub {
    fn fnord(&self) -> Result<()> {
        self.target("fnord")?.fnord()
    }

    fn fnord_int(&self, i: i32) -> Result<()> {
        self.target("fnord")?.fnord_int(i)
    }

    fn fnord_int_text(&self, i: i32, s: &str) -> Result<()> {
        self.target("fnord")?.fnord_int_text(i, s)
    }

    fn fnord2(&self) -> Result<String> {
        self.target("fnord2")?.fnord2()
    }

    fn fnord2_int(&self, i: i32) -> Result<String> {
        self.target("fnord2")?.fnord2_int(i)
    }
}
