//! 进程内提供者注册表
//!
//! 按库名注册本地方法实现的工厂，绑定时优先于动态库搜索。

use super::table::NativeMethodTable;
use super::NativeMethods;
use crate::Result;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 提供者工厂
pub type ProviderFactory =
    Arc<dyn Fn(&NativeMethodTable) -> Result<Arc<dyn NativeMethods>> + Send + Sync>;

/// 内置回显提供者的库名，与默认库名不同，默认绑定会走动态库
pub const ECHO_LIBRARY: &str = "echo";

/// 提供者注册表
#[derive(Default)]
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带内置提供者的注册表
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(ECHO_LIBRARY, |table: &NativeMethodTable| {
            Ok(Arc::new(EchoProvider::new(table.class_name())) as Arc<dyn NativeMethods>)
        });
        registry
    }

    /// 注册工厂，同名覆盖
    pub fn register<F>(&self, library: &str, factory: F)
    where
        F: Fn(&NativeMethodTable) -> Result<Arc<dyn NativeMethods>> + Send + Sync + 'static,
    {
        let mut factories = self.factories.write();
        if factories.insert(library.to_string(), Arc::new(factory)).is_some() {
            debug!("Replaced native provider factory for '{}'", library);
        } else {
            info!("Registered native provider factory for '{}'", library);
        }
    }

    /// 注册固定实例
    pub fn register_instance(&self, library: &str, methods: Arc<dyn NativeMethods>) {
        self.register(library, move |_table: &NativeMethodTable| Ok(methods.clone()));
    }

    pub fn unregister(&self, library: &str) -> bool {
        self.factories.write().remove(library).is_some()
    }

    pub fn contains(&self, library: &str) -> bool {
        self.factories.read().contains_key(library)
    }

    pub fn libraries(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// 按库名实例化，未注册时返回 `None`
    pub fn instantiate(
        &self,
        library: &str,
        table: &NativeMethodTable,
    ) -> Option<Result<Arc<dyn NativeMethods>>> {
        // 先克隆工厂再调用，避免持锁执行外部代码
        let factory = self.factories.read().get(library).cloned()?;
        Some(factory(table))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("libraries", &self.libraries())
            .finish()
    }
}

/// 内置回显提供者
///
/// 记录每次调用，文本返回值为调用的可读形式。
#[derive(Debug)]
pub struct EchoProvider {
    class_name: String,
    calls: Mutex<Vec<String>>,
}

impl EchoProvider {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 已记录的调用
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> String {
        info!("{}.{}", self.class_name, call);
        self.calls.lock().push(call.clone());
        call
    }
}

impl NativeMethods for EchoProvider {
    fn fnord(&self) -> Result<()> {
        self.record("fnord()".to_string());
        Ok(())
    }

    fn fnord_int(&self, i: i32) -> Result<()> {
        self.record(format!("fnord({})", i));
        Ok(())
    }

    fn fnord_int_text(&self, i: i32, s: &str) -> Result<()> {
        self.record(format!("fnord({}, {:?})", i, s));
        Ok(())
    }

    fn fnord2(&self) -> Result<String> {
        Ok(self.record("fnord2()".to_string()))
    }

    fn fnord2_int(&self, i: i32) -> Result<String> {
        Ok(self.record(format!("fnord2({})", i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixtureError;

    #[test]
    fn test_builtins_registered() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.contains(ECHO_LIBRARY));
        assert_eq!(registry.libraries(), vec![ECHO_LIBRARY.to_string()]);
    }

    #[test]
    fn test_instantiate_unknown_library() {
        let registry = ProviderRegistry::new();
        let table = NativeMethodTable::standard("Test").unwrap();
        assert!(registry.instantiate("missing", &table).is_none());
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = ProviderRegistry::new();
        registry.register("broken", |_table: &NativeMethodTable| {
            Err(FixtureError::native("init failed"))
        });
        let table = NativeMethodTable::standard("Test").unwrap();
        let result = registry.instantiate("broken", &table).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_unregister() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.unregister(ECHO_LIBRARY));
        assert!(!registry.unregister(ECHO_LIBRARY));
        assert!(registry.libraries().is_empty());
    }

    #[test]
    fn test_echo_provider_records_calls() {
        let provider = EchoProvider::new("Test");
        provider.fnord().unwrap();
        provider.fnord_int(3).unwrap();
        provider.fnord_int_text(4, "x").unwrap();
        assert_eq!(provider.fnord2().unwrap(), "fnord2()");
        assert_eq!(provider.fnord2_int(5).unwrap(), "fnord2(5)");
        assert_eq!(
            provider.calls(),
            vec!["fnord()", "fnord(3)", "fnord(4, \"x\")", "fnord2()", "fnord2(5)"]
        );
    }
}
