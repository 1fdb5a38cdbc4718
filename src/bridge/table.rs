//! 本地方法声明表
//!
//! 五个由外部实现提供的入口点及其描述符、访问标志。

use crate::bridge::descriptor::{long_symbol_name, MethodDescriptor};
use crate::{FixtureError, Result};
use serde::{Deserialize, Serialize};

/// 访问标志
pub mod access {
    pub const PUBLIC: u16 = 0x0001;
    pub const NATIVE: u16 = 0x0100;
}

/// 入口点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryPoint {
    /// `void fnord()`
    Fnord,
    /// `void fnord(int)`
    FnordInt,
    /// `void fnord(int, String)`
    FnordIntText,
    /// `String fnord2()`
    Fnord2,
    /// `String fnord2(int)`
    Fnord2Int,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 5] = [
        EntryPoint::Fnord,
        EntryPoint::FnordInt,
        EntryPoint::FnordIntText,
        EntryPoint::Fnord2,
        EntryPoint::Fnord2Int,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            EntryPoint::Fnord | EntryPoint::FnordInt | EntryPoint::FnordIntText => "fnord",
            EntryPoint::Fnord2 | EntryPoint::Fnord2Int => "fnord2",
        }
    }

    pub fn descriptor(self) -> &'static str {
        match self {
            EntryPoint::Fnord => "()V",
            EntryPoint::FnordInt => "(I)V",
            EntryPoint::FnordIntText => "(ILjava/lang/String;)V",
            EntryPoint::Fnord2 => "()Ljava/lang/String;",
            EntryPoint::Fnord2Int => "(I)Ljava/lang/String;",
        }
    }
}

/// 已声明的本地方法
#[derive(Debug, Clone)]
pub struct NativeMethod {
    pub entry: EntryPoint,
    pub name: String,
    pub descriptor: MethodDescriptor,
    pub flags: u16,
}

impl NativeMethod {
    pub fn is_native(&self) -> bool {
        self.flags & access::NATIVE != 0
    }

    pub fn is_public(&self) -> bool {
        self.flags & access::PUBLIC != 0
    }

    /// 在给定类下的导出符号名
    pub fn symbol_name(&self, class_name: &str) -> String {
        long_symbol_name(class_name, &self.name, &self.descriptor)
    }
}

/// 本地方法表
#[derive(Debug, Clone)]
pub struct NativeMethodTable {
    class_name: String,
    methods: Vec<NativeMethod>,
}

impl NativeMethodTable {
    /// 标准的五个入口点
    pub fn standard(class_name: &str) -> Result<Self> {
        let methods = EntryPoint::ALL
            .iter()
            .map(|&entry| {
                Ok(NativeMethod {
                    entry,
                    name: entry.method_name().to_string(),
                    descriptor: MethodDescriptor::parse(entry.descriptor())?,
                    flags: access::PUBLIC | access::NATIVE,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let table = Self {
            class_name: class_name.to_string(),
            methods,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn methods(&self) -> &[NativeMethod] {
        &self.methods
    }

    pub fn get(&self, entry: EntryPoint) -> Option<&NativeMethod> {
        self.methods.iter().find(|m| m.entry == entry)
    }

    /// 每个入口点对应的导出符号
    pub fn symbols(&self) -> Vec<(EntryPoint, String)> {
        self.methods
            .iter()
            .map(|m| (m.entry, m.symbol_name(&self.class_name)))
            .collect()
    }

    /// 校验所有条目均声明为 native 且描述符与入口点一致
    pub fn validate(&self) -> Result<()> {
        if self.class_name.is_empty() {
            return Err(FixtureError::config("Native method table requires a class name"));
        }
        for method in &self.methods {
            if !method.is_native() {
                return Err(FixtureError::native(&format!(
                    "{}{} is not declared native",
                    method.name, method.descriptor
                )));
            }
            if method.descriptor.to_string() != method.entry.descriptor() {
                return Err(FixtureError::descriptor(
                    &method.descriptor.to_string(),
                    &format!("does not match entry point {:?}", method.entry),
                ));
            }
        }
        Ok(())
    }
}
