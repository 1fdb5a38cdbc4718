//! 测试夹具
//!
//! 三个互相独立的试除法夹具（32 位、64 位、带可变字段的 64 位），
//! 以及依赖本地库绑定的本地方法夹具。

use crate::bridge::{Binder, NativeMethods};
use crate::config::DEFAULT_BOUND;
use crate::workload::{testfunc_narrow, testfunc_wide, CounterTrace};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// 32 位累加的夹具
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowFixture {
    bound: i32,
}

impl NarrowFixture {
    /// 上界按 32 位截断重新解释
    pub fn new(bound: i64) -> Self {
        Self {
            bound: bound as i32,
        }
    }

    pub fn bound(&self) -> i32 {
        self.bound
    }

    pub fn testfunc(&self, max: i32, trace: &mut dyn CounterTrace) -> i32 {
        testfunc_narrow(max, trace)
    }

    pub fn test(&self, trace: &mut dyn CounterTrace) -> i32 {
        debug!("NarrowFixture::test bound={}", self.bound);
        self.testfunc(self.bound, trace)
    }
}

impl Default for NarrowFixture {
    fn default() -> Self {
        Self::new(DEFAULT_BOUND)
    }
}

/// 64 位累加的夹具
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideFixture {
    bound: i64,
}

impl WideFixture {
    pub fn new(bound: i64) -> Self {
        Self { bound }
    }

    pub fn bound(&self) -> i64 {
        self.bound
    }

    pub fn testfunc(&self, max: i64, trace: &mut dyn CounterTrace) -> i64 {
        testfunc_wide(max, trace)
    }

    pub fn test(&self, trace: &mut dyn CounterTrace) -> i64 {
        debug!("WideFixture::test bound={}", self.bound);
        self.testfunc(self.bound, trace)
    }
}

impl Default for WideFixture {
    fn default() -> Self {
        Self::new(DEFAULT_BOUND)
    }
}

/// 初始字段值
pub const INITIAL_I: i32 = 42;

/// 带可变字段 `i` 的 64 位夹具
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterFixture {
    pub i: i32,
    bound: i64,
}

impl CounterFixture {
    pub fn new(bound: i64) -> Self {
        Self {
            i: INITIAL_I,
            bound,
        }
    }

    /// `i += b`，32 位回绕
    pub fn add_to_i(&mut self, b: i32) {
        self.i = self.i.wrapping_add(b);
    }

    pub fn testfunc(&self, max: i64, trace: &mut dyn CounterTrace) -> i64 {
        testfunc_wide(max, trace)
    }

    pub fn test(&self, trace: &mut dyn CounterTrace) -> i64 {
        debug!("CounterFixture::test bound={} i={}", self.bound, self.i);
        self.testfunc(self.bound, trace)
    }
}

impl Default for CounterFixture {
    fn default() -> Self {
        Self::new(DEFAULT_BOUND)
    }
}

/// 依赖本地库绑定的夹具
///
/// 只能在绑定成功后构造，所有实例共享同一实现。
#[derive(Clone)]
pub struct NativeFixture {
    methods: Arc<dyn NativeMethods>,
}

impl NativeFixture {
    /// 从绑定器获取实现，未绑定时返回 `NotBound`
    pub fn new(binder: &Binder) -> Result<Self> {
        let bound = binder.require("NativeFixture::new")?;
        Ok(Self {
            methods: bound.methods(),
        })
    }

    pub fn from_methods(methods: Arc<dyn NativeMethods>) -> Self {
        Self { methods }
    }

    pub fn fnord(&self) -> Result<()> {
        self.methods.fnord()
    }

    pub fn fnord_int(&self, i: i32) -> Result<()> {
        self.methods.fnord_int(i)
    }

    pub fn fnord_int_text(&self, i: i32, s: &str) -> Result<()> {
        self.methods.fnord_int_text(i, s)
    }

    pub fn fnord2(&self) -> Result<String> {
        self.methods.fnord2()
    }

    pub fn fnord2_int(&self, i: i32) -> Result<String> {
        self.methods.fnord2_int(i)
    }

    /// 依次调用全部五个入口点，返回可读的调用记录
    pub fn exercise(&self, i: i32, s: &str) -> Result<Vec<String>> {
        let mut log = Vec::with_capacity(5);

        self.fnord()?;
        log.push("fnord()".to_string());

        self.fnord_int(i)?;
        log.push(format!("fnord({})", i));

        self.fnord_int_text(i, s)?;
        log.push(format!("fnord({}, {:?})", i, s));

        log.push(format!("fnord2() -> {:?}", self.fnord2()?));
        log.push(format!("fnord2({}) -> {:?}", i, self.fnord2_int(i)?));

        Ok(log)
    }
}

impl std::fmt::Debug for NativeFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFixture").finish_non_exhaustive()
    }
}
