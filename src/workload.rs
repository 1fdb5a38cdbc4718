//! 试除法循环负载
//!
//! 对 `0..max` 的每个计数器做朴素试除，找到第一个因子时把计数器累加进结果。
//! 累加器从 -1 开始，按所选整数宽度回绕。

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::trace;

/// 累加器初始值
pub const INITIAL_ACCUMULATOR: i64 = -1;

/// 计数器宽度抽象
pub trait Counter: Copy + Ord + Display {
    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;
    const INITIAL: Self;

    fn wrapping_add(self, other: Self) -> Self;
    fn is_divisible_by(self, divisor: Self) -> bool;
    fn as_i64(self) -> i64;
}

macro_rules! impl_counter {
    ($($ty:ty),*) => {
        $(
            impl Counter for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const TWO: Self = 2;
                const INITIAL: Self = -1;

                fn wrapping_add(self, other: Self) -> Self {
                    <$ty>::wrapping_add(self, other)
                }

                fn is_divisible_by(self, divisor: Self) -> bool {
                    self % divisor == 0
                }

                fn as_i64(self) -> i64 {
                    self as i64
                }
            }
        )*
    };
}

impl_counter!(i32, i64);

/// 计数器追踪输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    /// 每次迭代打印计数器到标准输出
    Stdout,
    /// 以 trace 级别日志事件输出
    #[default]
    Tracing,
    /// 不输出
    Silent,
}

/// 计数器追踪接收端
pub trait CounterTrace {
    fn counter(&mut self, value: i64);
}

impl<F: FnMut(i64)> CounterTrace for F {
    fn counter(&mut self, value: i64) {
        self(value)
    }
}

/// 打印到标准输出
#[derive(Debug, Default)]
pub struct StdoutTrace;

impl CounterTrace for StdoutTrace {
    fn counter(&mut self, value: i64) {
        println!("{}", value);
    }
}

/// 输出为 tracing 事件
#[derive(Debug, Default)]
pub struct TracingTrace;

impl CounterTrace for TracingTrace {
    fn counter(&mut self, value: i64) {
        trace!(counter = value, "trial division step");
    }
}

/// 丢弃所有追踪
#[derive(Debug, Default)]
pub struct SilentTrace;

impl CounterTrace for SilentTrace {
    fn counter(&mut self, _value: i64) {}
}

/// 收集追踪值
#[derive(Debug, Default)]
pub struct CollectingTrace {
    pub values: Vec<i64>,
}

impl CounterTrace for CollectingTrace {
    fn counter(&mut self, value: i64) {
        self.values.push(value);
    }
}

impl TraceMode {
    /// 根据模式创建接收端
    pub fn sink(self) -> Box<dyn CounterTrace> {
        match self {
            TraceMode::Stdout => Box::new(StdoutTrace),
            TraceMode::Tracing => Box::new(TracingTrace),
            TraceMode::Silent => Box::new(SilentTrace),
        }
    }
}

/// 试除法累加
///
/// 计数器 0、1、2 不会进入内层扫描，因此不参与累加。
pub fn testfunc<C: Counter>(max: C, trace: &mut dyn CounterTrace) -> C {
    let mut accumulator = C::INITIAL;
    let mut i = C::ZERO;
    while i < max {
        let mut k = C::TWO;
        while k < i {
            if i.is_divisible_by(k) {
                accumulator = accumulator.wrapping_add(i);
                break;
            }
            k = k.wrapping_add(C::ONE);
        }
        trace.counter(i.as_i64());
        i = i.wrapping_add(C::ONE);
    }
    accumulator
}

/// 32 位宽度的试除法累加
pub fn testfunc_narrow(max: i32, trace: &mut dyn CounterTrace) -> i32 {
    testfunc(max, trace)
}

/// 64 位宽度的试除法累加
pub fn testfunc_wide(max: i64, trace: &mut dyn CounterTrace) -> i64 {
    testfunc(max, trace)
}
