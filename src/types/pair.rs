//! 泛型二元组容器
//!
//! 持有两个同类型的值，支持文本渲染和求和

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// 可求和的元素类型
///
/// 整数按补码回绕相加，字符串为拼接。
pub trait Summable {
    fn sum_with(&self, other: &Self) -> Self;
}

macro_rules! impl_wrapping_summable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Summable for $ty {
                fn sum_with(&self, other: &Self) -> Self {
                    self.wrapping_add(*other)
                }
            }
        )*
    };
}

impl_wrapping_summable!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Summable for f32 {
    fn sum_with(&self, other: &Self) -> Self {
        self + other
    }
}

impl Summable for f64 {
    fn sum_with(&self, other: &Self) -> Self {
        self + other
    }
}

impl Summable for String {
    fn sum_with(&self, other: &Self) -> Self {
        let mut joined = String::with_capacity(self.len() + other.len());
        joined.push_str(self);
        joined.push_str(other);
        joined
    }
}

/// 二元组
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair<T> {
    first: T,
    second: T,
}

impl<T> Pair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &T {
        &self.first
    }

    pub fn second(&self) -> &T {
        &self.second
    }

    pub fn into_inner(self) -> (T, T) {
        (self.first, self.second)
    }
}

impl<T: Summable> Pair<T> {
    /// 按元素类型的加法合并两个值
    pub fn sum(&self) -> T {
        self.first.sum_with(&self.second)
    }
}

impl<T: Display> Display for Pair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.first, self.second)
    }
}

impl<T> From<(T, T)> for Pair<T> {
    fn from((first, second): (T, T)) -> Self {
        Self::new(first, second)
    }
}
