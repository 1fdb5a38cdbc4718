//! 核心数据类型模块
//!
//! 目前只有泛型二元组容器

pub mod pair;

// 重新导出所有公共类型
pub use pair::*;
