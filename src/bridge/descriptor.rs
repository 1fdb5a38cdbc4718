//! 方法描述符与本地符号名
//!
//! 解析 `(ILjava/lang/String;)V` 形式的方法描述符，并按 JNI 规则生成
//! 本地实现的导出符号名（短名 `Java_<类>_<方法>`，重载长名附加 `__<参数>`）。

use crate::{FixtureError, Result};
use std::fmt::{self, Display};
use std::str::FromStr;

/// 字段类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    /// 对象类型，内部名使用 `/` 分隔，如 `java/lang/String`
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// `java/lang/String`
    pub fn string() -> Self {
        FieldType::Object("java/lang/String".to_string())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, FieldType::Object(name) if name == "java/lang/String")
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => write!(f, "B"),
            FieldType::Char => write!(f, "C"),
            FieldType::Double => write!(f, "D"),
            FieldType::Float => write!(f, "F"),
            FieldType::Int => write!(f, "I"),
            FieldType::Long => write!(f, "J"),
            FieldType::Short => write!(f, "S"),
            FieldType::Boolean => write!(f, "Z"),
            FieldType::Object(name) => write!(f, "L{};", name),
            FieldType::Array(component) => write!(f, "[{}", component),
        }
    }
}

/// 返回类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Value(FieldType),
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => write!(f, "V"),
            ReturnType::Value(field) => write!(f, "{}", field),
        }
    }
}

/// 方法描述符
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: ReturnType,
}

impl MethodDescriptor {
    pub fn new(parameters: Vec<FieldType>, return_type: ReturnType) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut parser = DescriptorParser {
            source: descriptor,
            bytes: descriptor.as_bytes(),
            pos: 0,
        };
        parser.method()
    }

    /// 参数部分的原始串，不含括号
    pub fn parameter_signature(&self) -> String {
        self.parameters.iter().map(|p| p.to_string()).collect()
    }
}

impl Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.parameter_signature(), self.return_type)
    }
}

impl FromStr for MethodDescriptor {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

struct DescriptorParser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DescriptorParser<'a> {
    fn error(&self, message: &str) -> FixtureError {
        FixtureError::descriptor(self.source, &format!("{} at offset {}", message, self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn method(&mut self) -> Result<MethodDescriptor> {
        self.expect(b'(')?;
        let mut parameters = Vec::new();
        while self.peek() != Some(b')') {
            if self.peek().is_none() {
                return Err(self.error("unterminated parameter list"));
            }
            parameters.push(self.field()?);
        }
        self.expect(b')')?;

        let return_type = if self.peek() == Some(b'V') {
            self.pos += 1;
            ReturnType::Void
        } else {
            ReturnType::Value(self.field()?)
        };

        if self.pos != self.bytes.len() {
            return Err(self.error("trailing characters"));
        }
        Ok(MethodDescriptor::new(parameters, return_type))
    }

    fn field(&mut self) -> Result<FieldType> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end"))?;
        self.pos += 1;
        let field = match tag {
            b'B' => FieldType::Byte,
            b'C' => FieldType::Char,
            b'D' => FieldType::Double,
            b'F' => FieldType::Float,
            b'I' => FieldType::Int,
            b'J' => FieldType::Long,
            b'S' => FieldType::Short,
            b'Z' => FieldType::Boolean,
            b'[' => FieldType::Array(Box::new(self.field()?)),
            b'L' => {
                let start = self.pos;
                let end = self.bytes[start..]
                    .iter()
                    .position(|&b| b == b';')
                    .map(|offset| start + offset)
                    .ok_or_else(|| self.error("unterminated class name"))?;
                if end == start {
                    return Err(self.error("empty class name"));
                }
                self.pos = end + 1;
                FieldType::Object(self.source[start..end].to_string())
            }
            b'V' => {
                self.pos -= 1;
                return Err(self.error("void is only valid as a return type"));
            }
            other => {
                self.pos -= 1;
                return Err(self.error(&format!("unknown type tag '{}'", other as char)));
            }
        };
        Ok(field)
    }
}

/// 类名规范化：`.` 替换为 `/`
pub fn internal_class_name(class_name: &str) -> String {
    class_name.replace('.', "/")
}

/// 按 JNI 规则转义名称片段
pub fn mangle(component: &str) -> String {
    let mut mangled = String::with_capacity(component.len());
    for ch in component.chars() {
        match ch {
            '/' | '.' => mangled.push('_'),
            '_' => mangled.push_str("_1"),
            ';' => mangled.push_str("_2"),
            '[' => mangled.push_str("_3"),
            c if c.is_ascii_alphanumeric() => mangled.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    mangled.push_str(&format!("_0{:04x}", unit));
                }
            }
        }
    }
    mangled
}

/// 短符号名：`Java_<类>_<方法>`
pub fn short_symbol_name(class_name: &str, method: &str) -> String {
    format!(
        "Java_{}_{}",
        mangle(&internal_class_name(class_name)),
        mangle(method)
    )
}

/// 重载长符号名：`Java_<类>_<方法>__<参数>`
pub fn long_symbol_name(class_name: &str, method: &str, descriptor: &MethodDescriptor) -> String {
    format!(
        "{}__{}",
        short_symbol_name(class_name, method),
        mangle(&descriptor.parameter_signature())
    )
}
