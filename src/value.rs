//! Runtime values produced by unpacking a buffer.

use crate::ast::SemanticType;
use crate::host::RuntimeVersion;

/// A single unpacked value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// Every integer code, signed or unsigned, up to 64 bits.
    Int(i128),
    Float(f64),
    /// `c`, `s` and `p` values.
    Bytes(Vec<u8>),
}

impl Value {
    /// Semantic type a static decoder should have inferred for this value.
    pub fn semantic_type(&self, runtime: RuntimeVersion) -> SemanticType {
        match self {
            Value::Bool(_) => SemanticType::Bool,
            Value::Int(_) => SemanticType::Int,
            Value::Float(_) => SemanticType::Float,
            Value::Bytes(_) if runtime.is_legacy() => SemanticType::Str,
            Value::Bytes(_) => SemanticType::Bytes,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}
