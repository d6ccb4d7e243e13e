//! Data model for the format-string mini-language: byte-order markers, type codes,
//! parsed units and the semantic types they map to.

use crate::host::RuntimeVersion;
use std::fmt;

/// Leading byte-order/alignment marker. At most one, only at the start of the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `@`: native byte order, native sizes and alignment (also the default).
    Native,
    /// `=`: native byte order, standard sizes, no alignment.
    NativeStandard,
    /// `<`
    Little,
    /// `>`
    Big,
    /// `!`: network order, same layout as `>`.
    Network,
}

impl ByteOrder {
    pub fn from_marker(c: char) -> Option<ByteOrder> {
        match c {
            '@' => Some(ByteOrder::Native),
            '=' => Some(ByteOrder::NativeStandard),
            '<' => Some(ByteOrder::Little),
            '>' => Some(ByteOrder::Big),
            '!' => Some(ByteOrder::Network),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            ByteOrder::Native => '@',
            ByteOrder::NativeStandard => '=',
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
            ByteOrder::Network => '!',
        }
    }

    /// Only `@` uses native sizes and inserts alignment padding.
    pub fn is_native_layout(self) -> bool {
        self == ByteOrder::Native
    }
}

/// Canonical value kind a type code produces, before the runtime picks a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    Bool,
    Int,
    Float,
    ByteSequence,
}

impl Canonical {
    /// Resolve to a semantic type. Byte sequences are `bytes` on 3.x and `str` on 2.x.
    pub fn resolve(self, runtime: RuntimeVersion) -> SemanticType {
        match self {
            Canonical::Bool => SemanticType::Bool,
            Canonical::Int => SemanticType::Int,
            Canonical::Float => SemanticType::Float,
            Canonical::ByteSequence if runtime.is_legacy() => SemanticType::Str,
            Canonical::ByteSequence => SemanticType::Bytes,
        }
    }
}

/// How a unit of a given code contributes to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// Pad byte: no output regardless of the repeat count.
    Pad,
    /// One value per repeat.
    PerRepeat(Canonical),
    /// Exactly one value; the repeat count is a byte length.
    Single(Canonical),
}

/// Type code → output kind. Covers every code the packing library accepts.
pub const CODE_TABLE: &[(char, CodeKind)] = &[
    ('x', CodeKind::Pad),
    ('?', CodeKind::PerRepeat(Canonical::Bool)),
    ('e', CodeKind::PerRepeat(Canonical::Float)),
    ('f', CodeKind::PerRepeat(Canonical::Float)),
    ('d', CodeKind::PerRepeat(Canonical::Float)),
    ('b', CodeKind::PerRepeat(Canonical::Int)),
    ('B', CodeKind::PerRepeat(Canonical::Int)),
    ('h', CodeKind::PerRepeat(Canonical::Int)),
    ('H', CodeKind::PerRepeat(Canonical::Int)),
    ('i', CodeKind::PerRepeat(Canonical::Int)),
    ('I', CodeKind::PerRepeat(Canonical::Int)),
    ('l', CodeKind::PerRepeat(Canonical::Int)),
    ('L', CodeKind::PerRepeat(Canonical::Int)),
    ('q', CodeKind::PerRepeat(Canonical::Int)),
    ('Q', CodeKind::PerRepeat(Canonical::Int)),
    ('n', CodeKind::PerRepeat(Canonical::Int)),
    ('N', CodeKind::PerRepeat(Canonical::Int)),
    ('P', CodeKind::PerRepeat(Canonical::Int)),
    ('c', CodeKind::PerRepeat(Canonical::ByteSequence)),
    ('s', CodeKind::Single(Canonical::ByteSequence)),
    ('p', CodeKind::Single(Canonical::ByteSequence)),
];

/// A single type code character as it appeared in the format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode(pub char);

impl TypeCode {
    pub fn as_char(self) -> char {
        self.0
    }

    /// Table entry for this code, or `None` if the code is outside the table.
    pub fn kind(self) -> Option<CodeKind> {
        CODE_TABLE
            .iter()
            .find(|(c, _)| *c == self.0)
            .map(|&(_, kind)| kind)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One parsed token: optional repeat count followed by a type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatUnit {
    pub count: Option<usize>,
    pub code: TypeCode,
}

impl FormatUnit {
    /// Repeat count, 1 when absent.
    pub fn repeat(&self) -> usize {
        self.count.unwrap_or(1)
    }
}

/// Output type of one decoded value, named by its canonical identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Bool,
    Int,
    Float,
    Bytes,
    Str,
}

impl SemanticType {
    /// Fully-qualified name the host type system materializes.
    pub fn canonical_name(self) -> &'static str {
        match self {
            SemanticType::Bool => "builtins.bool",
            SemanticType::Int => "builtins.int",
            SemanticType::Float => "builtins.float",
            SemanticType::Bytes => "builtins.bytes",
            SemanticType::Str => "builtins.str",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}
