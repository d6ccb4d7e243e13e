//! # packfmt — Static types for binary pack/unpack format strings
//!
//! Given a format string known at analysis time (as used by binary-struct-packing
//! libraries), compute the ordered list of value types the pack/unpack call
//! yields, so an analyzer can type-check call sites without running them.
//!
//! ## Format language
//!
//! - Optional leading byte-order marker: `@` native (default), `=` native order
//!   with standard sizes, `<` little, `>` big, `!` network
//! - Units: optional decimal repeat count followed by a type code
//! - `?` bool; `e f d` float; `b B h H i I l L q Q n N P` int; `c` one byte
//! - `s`, `p`: the count is a length and the unit yields one byte string
//! - `x`: pad byte, yields nothing
//!
//! ## Outcomes
//!
//! [`FormatDecoder::decode`] returns a [`DecodeResult`]:
//!
//! - `Types(..)`: one entry per value, in source order
//! - `Unknown`: the format is not statically known; nothing reported
//! - `Invalid`: the [`FormatOracle`] rejected the format; one diagnostic reported
//!
//! ## Example
//!
//! ```
//! use packfmt::{DecodeContext, DecodeResult, Diagnostic, FormatDecoder, FormatSource, Location,
//!     RuntimeVersion, SemanticType};
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let mut ctx = DecodeContext::new(RuntimeVersion::new(3, 12), Location::new(1, 1), &mut diagnostics);
//! let result = FormatDecoder::new().decode(&FormatSource::from("<2I10s"), &mut ctx);
//! assert_eq!(
//!     result,
//!     DecodeResult::Types(vec![SemanticType::Int, SemanticType::Int, SemanticType::Bytes])
//! );
//! ```

pub mod ast;
pub mod calcsize;
pub mod codec;
pub mod decoder;
pub mod host;
pub mod parser;
pub mod source;
pub mod value;

pub use ast::{ByteOrder, Canonical, CodeKind, FormatUnit, SemanticType, TypeCode, CODE_TABLE};
pub use calcsize::{calcsize, Calcsize, CalcsizeError};
pub use codec::{unpack, CodecError};
pub use decoder::{expand_units, DecodeContext, DecodeResult, FormatDecoder, DEFAULT_MAX_TYPES};
pub use host::{Diagnostic, DiagnosticSink, FormatOracle, Location, RuntimeVersion, TypeFactory, TypeNames};
pub use parser::parse;
pub use source::{ArgExpr, ArgType, FormatArg, FormatSource, Literal};
pub use value::Value;
