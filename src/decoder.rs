//! Decode a format string into the ordered types its pack/unpack call yields.
//!
//! Three phases: extract the literal ([`FormatSource`]), validate it with the
//! oracle and tokenize it ([`crate::parser`]), then map each unit through
//! [`CODE_TABLE`](crate::ast::CODE_TABLE) expanding repeat counts.

use crate::ast::{CodeKind, FormatUnit, SemanticType};
use crate::calcsize::Calcsize;
use crate::host::{DiagnosticSink, FormatOracle, Location, RuntimeVersion, TypeFactory};
use crate::parser;
use crate::source::{FormatArg, FormatSource};
use tracing::{debug, trace};

/// Outcome of decoding one format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult<T = SemanticType> {
    /// Types in source order; may be empty.
    Types(Vec<T>),
    /// Format not statically known. No diagnostic was emitted.
    Unknown,
    /// Format rejected by the oracle. One diagnostic was emitted.
    Invalid,
}

impl<T> DecodeResult<T> {
    pub fn types(&self) -> Option<&[T]> {
        match self {
            DecodeResult::Types(types) => Some(types),
            DecodeResult::Unknown | DecodeResult::Invalid => None,
        }
    }

    /// `Unknown` and `Invalid` both mean "no type information".
    pub fn into_types(self) -> Option<Vec<T>> {
        match self {
            DecodeResult::Types(types) => Some(types),
            DecodeResult::Unknown | DecodeResult::Invalid => None,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> DecodeResult<U> {
        match self {
            DecodeResult::Types(types) => DecodeResult::Types(types.into_iter().map(&mut f).collect()),
            DecodeResult::Unknown => DecodeResult::Unknown,
            DecodeResult::Invalid => DecodeResult::Invalid,
        }
    }
}

impl DecodeResult<SemanticType> {
    /// Turn semantic types into host types.
    pub fn materialize<F: TypeFactory>(self, factory: &F) -> DecodeResult<F::Type> {
        self.map(|ty| factory.named_generic_type(ty.canonical_name(), Vec::new()))
    }
}

/// Per-call context supplied by the host.
pub struct DecodeContext<'a> {
    pub runtime: RuntimeVersion,
    pub location: Location,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> DecodeContext<'a> {
    pub fn new(runtime: RuntimeVersion, location: Location, sink: &'a mut dyn DiagnosticSink) -> Self {
        DecodeContext {
            runtime,
            location,
            sink,
        }
    }

    fn fail(&mut self, message: String) {
        self.sink.report(message, self.location);
    }
}

/// Upper bound on the number of types one format may expand to.
///
/// Repeat counts up to `isize::MAX` are valid, so a short literal can ask for
/// more values than fit in memory. Past this bound the decoder abstains.
pub const DEFAULT_MAX_TYPES: usize = 1 << 16;

/// Format-string decoder over an injected validation oracle.
#[derive(Debug, Clone)]
pub struct FormatDecoder<O = Calcsize> {
    oracle: O,
    max_types: usize,
}

impl FormatDecoder<Calcsize> {
    /// Decoder using the built-in [`Calcsize`] oracle.
    pub fn new() -> Self {
        FormatDecoder::with_oracle(Calcsize)
    }
}

impl Default for FormatDecoder<Calcsize> {
    fn default() -> Self {
        FormatDecoder::new()
    }
}

impl<O: FormatOracle> FormatDecoder<O> {
    pub fn with_oracle(oracle: O) -> Self {
        FormatDecoder {
            oracle,
            max_types: DEFAULT_MAX_TYPES,
        }
    }

    /// Abstain with `Unknown` when a format expands to more than `max_types` values.
    pub fn with_max_types(mut self, max_types: usize) -> Self {
        self.max_types = max_types;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn max_types(&self) -> usize {
        self.max_types
    }

    /// Decode a resolved format source.
    ///
    /// A valid format that expands past [`max_types`](Self::max_types) values
    /// yields `Unknown` without a diagnostic.
    ///
    /// # Panics
    ///
    /// If the oracle accepts a string containing a type code outside the code
    /// table, or a repeat count that does not fit in `usize`. Both mean the oracle
    /// and the table have drifted apart.
    pub fn decode(&self, source: &FormatSource, ctx: &mut DecodeContext<'_>) -> DecodeResult {
        let fmt = match source {
            FormatSource::Known(fmt) => fmt,
            FormatSource::Unknown => {
                debug!(location = %ctx.location, "format string is not statically known");
                return DecodeResult::Unknown;
            }
        };

        if let Err(e) = self.oracle.validate(fmt) {
            debug!(format = ?fmt, error = %e, "format rejected by oracle");
            ctx.fail(format!("Invalid format string: \"{}\"", fmt));
            return DecodeResult::Invalid;
        }

        let parsed = parser::parse(fmt)
            .unwrap_or_else(|e| panic!("format {:?} accepted by oracle but not tokenizable: {}", fmt, e));
        trace!(format = ?fmt, units = parsed.units.len(), "tokenized");

        match expand_units(&parsed.units, ctx.runtime, self.max_types) {
            Some(types) => {
                debug!(format = ?fmt, count = types.len(), "decoded format");
                DecodeResult::Types(types)
            }
            None => {
                debug!(format = ?fmt, max_types = self.max_types, "format expands past the type limit");
                DecodeResult::Unknown
            }
        }
    }

    /// Extract the literal from a call argument, then decode it.
    pub fn decode_arg(&self, arg: &FormatArg, ctx: &mut DecodeContext<'_>) -> DecodeResult {
        self.decode(&FormatSource::from_arg(arg), ctx)
    }

    /// Decode and materialize in one step; `None` when nothing is known.
    pub fn infer_types<F: TypeFactory>(
        &self,
        arg: &FormatArg,
        ctx: &mut DecodeContext<'_>,
        factory: &F,
    ) -> Option<Vec<F::Type>> {
        self.decode_arg(arg, ctx).materialize(factory).into_types()
    }
}

/// Map units to semantic types: pads dropped, string codes once, others per repeat.
///
/// Returns `None` when the expansion would exceed `max_types` or cannot be allocated.
pub fn expand_units(units: &[FormatUnit], runtime: RuntimeVersion, max_types: usize) -> Option<Vec<SemanticType>> {
    let mut kinds = Vec::with_capacity(units.len());
    let mut total = 0usize;
    for unit in units {
        let kind = unit.code.kind().unwrap_or_else(|| {
            panic!("type code {:?} accepted by oracle has no type mapping", unit.code.as_char())
        });
        let n = match kind {
            CodeKind::Pad => 0,
            CodeKind::Single(_) => 1,
            CodeKind::PerRepeat(_) => unit.repeat(),
        };
        total = total.checked_add(n).filter(|&t| t <= max_types)?;
        kinds.push((kind, n));
    }

    let mut out = Vec::new();
    out.try_reserve_exact(total).ok()?;
    for (kind, n) in kinds {
        match kind {
            CodeKind::Pad => {}
            CodeKind::Single(canonical) | CodeKind::PerRepeat(canonical) => {
                out.extend(std::iter::repeat(canonical.resolve(runtime)).take(n));
            }
        }
    }
    Some(out)
}
