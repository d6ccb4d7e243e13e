//! Capabilities supplied by the embedding analyzer: validation oracle, diagnostic
//! sink, type construction and the runtime version.

use crate::calcsize::CalcsizeError;
use std::fmt;
use std::str::FromStr;

/// Source position of the call being analyzed. 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A user-visible error reported through a [`DiagnosticSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub location: Location,
}

/// Receives user-facing errors. Fire-and-forget.
pub trait DiagnosticSink {
    fn report(&mut self, message: String, location: Location);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, message: String, location: Location) {
        self.push(Diagnostic { message, location });
    }
}

/// Authoritative accept/reject check for a raw format string.
///
/// Returns the packed size on acceptance. Any `Err` is a rejection.
pub trait FormatOracle {
    fn validate(&self, fmt: &str) -> Result<usize, CalcsizeError>;
}

impl<F> FormatOracle for F
where
    F: Fn(&str) -> Result<usize, CalcsizeError>,
{
    fn validate(&self, fmt: &str) -> Result<usize, CalcsizeError> {
        self(fmt)
    }
}

/// Builds host types from a canonical name and generic arguments.
pub trait TypeFactory {
    type Type;

    fn named_generic_type(&self, name: &str, args: Vec<Self::Type>) -> Self::Type;
}

/// Factory that renders types as their names, e.g. `builtins.int` or `builtins.list[builtins.int]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeNames;

impl TypeFactory for TypeNames {
    type Type = String;

    fn named_generic_type(&self, name: &str, args: Vec<String>) -> String {
        if args.is_empty() {
            name.to_string()
        } else {
            format!("{}[{}]", name, args.join(", "))
        }
    }
}

/// Version of the runtime the analyzed program targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuntimeVersion {
    pub major: u8,
    pub minor: u8,
}

impl RuntimeVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        RuntimeVersion { major, minor }
    }

    /// 2.x runtimes represent byte sequences as `str`.
    pub fn is_legacy(self) -> bool {
        self.major < 3
    }
}

impl Default for RuntimeVersion {
    fn default() -> Self {
        RuntimeVersion::new(3, 12)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for RuntimeVersion {
    type Err = String;

    /// Accepts `3`, `3.11`, `2.7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let major = major
            .trim()
            .parse::<u8>()
            .map_err(|e| format!("runtime version {:?}: {}", s, e))?;
        let minor = minor
            .trim()
            .parse::<u8>()
            .map_err(|e| format!("runtime version {:?}: {}", s, e))?;
        Ok(RuntimeVersion::new(major, minor))
    }
}
