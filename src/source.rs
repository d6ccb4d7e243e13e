//! Value extraction: find the statically-known format string of a call argument.
//!
//! A literal can come from two places: a literal type the analyzer narrowed the
//! argument to, or a literal expression written directly at the call site.
//! Anything else is dynamic and the decoder abstains.

/// Type names whose literals can carry a format string.
pub const FORMAT_LITERAL_TYPES: &[&str] = &["builtins.bytes", "builtins.str", "builtins.unicode"];

/// A literal text or bytes value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    Bytes(Vec<u8>),
}

impl Literal {
    /// Format text of the literal. Bytes map one-to-one onto chars (Latin-1).
    pub fn to_format(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Bytes(b) => b.iter().map(|&c| char::from(c)).collect(),
        }
    }
}

/// Inferred type of the argument, as far as extraction cares.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgType {
    /// Literal type with its fallback instance type, e.g. `Literal['3h']` of `builtins.str`.
    Literal { value: Literal, fallback: String },
    /// Instance type, possibly carrying the last literal value it was narrowed to.
    Instance {
        fullname: String,
        last_known_value: Option<Literal>,
    },
    /// Any other type.
    Other,
}

/// The argument expression as written at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    Str(String),
    Bytes(Vec<u8>),
    Unicode(String),
    /// Any non-literal expression (name, call, concatenation, ...).
    Dynamic,
}

/// Format-string argument of a pack/unpack call.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatArg {
    pub ty: ArgType,
    pub expr: ArgExpr,
}

impl FormatArg {
    /// Argument written directly as a text literal.
    pub fn literal(fmt: &str) -> Self {
        FormatArg {
            ty: ArgType::Literal {
                value: Literal::Str(fmt.to_string()),
                fallback: "builtins.str".to_string(),
            },
            expr: ArgExpr::Str(fmt.to_string()),
        }
    }

    /// Argument whose value is not statically known.
    pub fn dynamic() -> Self {
        FormatArg {
            ty: ArgType::Instance {
                fullname: "builtins.str".to_string(),
                last_known_value: None,
            },
            expr: ArgExpr::Dynamic,
        }
    }
}

/// Format-string value as seen by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSource {
    Known(String),
    Unknown,
}

impl FormatSource {
    /// Resolve an argument: narrowed literal type first, then literal expression.
    pub fn from_arg(arg: &FormatArg) -> FormatSource {
        literal_from_type(&arg.ty)
            .or_else(|| literal_from_expr(&arg.expr))
            .map_or(FormatSource::Unknown, FormatSource::Known)
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            FormatSource::Known(s) => Some(s),
            FormatSource::Unknown => None,
        }
    }
}

impl From<&str> for FormatSource {
    fn from(fmt: &str) -> Self {
        FormatSource::Known(fmt.to_string())
    }
}

impl From<&FormatArg> for FormatSource {
    fn from(arg: &FormatArg) -> Self {
        FormatSource::from_arg(arg)
    }
}

fn literal_from_type(ty: &ArgType) -> Option<String> {
    let (value, fallback) = match ty {
        ArgType::Literal { value, fallback } => (value, fallback),
        ArgType::Instance {
            fullname,
            last_known_value: Some(value),
        } => (value, fullname),
        _ => return None,
    };
    FORMAT_LITERAL_TYPES
        .contains(&fallback.as_str())
        .then(|| value.to_format())
}

fn literal_from_expr(expr: &ArgExpr) -> Option<String> {
    match expr {
        ArgExpr::Str(s) | ArgExpr::Unicode(s) => Some(s.clone()),
        ArgExpr::Bytes(b) => Some(Literal::Bytes(b.clone()).to_format()),
        ArgExpr::Dynamic => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_type_wins_over_expression() {
        let arg = FormatArg {
            ty: ArgType::Literal {
                value: Literal::Str("<2I".to_string()),
                fallback: "builtins.str".to_string(),
            },
            expr: ArgExpr::Dynamic,
        };
        assert_eq!(FormatSource::from_arg(&arg), FormatSource::Known("<2I".to_string()));
    }

    #[test]
    fn narrowed_instance_is_known() {
        let arg = FormatArg {
            ty: ArgType::Instance {
                fullname: "builtins.bytes".to_string(),
                last_known_value: Some(Literal::Bytes(b"3h".to_vec())),
            },
            expr: ArgExpr::Dynamic,
        };
        assert_eq!(FormatSource::from_arg(&arg).as_known(), Some("3h"));
    }

    #[test]
    fn literal_of_other_type_falls_back_to_expression() {
        let arg = FormatArg {
            ty: ArgType::Literal {
                value: Literal::Str("ignored".to_string()),
                fallback: "builtins.int".to_string(),
            },
            expr: ArgExpr::Bytes(b"?x".to_vec()),
        };
        assert_eq!(FormatSource::from_arg(&arg).as_known(), Some("?x"));
    }

    #[test]
    fn dynamic_is_unknown() {
        assert_eq!(FormatSource::from_arg(&FormatArg::dynamic()), FormatSource::Unknown);
        let other = FormatArg {
            ty: ArgType::Other,
            expr: ArgExpr::Dynamic,
        };
        assert_eq!(FormatSource::from(&other), FormatSource::Unknown);
    }

    #[test]
    fn high_bytes_map_to_latin1() {
        assert_eq!(Literal::Bytes(vec![b'h', 0xff]).to_format(), "h\u{ff}");
    }
}
