//! Decoder tests through the public API: call-site scenarios, abstention, and
//! properties of the decoded type sequence.

use packfmt::{
    ArgExpr, ArgType, CalcsizeError, DecodeContext, DecodeResult, Diagnostic, DiagnosticSink, FormatArg,
    FormatDecoder, FormatOracle, FormatSource, Literal, Location, RuntimeVersion, SemanticType, TypeFactory,
    TypeNames, DEFAULT_MAX_TYPES,
};
use std::cell::Cell;

use packfmt::SemanticType::{Bool, Bytes, Float, Int, Str};

const PY3: RuntimeVersion = RuntimeVersion::new(3, 11);
const PY2: RuntimeVersion = RuntimeVersion::new(2, 7);

fn decode_with<O: FormatOracle>(
    decoder: &FormatDecoder<O>,
    source: &FormatSource,
    runtime: RuntimeVersion,
) -> (DecodeResult, Vec<Diagnostic>) {
    let mut sink: Vec<Diagnostic> = Vec::new();
    let result = {
        let mut ctx = DecodeContext::new(runtime, Location::new(7, 12), &mut sink);
        decoder.decode(source, &mut ctx)
    };
    (result, sink)
}

fn decode(fmt: &str) -> (DecodeResult, Vec<Diagnostic>) {
    decode_with(&FormatDecoder::new(), &FormatSource::from(fmt), PY3)
}

fn types(fmt: &str) -> Vec<SemanticType> {
    let (result, diagnostics) = decode(fmt);
    assert!(diagnostics.is_empty(), "{:?}: unexpected diagnostics {:?}", fmt, diagnostics);
    result.into_types().unwrap_or_else(|| panic!("{:?} should decode", fmt))
}

// ==================== Scenarios ====================

#[test]
fn repeat_count_expands() {
    assert_eq!(types("3h"), vec![Int, Int, Int]);
}

#[test]
fn string_code_is_one_value() {
    assert_eq!(types("10s"), vec![Bytes]);
    assert_eq!(types("255p"), vec![Bytes]);
}

#[test]
fn pad_and_space_are_dropped() {
    assert_eq!(types("?bx f"), vec![Bool, Int, Float]);
}

#[test]
fn little_endian_marker() {
    assert_eq!(types("<2I"), vec![Int, Int]);
}

#[test]
fn malformed_format_is_invalid() {
    let (result, diagnostics) = decode("3Z");
    assert_eq!(result, DecodeResult::Invalid);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("\"3Z\""), "{}", diagnostics[0].message);
    assert_eq!(diagnostics[0].location, Location::new(7, 12));
}

#[test]
fn dynamic_format_is_unknown() {
    let decoder = FormatDecoder::new();
    let (result, diagnostics) = decode_with(&decoder, &FormatSource::from(&FormatArg::dynamic()), PY3);
    assert_eq!(result, DecodeResult::Unknown);
    assert!(diagnostics.is_empty());
}

#[test]
fn empty_format_decodes_to_no_types() {
    assert_eq!(types(""), Vec::<SemanticType>::new());
    assert_eq!(types("!"), Vec::<SemanticType>::new());
    assert_eq!(types("4x"), Vec::<SemanticType>::new());
}

#[test]
fn every_code_family() {
    assert_eq!(
        types("?efdbBhHiIlLqQnNPc"),
        vec![
            Bool, Float, Float, Float, Int, Int, Int, Int, Int, Int, Int, Int, Int, Int, Int, Int, Int, Bytes
        ]
    );
}

#[test]
fn char_code_repeats_unlike_strings() {
    assert_eq!(types("3c"), vec![Bytes, Bytes, Bytes]);
    assert_eq!(types("3s"), vec![Bytes]);
}

#[test]
fn legacy_runtime_byte_strings_are_str() {
    let (result, _) = decode_with(&FormatDecoder::new(), &FormatSource::from("2c4s?"), PY2);
    assert_eq!(result, DecodeResult::Types(vec![Str, Str, Str, Bool]));
}

#[test]
fn rejected_by_library_rules() {
    for fmt in ["<n", "3 h", "12", "<<h", "h\u{e9}"] {
        let (result, diagnostics) = decode(fmt);
        assert_eq!(result, DecodeResult::Invalid, "{:?}", fmt);
        assert_eq!(diagnostics.len(), 1, "{:?}", fmt);
    }
}

// ==================== Value extraction ====================

#[test]
fn narrowed_bytes_literal_is_decoded() {
    let arg = FormatArg {
        ty: ArgType::Instance {
            fullname: "builtins.bytes".to_string(),
            last_known_value: Some(Literal::Bytes(b">HH".to_vec())),
        },
        expr: ArgExpr::Dynamic,
    };
    let mut sink: Vec<Diagnostic> = Vec::new();
    let mut ctx = DecodeContext::new(PY3, Location::default(), &mut sink);
    let result = FormatDecoder::new().decode_arg(&arg, &mut ctx);
    assert_eq!(result, DecodeResult::Types(vec![Int, Int]));
}

#[test]
fn unicode_literal_expression_is_decoded() {
    let arg = FormatArg {
        ty: ArgType::Other,
        expr: ArgExpr::Unicode("d".to_string()),
    };
    let mut sink: Vec<Diagnostic> = Vec::new();
    let mut ctx = DecodeContext::new(PY2, Location::default(), &mut sink);
    let result = FormatDecoder::new().decode_arg(&arg, &mut ctx);
    assert_eq!(result, DecodeResult::Types(vec![Float]));
}

#[test]
fn infer_types_materializes_through_factory() {
    let mut sink: Vec<Diagnostic> = Vec::new();
    let mut ctx = DecodeContext::new(PY3, Location::default(), &mut sink);
    let inferred = FormatDecoder::new().infer_types(&FormatArg::literal("<?d3s"), &mut ctx, &TypeNames);
    assert_eq!(
        inferred,
        Some(vec![
            "builtins.bool".to_string(),
            "builtins.float".to_string(),
            "builtins.bytes".to_string(),
        ])
    );
    let none = FormatDecoder::new().infer_types(&FormatArg::dynamic(), &mut ctx, &TypeNames);
    assert_eq!(none, None);
}

// ==================== Injected collaborators ====================

/// Oracle that rejects everything and counts calls.
struct RejectAll {
    calls: Cell<usize>,
}

impl FormatOracle for RejectAll {
    fn validate(&self, fmt: &str) -> Result<usize, CalcsizeError> {
        self.calls.set(self.calls.get() + 1);
        Err(CalcsizeError::BadChar(fmt.chars().next().unwrap_or(' ')))
    }
}

#[test]
fn oracle_is_authoritative() {
    let decoder = FormatDecoder::with_oracle(RejectAll { calls: Cell::new(0) });
    let (result, diagnostics) = decode_with(&decoder, &FormatSource::from("3h"), PY3);
    assert_eq!(result, DecodeResult::Invalid);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(decoder.oracle().calls.get(), 1);
}

#[test]
fn oracle_not_consulted_for_unknown() {
    let decoder = FormatDecoder::with_oracle(RejectAll { calls: Cell::new(0) });
    let (result, diagnostics) = decode_with(&decoder, &FormatSource::Unknown, PY3);
    assert_eq!(result, DecodeResult::Unknown);
    assert!(diagnostics.is_empty());
    assert_eq!(decoder.oracle().calls.get(), 0);
}

#[test]
fn permissive_oracle_lets_tokenizer_skip_noise() {
    // The tokenizer never rejects: with an oracle that accepts anything, stray
    // characters are skipped and only well-formed units contribute.
    let decoder = FormatDecoder::with_oracle(|_: &str| -> Result<usize, CalcsizeError> { Ok(0) });
    let (result, diagnostics) = decode_with(&decoder, &FormatSource::from("2h#$ 5 ?"), PY3);
    assert_eq!(result, DecodeResult::Types(vec![Int, Int, Bool]));
    assert!(diagnostics.is_empty());
}

/// Sink that only counts.
#[derive(Default)]
struct CountingSink {
    count: usize,
    last: Option<String>,
}

impl DiagnosticSink for CountingSink {
    fn report(&mut self, message: String, _location: Location) {
        self.count += 1;
        self.last = Some(message);
    }
}

#[test]
fn custom_sink_receives_single_message() {
    let mut sink = CountingSink::default();
    {
        let mut ctx = DecodeContext::new(PY3, Location::default(), &mut sink);
        let decoder = FormatDecoder::new();
        assert_eq!(decoder.decode(&FormatSource::from("q!"), &mut ctx), DecodeResult::Invalid);
        assert_eq!(decoder.decode(&FormatSource::from("q"), &mut ctx), DecodeResult::Types(vec![Int]));
    }
    assert_eq!(sink.count, 1);
    assert_eq!(sink.last.as_deref(), Some("Invalid format string: \"q!\""));
}

/// Host type representation with generic arguments.
#[derive(Debug, Clone, PartialEq)]
struct HostType {
    name: String,
    args: Vec<HostType>,
}

struct HostFactory;

impl TypeFactory for HostFactory {
    type Type = HostType;

    fn named_generic_type(&self, name: &str, args: Vec<HostType>) -> HostType {
        HostType {
            name: name.to_string(),
            args,
        }
    }
}

#[test]
fn materialize_uses_canonical_names() {
    let (result, _) = decode("i?");
    let host = result.materialize(&HostFactory);
    let names: Vec<_> = host.types().expect("types").iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["builtins.int", "builtins.bool"]);
    assert!(host.types().expect("types").iter().all(|t| t.args.is_empty()));
}

// ==================== Properties ====================

const VALID_FORMATS: &[&str] = &[
    "", "x", "3h", "10s", "?bx f", "<2I", ">0s0p0h", "=q5xQ", "@nNP", "!  2e 3d", "4c2s7p", "<12?", "iIlL",
];

fn expected_len(fmt: &str) -> usize {
    let units = packfmt::parse(fmt).expect("parse").units;
    units
        .iter()
        .map(|u| match u.code.as_char() {
            'x' => 0,
            's' | 'p' => 1,
            _ => u.repeat(),
        })
        .sum()
}

#[test]
fn length_matches_expanded_units() {
    for fmt in VALID_FORMATS {
        assert_eq!(types(fmt).len(), expected_len(fmt), "{:?}", fmt);
    }
}

#[test]
fn byte_order_marker_does_not_affect_types() {
    for body in ["2h", "?bx f", "3s4c", "e"] {
        let plain = types(body);
        for marker in ['<', '>', '!', '=', '@'] {
            assert_eq!(types(&format!("{}{}", marker, body)), plain, "{}{}", marker, body);
        }
    }
}

#[test]
fn decode_is_idempotent() {
    let decoder = FormatDecoder::new();
    for fmt in VALID_FORMATS.iter().chain(["3Z", "3"].iter()) {
        for runtime in [PY2, PY3] {
            let first = decode_with(&decoder, &FormatSource::from(*fmt), runtime);
            let second = decode_with(&decoder, &FormatSource::from(*fmt), runtime);
            assert_eq!(first, second, "{:?}", fmt);
        }
    }
}

// ==================== Large repeat counts ====================

#[test]
fn huge_repeat_count_abstains_without_diagnostic() {
    let (result, diagnostics) = decode("9000000000000000000?");
    assert_eq!(result, DecodeResult::Unknown);
    assert!(diagnostics.is_empty());
}

#[test]
fn counts_near_isize_max_are_valid_but_not_expanded() {
    // Packed sizes of exactly isize::MAX bytes pass the library's rules.
    for fmt in ["9223372036854775807?", "<4611686018427387903h", "!2305843009213693951i"] {
        assert!(packfmt::calcsize(fmt).is_ok(), "{:?}", fmt);
        let (result, diagnostics) = decode(fmt);
        assert_eq!(result, DecodeResult::Unknown, "{:?}", fmt);
        assert!(diagnostics.is_empty(), "{:?}", fmt);
    }
}

#[test]
fn pad_and_string_codes_with_huge_counts_stay_cheap() {
    assert_eq!(types("9223372036854775807x"), Vec::<SemanticType>::new());
    assert_eq!(types("9223372036854775807s"), vec![Bytes]);
    assert_eq!(types("9223372036854775807p"), vec![Bytes]);
    assert_eq!(types("<9223372036854775806x?"), vec![Bool]);
}

#[test]
fn type_limit_is_inclusive_and_configurable() {
    assert_eq!(FormatDecoder::new().max_types(), DEFAULT_MAX_TYPES);
    assert_eq!(types(&format!("{}B", DEFAULT_MAX_TYPES)).len(), DEFAULT_MAX_TYPES);
    assert_eq!(decode(&format!("{}B", DEFAULT_MAX_TYPES + 1)).0, DecodeResult::Unknown);

    let decoder = FormatDecoder::new().with_max_types(3);
    let (result, _) = decode_with(&decoder, &FormatSource::from("3h4x"), PY3);
    assert_eq!(result, DecodeResult::Types(vec![Int, Int, Int]));
    let (result, diagnostics) = decode_with(&decoder, &FormatSource::from("2h10s?"), PY3);
    assert_eq!(result, DecodeResult::Unknown);
    assert!(diagnostics.is_empty());
}

#[test]
fn non_ascii_diagnostic_shows_literal_text() {
    let (result, diagnostics) = decode("h\u{e9}");
    assert_eq!(result, DecodeResult::Invalid);
    assert_eq!(diagnostics[0].message, "Invalid format string: \"h\u{e9}\"");
}

#[test]
fn decoder_is_shareable_across_threads() {
    let decoder = FormatDecoder::new();
    std::thread::scope(|s| {
        for fmt in ["3h", "10s", "<2I"] {
            let decoder = &decoder;
            s.spawn(move || {
                let (result, diagnostics) = decode_with(decoder, &FormatSource::from(fmt), PY3);
                assert!(result.types().is_some());
                assert!(diagnostics.is_empty());
            });
        }
    });
}
