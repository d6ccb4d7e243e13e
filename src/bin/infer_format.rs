//! Infer the value types of pack/unpack format strings.
//!
//! Usage:
//!   infer_format [OPTIONS] [FORMAT ...]
//!   infer_format < formats.txt
//!
//! Each format is printed with the types its unpack call yields, or `unknown`
//! when it is rejected. Rejected formats are reported as errors on stderr.
//!
//! Options:
//!   --runtime X.Y, -r X.Y   Target runtime version (default 3.12). 2.x maps byte strings to `str`.
//!   --human, -H             Human-readable output
//!
//! If no formats are given, reads one per line from stdin. Exit code 1 if any format is invalid.
//! Set `RUST_LOG=packfmt=debug` for decoder tracing.

use anyhow::Context;
use packfmt::{DecodeContext, DecodeResult, Diagnostic, FormatDecoder, FormatSource, Location, RuntimeVersion, TypeNames};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

fn print_result(fmt: &str, result: &DecodeResult<String>, style: OutputStyle) {
    let rendered = match result {
        DecodeResult::Types(types) => format!("({})", types.join(", ")),
        DecodeResult::Unknown | DecodeResult::Invalid => "unknown".to_string(),
    };
    match style {
        OutputStyle::Compact => println!("{:?}: {}", fmt, rendered),
        OutputStyle::Human => {
            println!("  format {:?}", fmt);
            match result {
                DecodeResult::Types(types) => {
                    println!("    {} value(s)", types.len());
                    for (i, ty) in types.iter().enumerate() {
                        println!("    [{}] {}", i, ty);
                    }
                }
                _ => println!("    {}", rendered),
            }
        }
    }
}

fn print_diagnostic(source: &str, d: &Diagnostic) {
    eprintln!("{}:{}: error: {}", source, d.location, d.message);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let runtime = if let Some(pos) = args.iter().position(|a| a == "--runtime" || a == "-r") {
        args.remove(pos);
        if pos >= args.len() {
            anyhow::bail!("--runtime requires a version, e.g. --runtime 2.7");
        }
        let value = args.remove(pos);
        value
            .parse::<RuntimeVersion>()
            .map_err(anyhow::Error::msg)
            .context("invalid --runtime")?
    } else {
        RuntimeVersion::default()
    };
    let style = if let Some(pos) = args.iter().position(|a| a == "--human" || a == "-H") {
        args.remove(pos);
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };

    let (source_name, formats) = if args.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        let lines = src.lines().map(str::to_string).collect::<Vec<_>>();
        ("<stdin>", lines)
    } else {
        ("<args>", args)
    };

    let decoder = FormatDecoder::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut invalid = 0usize;
    for (i, fmt) in formats.iter().enumerate() {
        let result = {
            let mut ctx = DecodeContext::new(runtime, Location::new(i + 1, 1), &mut diagnostics);
            decoder.decode(&FormatSource::from(fmt.as_str()), &mut ctx)
        };
        if result == DecodeResult::Invalid {
            invalid += 1;
        }
        print_result(fmt, &result.materialize(&TypeNames), style);
    }

    for d in &diagnostics {
        print_diagnostic(source_name, d);
    }
    if invalid > 0 {
        eprintln!("infer_format: {} invalid format(s)", invalid);
        std::process::exit(1);
    }
    Ok(())
}
