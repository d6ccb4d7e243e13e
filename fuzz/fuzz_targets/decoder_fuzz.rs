//! Decoder fuzz target: decode arbitrary strings with the built-in oracle.
//! Must not panic or abort; huge repeat counts abstain instead of allocating,
//! and a decoded format must unpack a zeroed buffer of its size.
//! Build with: cargo fuzz run decoder_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let mut sink: Vec<packfmt::Diagnostic> = Vec::new();
    let mut ctx = packfmt::DecodeContext::new(
        packfmt::RuntimeVersion::default(),
        packfmt::Location::default(),
        &mut sink,
    );
    let result = packfmt::FormatDecoder::new().decode(&packfmt::FormatSource::from(s), &mut ctx);
    if let Some(types) = result.types() {
        assert!(types.len() <= packfmt::DEFAULT_MAX_TYPES);
        // Keep unpack buffers small; pad and string codes can still ask for huge sizes.
        if let Ok(size) = packfmt::calcsize(s) {
            if size <= 1 << 16 {
                let values = packfmt::unpack(s, &vec![0u8; size]).expect("valid format unpacks");
                assert_eq!(values.len(), types.len());
            }
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decoder_fuzz");
}
