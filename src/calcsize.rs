//! Size computation with the packing library's acceptance rules.
//!
//! This is the default [`FormatOracle`]: a string is valid exactly when its size
//! can be computed. Rules:
//!
//! - An optional first character `@ = < > !` selects the mode. `@` (the default)
//!   uses native sizes and alignment; the others use standard sizes, no padding.
//! - ASCII whitespace between units is ignored. Whitespace between a repeat count
//!   and its code is a bad character.
//! - `n`, `N` and `P` exist only in native mode.
//! - Repeat counts on `s`/`p` are byte lengths; `x` is pad bytes.
//! - Sizes must fit in `isize`.

use crate::ast::ByteOrder;
use crate::host::FormatOracle;
use crate::parser::split_byte_order;
use std::ffi::{c_int, c_long, c_longlong, c_short, c_void};
use std::mem::{align_of, size_of};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalcsizeError {
    #[error("bad char in struct format: {0:?}")]
    BadChar(char),
    #[error("repeat count given without format specifier")]
    MissingCode,
    #[error("total struct size too long")]
    Overflow,
    #[error("format string must be ASCII")]
    NonAscii,
}

/// Size and alignment of one code in a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLayout {
    pub size: usize,
    pub align: usize,
}

impl CodeLayout {
    const fn of(size: usize, align: usize) -> Self {
        CodeLayout { size, align }
    }

    const fn byte() -> Self {
        CodeLayout::of(1, 1)
    }
}

/// Layout of `code` under `order`, or `None` if the code does not exist in that mode.
pub fn code_layout(code: char, order: ByteOrder) -> Option<CodeLayout> {
    if order.is_native_layout() {
        native_layout(code)
    } else {
        standard_layout(code)
    }
}

fn native_layout(code: char) -> Option<CodeLayout> {
    Some(match code {
        'x' | 'c' | 'b' | 'B' | '?' | 's' | 'p' => CodeLayout::byte(),
        'h' | 'H' | 'e' => CodeLayout::of(size_of::<c_short>(), align_of::<c_short>()),
        'i' | 'I' => CodeLayout::of(size_of::<c_int>(), align_of::<c_int>()),
        'l' | 'L' => CodeLayout::of(size_of::<c_long>(), align_of::<c_long>()),
        'q' | 'Q' => CodeLayout::of(size_of::<c_longlong>(), align_of::<c_longlong>()),
        'n' | 'N' => CodeLayout::of(size_of::<usize>(), align_of::<usize>()),
        'f' => CodeLayout::of(size_of::<f32>(), align_of::<f32>()),
        'd' => CodeLayout::of(size_of::<f64>(), align_of::<f64>()),
        'P' => CodeLayout::of(size_of::<*const c_void>(), align_of::<*const c_void>()),
        _ => return None,
    })
}

fn standard_layout(code: char) -> Option<CodeLayout> {
    let size = match code {
        'x' | 'c' | 'b' | 'B' | '?' | 's' | 'p' => 1,
        'h' | 'H' | 'e' => 2,
        'i' | 'I' | 'l' | 'L' | 'f' => 4,
        'q' | 'Q' | 'd' => 8,
        _ => return None,
    };
    Some(CodeLayout::of(size, 1))
}

/// One unit of a validated format, positioned in the packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutItem {
    pub code: char,
    pub count: usize,
    /// Byte offset of the first element.
    pub offset: usize,
    /// Size of one element.
    pub item_size: usize,
}

/// Validated format: mode, total packed size and positioned units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub byte_order: ByteOrder,
    pub size: usize,
    pub items: Vec<LayoutItem>,
}

/// Packed size of `fmt`, or why the packing library would reject it.
pub fn calcsize(fmt: &str) -> Result<usize, CalcsizeError> {
    layout(fmt).map(|l| l.size)
}

/// Validate `fmt` and compute the position of each unit.
pub fn layout(fmt: &str) -> Result<Layout, CalcsizeError> {
    if !fmt.is_ascii() {
        return Err(CalcsizeError::NonAscii);
    }
    let (marker, body) = split_byte_order(fmt);
    let byte_order = marker.unwrap_or(ByteOrder::Native);
    let body = body.as_bytes();

    let mut items = Vec::new();
    let mut size = 0usize;
    let mut i = 0;
    while i < body.len() {
        let c = body[i];
        i += 1;
        if is_space(c) {
            continue;
        }
        let (count, code) = if c.is_ascii_digit() {
            let mut num = usize::from(c - b'0');
            loop {
                match body.get(i) {
                    Some(&d) if d.is_ascii_digit() => {
                        num = checked_size(
                            num.checked_mul(10)
                                .and_then(|n| n.checked_add(usize::from(d - b'0'))),
                        )?;
                        i += 1;
                    }
                    Some(&d) => {
                        i += 1;
                        break (num, d);
                    }
                    None => return Err(CalcsizeError::MissingCode),
                }
            }
        } else {
            (1, c)
        };
        let code = char::from(code);
        let spec = code_layout(code, byte_order).ok_or(CalcsizeError::BadChar(code))?;
        if byte_order.is_native_layout() {
            size = checked_size(align_up(size, spec.align))?;
        }
        let total = checked_size(
            count
                .checked_mul(spec.size)
                .and_then(|n| n.checked_add(size)),
        )?;
        items.push(LayoutItem {
            code,
            count,
            offset: size,
            item_size: spec.size,
        });
        size = total;
    }

    Ok(Layout {
        byte_order,
        size,
        items,
    })
}

/// Whitespace as the packing library sees it (includes vertical tab).
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn align_up(size: usize, align: usize) -> Option<usize> {
    if align <= 1 {
        return Some(size);
    }
    size.checked_add(align - 1).map(|n| n / align * align)
}

fn checked_size(n: Option<usize>) -> Result<usize, CalcsizeError> {
    n.filter(|&n| n <= isize::MAX as usize)
        .ok_or(CalcsizeError::Overflow)
}

/// The packing library's own validation, used as the default oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calcsize;

impl FormatOracle for Calcsize {
    fn validate(&self, fmt: &str) -> Result<usize, CalcsizeError> {
        calcsize(fmt)
    }
}
