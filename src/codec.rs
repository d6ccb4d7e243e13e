//! Unpack binary buffers according to a format string.
//!
//! Reference implementation of the packing library's `unpack`: the buffer must be
//! exactly [`calcsize`](crate::calcsize::calcsize) bytes long. Native mode reads in
//! host byte order with native alignment.

use crate::ast::ByteOrder;
use crate::calcsize::{layout, CalcsizeError, LayoutItem};
use crate::value::Value;
use byteorder::{BigEndian, LittleEndian, NativeEndian, ReadBytesExt};
use std::io::{Cursor, Read};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid format: {0}")]
    Format(#[from] CalcsizeError),
    #[error("unpack requires a buffer of {expected} bytes (got {actual})")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Unpack `bytes` according to `fmt`.
pub fn unpack(fmt: &str, bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
    let layout = layout(fmt)?;
    if bytes.len() != layout.size {
        return Err(CodecError::SizeMismatch {
            expected: layout.size,
            actual: bytes.len(),
        });
    }
    let mut out = Vec::new();
    for item in &layout.items {
        match layout.byte_order {
            ByteOrder::Little => unpack_item::<LittleEndian>(bytes, item, &mut out)?,
            ByteOrder::Big | ByteOrder::Network => unpack_item::<BigEndian>(bytes, item, &mut out)?,
            ByteOrder::Native | ByteOrder::NativeStandard => {
                unpack_item::<NativeEndian>(bytes, item, &mut out)?
            }
        }
    }
    Ok(out)
}

fn unpack_item<E: byteorder::ByteOrder>(
    bytes: &[u8],
    item: &LayoutItem,
    out: &mut Vec<Value>,
) -> Result<(), CodecError> {
    let mut r = Cursor::new(bytes);
    r.set_position(item.offset as u64);
    match item.code {
        'x' => {}
        's' => {
            let mut buf = vec![0u8; item.count];
            r.read_exact(&mut buf)?;
            out.push(Value::Bytes(buf));
        }
        'p' => {
            let mut buf = vec![0u8; item.count];
            r.read_exact(&mut buf)?;
            // First byte is the length, capped by the field width.
            let len = match buf.first() {
                Some(&n) => usize::from(n).min(item.count - 1),
                None => 0,
            };
            out.push(Value::Bytes(buf.get(1..1 + len).unwrap_or_default().to_vec()));
        }
        code => {
            for _ in 0..item.count {
                out.push(read_scalar::<E>(&mut r, code, item.item_size)?);
            }
        }
    }
    Ok(())
}

fn read_scalar<E: byteorder::ByteOrder>(
    r: &mut Cursor<&[u8]>,
    code: char,
    size: usize,
) -> Result<Value, CodecError> {
    Ok(match code {
        'c' => Value::Bytes(vec![r.read_u8()?]),
        '?' => Value::Bool(r.read_u8()? != 0),
        'b' | 'h' | 'i' | 'l' | 'q' | 'n' => Value::Int(i128::from(r.read_int::<E>(size)?)),
        'B' | 'H' | 'I' | 'L' | 'Q' | 'N' | 'P' => Value::Int(i128::from(r.read_uint::<E>(size)?)),
        'e' => Value::Float(half_to_f64(r.read_u16::<E>()?)),
        'f' => Value::Float(f64::from(r.read_f32::<E>()?)),
        'd' => Value::Float(r.read_f64::<E>()?),
        other => unreachable!("layout accepted unknown code {:?}", other),
    })
}

/// IEEE 754 binary16 to f64.
fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = i32::from((bits >> 10) & 0x1f);
    let frac = f64::from(bits & 0x03ff);
    let magnitude = match exp {
        0 => frac * 2f64.powi(-24),
        0x1f if frac == 0.0 => f64::INFINITY,
        0x1f => f64::NAN,
        _ => (1.0 + frac / 1024.0) * 2f64.powi(exp - 15),
    };
    sign * magnitude
}
