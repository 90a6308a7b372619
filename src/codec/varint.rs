use crate::core::error::{Error, ErrorKind, Result};

/// Little-endian base-128 varint: 7 payload bits per byte, high bit set on
/// continuation. Five bytes cap the encodable range at 35 bits.
pub const MAX_VARINT_BYTES: usize = 5;

/// Largest value a capped varint can carry.
pub const MAX_VARINT_VALUE: u64 = (1 << (7 * MAX_VARINT_BYTES as u64)) - 1;

/// Append `value` to `output`. Values above [`MAX_VARINT_VALUE`] must be
/// rejected by the caller before reaching this point.
pub fn write_varint(output: &mut Vec<u8>, mut value: u64) {
    while value >= 128 {
        output.push((value & 127) as u8 | 128); // continuation bit
        value >>= 7;
    }
    output.push(value as u8);
}

/// Decode one varint, returning `(value, bytes_consumed)`.
pub fn read_varint(input: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    for &byte in input {
        consumed += 1;
        if consumed > MAX_VARINT_BYTES {
            return Err(Error::new(ErrorKind::Codec, "varint overflow".to_string()));
        }

        value |= ((byte & 127) as u64) << shift;
        if byte & 128 == 0 {
            return Ok((value, consumed));
        }
        shift += 7;
    }

    Err(Error::new(ErrorKind::Codec, "truncated varint".to_string()))
}
