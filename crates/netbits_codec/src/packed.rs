//! # Packed Scalar Codec
//!
//! Variable-length encodings that spend fewer bytes on small values.
//!
//! ## Integers
//!
//! LEB128: seven payload bits per byte, least-significant group first, the
//! high bit set on every byte except the last. Signed values are ZigZag
//! mapped first so `-1` costs one byte just like `1`.
//!
//! ## Floats
//!
//! A float starts with one flag bit choosing between two forms:
//!
//! - `1`: the IEEE-754 bit pattern byte-swapped and LEB128 packed. Sign and
//!   exponent land in the low-order groups while the trailing mantissa bytes,
//!   which are zero for round values like `0.5` or `256.0`, end up on top
//!   where they cost nothing.
//! - `0`: the bit pattern at its fixed width.
//!
//! The writer picks the packed form only when it is shorter, so a packed
//! float never costs more than its fixed width plus the flag. Both forms
//! carry the raw bits, so NaN payloads, `-0.0`, subnormals and infinities
//! all survive exactly.

use netbits_core::arithmetic::MAX_VARINT_LEN;
use netbits_core::{varint_len, zigzag_decode, zigzag_encode};

use crate::buffer::BitBuffer;
use crate::error::{CodecError, CodecResult};

/// Writes `value` as LEB128.
///
/// # Errors
///
/// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
pub fn write_var_u64(buffer: &mut BitBuffer, value: u64) -> CodecResult<()> {
    let mut encoded = [0u8; MAX_VARINT_LEN];
    let mut len = 0;
    let mut rest = value;
    loop {
        let group = rest.to_le_bytes()[0] & 0x7F;
        rest >>= 7;
        if rest == 0 {
            encoded[len] = group;
            len += 1;
            break;
        }
        encoded[len] = group | 0x80;
        len += 1;
    }
    buffer.write(&encoded[..len])
}

/// Reads a LEB128 value.
///
/// # Errors
///
/// - [`CodecError::EndOfData`] if the encoding is cut short
/// - [`CodecError::MalformedVarint`] past ten bytes or above bit 63
pub fn read_var_u64(buffer: &mut BitBuffer) -> CodecResult<u64> {
    let mut value = 0u64;
    for index in 0..MAX_VARINT_LEN {
        let byte = buffer.take_byte()?;
        let payload = u64::from(byte & 0x7F);

        // Only one payload bit is left for the tenth byte
        if index == MAX_VARINT_LEN - 1 && payload > 1 {
            return Err(CodecError::MalformedVarint);
        }
        value |= payload << (7 * index);

        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::MalformedVarint)
}

/// Writes `value` ZigZag mapped and LEB128 packed.
///
/// # Errors
///
/// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
#[inline]
pub fn write_var_i64(buffer: &mut BitBuffer, value: i64) -> CodecResult<()> {
    write_var_u64(buffer, zigzag_encode(value))
}

/// Reads a value written by [`write_var_i64`].
///
/// # Errors
///
/// As [`read_var_u64`].
#[inline]
pub fn read_var_i64(buffer: &mut BitBuffer) -> CodecResult<i64> {
    read_var_u64(buffer).map(zigzag_decode)
}

/// Writes a length or count prefix.
#[inline]
pub(crate) fn write_len(buffer: &mut BitBuffer, len: usize) -> CodecResult<()> {
    write_var_u64(buffer, len as u64)
}

/// Reads a length or count prefix.
#[inline]
pub(crate) fn read_len(buffer: &mut BitBuffer) -> CodecResult<usize> {
    let value = read_var_u64(buffer)?;
    usize::try_from(value).map_err(|_| CodecError::Overflow {
        target: "usize",
        value: i128::from(value),
    })
}

macro_rules! packed_unsigned {
    ($($ty:ty => $write:ident, $read:ident;)*) => {$(
        #[doc = concat!("Writes a `", stringify!($ty), "` as LEB128.")]
        ///
        /// # Errors
        ///
        /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
        #[inline]
        pub fn $write(buffer: &mut BitBuffer, value: $ty) -> CodecResult<()> {
            write_var_u64(buffer, u64::from(value))
        }

        #[doc = concat!("Reads a packed `", stringify!($ty), "`.")]
        ///
        /// # Errors
        ///
        /// As [`read_var_u64`], plus [`CodecError::Overflow`] if the decoded
        /// value does not fit.
        #[inline]
        pub fn $read(buffer: &mut BitBuffer) -> CodecResult<$ty> {
            let value = read_var_u64(buffer)?;
            <$ty>::try_from(value).map_err(|_| CodecError::Overflow {
                target: stringify!($ty),
                value: i128::from(value),
            })
        }
    )*};
}

macro_rules! packed_signed {
    ($($ty:ty => $write:ident, $read:ident;)*) => {$(
        #[doc = concat!("Writes an `", stringify!($ty), "` ZigZag mapped and LEB128 packed.")]
        ///
        /// # Errors
        ///
        /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
        #[inline]
        pub fn $write(buffer: &mut BitBuffer, value: $ty) -> CodecResult<()> {
            write_var_i64(buffer, i64::from(value))
        }

        #[doc = concat!("Reads a packed `", stringify!($ty), "`.")]
        ///
        /// # Errors
        ///
        /// As [`read_var_u64`], plus [`CodecError::Overflow`] if the decoded
        /// value does not fit.
        #[inline]
        pub fn $read(buffer: &mut BitBuffer) -> CodecResult<$ty> {
            let value = read_var_i64(buffer)?;
            <$ty>::try_from(value).map_err(|_| CodecError::Overflow {
                target: stringify!($ty),
                value: i128::from(value),
            })
        }
    )*};
}

packed_unsigned! {
    u16 => write_packed_u16, read_packed_u16;
    u32 => write_packed_u32, read_packed_u32;
    u64 => write_packed_u64, read_packed_u64;
}

packed_signed! {
    i16 => write_packed_i16, read_packed_i16;
    i32 => write_packed_i32, read_packed_i32;
    i64 => write_packed_i64, read_packed_i64;
}

/// Writes the low `width` bits of a float bit pattern, packed or fixed,
/// whichever is shorter.
fn write_float_bits(buffer: &mut BitBuffer, bits: u64, width: u32) -> CodecResult<()> {
    let swapped = bits.swap_bytes() >> (64 - width);
    let packed_bits = varint_len(swapped) as u64 * 8;

    if packed_bits < u64::from(width) {
        buffer.reserve_bits(1 + packed_bits)?;
        buffer.write_bit(true)?;
        write_var_u64(buffer, swapped)
    } else {
        buffer.reserve_bits(1 + u64::from(width))?;
        buffer.write_bit(false)?;
        buffer.write_bits(bits, width)
    }
}

/// Reads a `width`-bit float bit pattern written by [`write_float_bits`].
fn read_float_bits(buffer: &mut BitBuffer, width: u32, target: &'static str) -> CodecResult<u64> {
    if buffer.read_bits(1)? == 0 {
        return buffer.read_bits(width);
    }
    let swapped = read_var_u64(buffer)?;
    if width < 64 && swapped >> width != 0 {
        return Err(CodecError::Overflow {
            target,
            value: i128::from(swapped),
        });
    }
    Ok(swapped.swap_bytes() >> (64 - width))
}

/// Writes an `f32` bit for bit, packed when that is shorter.
///
/// # Errors
///
/// Returns [`CodecError::NotSupported`] if a fixed buffer is full. Nothing
/// is written in that case.
#[inline]
pub fn write_packed_f32(buffer: &mut BitBuffer, value: f32) -> CodecResult<()> {
    write_float_bits(buffer, u64::from(value.to_bits()), 32)
}

/// Reads an `f32` written by [`write_packed_f32`], bit for bit.
///
/// # Errors
///
/// As [`read_var_u64`], plus [`CodecError::Overflow`] if a packed pattern
/// is wider than 32 bits.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn read_packed_f32(buffer: &mut BitBuffer) -> CodecResult<f32> {
    // The pattern is at most 32 bits wide here
    read_float_bits(buffer, 32, "f32").map(|bits| f32::from_bits(bits as u32))
}

/// Writes an `f64` bit for bit, packed when that is shorter.
///
/// # Errors
///
/// Returns [`CodecError::NotSupported`] if a fixed buffer is full. Nothing
/// is written in that case.
#[inline]
pub fn write_packed_f64(buffer: &mut BitBuffer, value: f64) -> CodecResult<()> {
    write_float_bits(buffer, value.to_bits(), 64)
}

/// Reads an `f64` written by [`write_packed_f64`], bit for bit.
///
/// # Errors
///
/// As [`read_var_u64`].
#[inline]
pub fn read_packed_f64(buffer: &mut BitBuffer) -> CodecResult<f64> {
    read_float_bits(buffer, 64, "f64").map(f64::from_bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn rewind(buffer: &mut BitBuffer) {
        buffer.set_bit_position(0);
    }

    #[test]
    fn test_var_u64_layout() {
        let mut buffer = BitBuffer::new();
        write_var_u64(&mut buffer, 0).unwrap();
        write_var_u64(&mut buffer, 127).unwrap();
        write_var_u64(&mut buffer, 300).unwrap();
        assert_eq!(buffer.to_vec(), vec![0x00, 0x7F, 0xAC, 0x02]);
    }

    #[test]
    fn test_var_u64_length_matches_helper() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let shift = rng.gen_range(0..64);
            let value: u64 = rng.gen::<u64>() >> shift;
            let mut buffer = BitBuffer::new();
            write_var_u64(&mut buffer, value).unwrap();
            assert_eq!(buffer.len(), varint_len(value));
            rewind(&mut buffer);
            assert_eq!(read_var_u64(&mut buffer).unwrap(), value);
        }
    }

    #[test]
    fn test_var_u64_bounds() {
        for value in [0, 1, 127, 128, u64::from(u32::MAX), u64::MAX - 1, u64::MAX] {
            let mut buffer = BitBuffer::new();
            write_var_u64(&mut buffer, value).unwrap();
            rewind(&mut buffer);
            assert_eq!(read_var_u64(&mut buffer).unwrap(), value);
        }
    }

    #[test]
    fn test_var_u64_malformed() {
        // Eleven continuation bytes
        let mut buffer = BitBuffer::from_bytes(&[0xFF; 11]);
        assert!(matches!(
            read_var_u64(&mut buffer),
            Err(CodecError::MalformedVarint)
        ));

        // Tenth byte sets bits above 63
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        let mut buffer = BitBuffer::wrap(bytes);
        assert!(matches!(
            read_var_u64(&mut buffer),
            Err(CodecError::MalformedVarint)
        ));
    }

    #[test]
    fn test_var_u64_truncated() {
        let mut buffer = BitBuffer::from_bytes(&[0x80, 0x80]);
        assert!(matches!(
            read_var_u64(&mut buffer),
            Err(CodecError::EndOfData { .. })
        ));
    }

    #[test]
    fn test_packed_signed_values() {
        let mut buffer = BitBuffer::new();
        write_packed_i16(&mut buffer, -31934).unwrap();
        write_packed_u16(&mut buffer, 64893).unwrap();
        write_packed_i32(&mut buffer, -100_913_642).unwrap();
        write_packed_u32(&mut buffer, 1_467_867_235).unwrap();
        write_packed_i64(&mut buffer, -1_469_598_103_934_656_037).unwrap();
        write_packed_i64(&mut buffer, 81_246_971_249_124_124).unwrap();
        write_packed_i64(&mut buffer, 2287).unwrap();
        write_packed_i64(&mut buffer, 235).unwrap();

        rewind(&mut buffer);
        assert_eq!(read_packed_i16(&mut buffer).unwrap(), -31934);
        assert_eq!(read_packed_u16(&mut buffer).unwrap(), 64893);
        assert_eq!(read_packed_i32(&mut buffer).unwrap(), -100_913_642);
        assert_eq!(read_packed_u32(&mut buffer).unwrap(), 1_467_867_235);
        assert_eq!(read_packed_i64(&mut buffer).unwrap(), -1_469_598_103_934_656_037);
        assert_eq!(read_packed_i64(&mut buffer).unwrap(), 81_246_971_249_124_124);
        assert_eq!(read_packed_i64(&mut buffer).unwrap(), 2287);
        assert_eq!(read_packed_i64(&mut buffer).unwrap(), 235);
    }

    #[test]
    fn test_packed_extremes() {
        let mut buffer = BitBuffer::new();
        for value in [i64::MIN, i64::MAX, 0, -1] {
            write_packed_i64(&mut buffer, value).unwrap();
        }
        for value in [i16::MIN, i16::MAX] {
            write_packed_i16(&mut buffer, value).unwrap();
        }

        rewind(&mut buffer);
        for value in [i64::MIN, i64::MAX, 0, -1] {
            assert_eq!(read_packed_i64(&mut buffer).unwrap(), value);
        }
        for value in [i16::MIN, i16::MAX] {
            assert_eq!(read_packed_i16(&mut buffer).unwrap(), value);
        }
    }

    #[test]
    fn test_small_values_are_shorter() {
        let mut buffer = BitBuffer::new();
        write_packed_i32(&mut buffer, -3).unwrap();
        assert!(buffer.len() < 4);

        let mut buffer = BitBuffer::new();
        write_packed_u64(&mut buffer, 1000).unwrap();
        assert!(buffer.len() < 8);
    }

    #[test]
    fn test_narrow_read_overflow() {
        let mut buffer = BitBuffer::new();
        write_packed_u32(&mut buffer, 70_000).unwrap();
        write_packed_i32(&mut buffer, -40_000).unwrap();

        rewind(&mut buffer);
        assert!(matches!(
            read_packed_u16(&mut buffer),
            Err(CodecError::Overflow { target: "u16", value: 70_000 })
        ));
        assert!(matches!(
            read_packed_i16(&mut buffer),
            Err(CodecError::Overflow { target: "i16", value: -40_000 })
        ));
    }

    #[test]
    fn test_packed_floats_bit_exact() {
        let singles = [
            0.0f32,
            -0.0,
            1.0,
            -256.0,
            f32::MIN_POSITIVE,
            f32::from_bits(1),
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::from_bits(0x7FC0_1234),
            f32::MAX,
        ];
        let doubles = [
            0.0f64,
            -0.0,
            0.02,
            1e40,
            f64::from_bits(1),
            f64::INFINITY,
            f64::from_bits(0xFFF8_0000_DEAD_BEEF),
            f64::MIN,
        ];

        let mut buffer = BitBuffer::new();
        for value in singles {
            write_packed_f32(&mut buffer, value).unwrap();
        }
        for value in doubles {
            write_packed_f64(&mut buffer, value).unwrap();
        }

        rewind(&mut buffer);
        for value in singles {
            assert_eq!(read_packed_f32(&mut buffer).unwrap().to_bits(), value.to_bits());
        }
        for value in doubles {
            assert_eq!(read_packed_f64(&mut buffer).unwrap().to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_packed_floats_random() {
        let mut rng = StdRng::seed_from_u64(0xF10A7);
        let values: Vec<u64> = (0..1_000).map(|_| rng.gen()).collect();

        let mut buffer = BitBuffer::new();
        buffer.write_bit(true).unwrap();
        for &bits in &values {
            write_packed_f64(&mut buffer, f64::from_bits(bits)).unwrap();
        }

        buffer.set_bit_position(1);
        for &bits in &values {
            assert_eq!(read_packed_f64(&mut buffer).unwrap().to_bits(), bits);
        }
    }

    #[test]
    fn test_round_floats_are_short() {
        let mut buffer = BitBuffer::new();
        write_packed_f32(&mut buffer, 0.0).unwrap();
        assert_eq!(buffer.bit_len(), 1 + 8);

        let mut buffer = BitBuffer::new();
        write_packed_f32(&mut buffer, 256.0).unwrap();
        assert!(buffer.bit_len() < 32);

        let mut buffer = BitBuffer::new();
        write_packed_f64(&mut buffer, 2.0).unwrap();
        assert_eq!(buffer.bit_len(), 1 + 8);
    }

    #[test]
    fn test_dense_floats_cost_one_flag_bit() {
        for value in [0.06f64, 0.2, 0.02, 1e39, -3.7, 0.1] {
            let mut buffer = BitBuffer::new();
            write_packed_f64(&mut buffer, value).unwrap();
            assert_eq!(buffer.bit_len(), 1 + 64, "{value}");
            assert_eq!(buffer.as_slice()[0] & 1, 0);
        }
        for value in [0.1f32, -3.7, 0.06, 1e30] {
            let mut buffer = BitBuffer::new();
            write_packed_f32(&mut buffer, value).unwrap();
            assert_eq!(buffer.bit_len(), 1 + 32, "{value}");
        }
    }

    #[test]
    fn test_packed_floats_never_exceed_fixed_width() {
        let mut rng = StdRng::seed_from_u64(0x51_2E);
        for _ in 0..1_000 {
            let mut buffer = BitBuffer::new();
            write_packed_f64(&mut buffer, f64::from_bits(rng.gen())).unwrap();
            write_packed_f32(&mut buffer, f32::from_bits(rng.gen())).unwrap();
            assert!(buffer.bit_len() <= (1 + 64) + (1 + 32));
        }
    }

    #[test]
    fn test_packed_float_overwide_pattern() {
        // Flag bit set, then a packed pattern needing 33 bits
        let mut buffer = BitBuffer::new();
        buffer.write_bit(true).unwrap();
        write_var_u64(&mut buffer, 1 << 32).unwrap();

        buffer.set_bit_position(0);
        assert!(matches!(
            read_packed_f32(&mut buffer),
            Err(CodecError::Overflow { target: "f32", .. })
        ));
    }

    #[test]
    fn test_packed_float_fixed_buffer_writes_nothing() {
        let mut buffer = BitBuffer::wrap(vec![0; 4]);
        assert!(matches!(
            write_packed_f32(&mut buffer, 0.1),
            Err(CodecError::NotSupported { .. })
        ));
        assert_eq!(buffer.bit_position(), 0);
        assert_eq!(buffer.get_buffer(), &[0; 4]);
    }
}
