//! # Bit Writer
//!
//! Typed writes over a borrowed [`BitBuffer`].
//!
//! Arrays, strings and diffs extend this type from their own modules.

use crate::buffer::BitBuffer;
use crate::element::{FixedElement, PackedElement};
use crate::error::{CodecError, CodecResult};
use crate::packed;

/// Largest byte width accepted by [`BitWriter::write_ranged_f32`].
pub const MAX_RANGED_F32_BYTES: u32 = 4;

/// Largest byte width accepted by [`BitWriter::write_ranged_f64`].
pub const MAX_RANGED_F64_BYTES: u32 = 8;

/// Number of quantisation steps for a ranged value `bytes` wide.
#[inline]
pub(crate) const fn ranged_steps(bytes: u32) -> u64 {
    u64::MAX >> (64 - 8 * bytes)
}

/// Checks a ranged width and bounds, returning the span `max - min`.
pub(crate) fn check_ranged(min: f64, max: f64, bytes: u32, max_bytes: u32) -> CodecResult<f64> {
    if bytes == 0 || bytes > max_bytes {
        return Err(CodecError::out_of_range(
            "ranged width",
            format!("{bytes} bytes, expected 1..={max_bytes}"),
        ));
    }
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return Err(CodecError::out_of_range(
            "ranged bounds",
            format!("[{min}, {max}] is empty or unbounded"),
        ));
    }
    Ok(span)
}

/// Typed writer over a bit buffer.
///
/// All writes start at the buffer's cursor and advance it. Nothing is
/// buffered: dropping the writer leaves the buffer exactly as written.
///
/// # Example
///
/// ```rust
/// use netbits_codec::BitBuffer;
///
/// let mut buffer = BitBuffer::new();
/// let mut writer = buffer.writer();
/// writer.write_bool(true).unwrap();
/// writer.write_i64_packed(-1).unwrap();
/// writer.write_f32(0.5).unwrap();
///
/// buffer.set_bit_position(0);
/// let mut reader = buffer.reader();
/// assert!(reader.read_bool().unwrap());
/// assert_eq!(reader.read_i64_packed().unwrap(), -1);
/// assert_eq!(reader.read_f32().unwrap(), 0.5);
/// ```
#[derive(Debug)]
pub struct BitWriter<'a> {
    pub(crate) buffer: &'a mut BitBuffer,
}

macro_rules! fixed_writes {
    ($($name:ident: $ty:ty;)*) => {$(
        #[doc = concat!("Writes a `", stringify!($ty), "` in little-endian order.")]
        ///
        /// # Errors
        ///
        /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
        #[inline]
        pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
            value.write_fixed(self.buffer)
        }
    )*};
}

macro_rules! packed_writes {
    ($($name:ident: $ty:ty => $codec:ident;)*) => {$(
        #[doc = concat!("Writes a packed `", stringify!($ty), "`.")]
        ///
        /// # Errors
        ///
        /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
        #[inline]
        pub fn $name(&mut self, value: $ty) -> CodecResult<()> {
            packed::$codec(self.buffer, value)
        }
    )*};
}

impl<'a> BitWriter<'a> {
    /// Wraps `buffer`. Writing starts at its current cursor.
    #[inline]
    pub fn new(buffer: &'a mut BitBuffer) -> Self {
        Self { buffer }
    }

    /// The underlying buffer.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &BitBuffer {
        &*self.buffer
    }

    /// Mutable access to the underlying buffer.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut BitBuffer {
        &mut *self.buffer
    }

    // =========================================================================
    // Bits & bytes
    // =========================================================================

    /// Writes a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
        self.buffer.write_bit(bit)
    }

    /// Writes a `bool` as one bit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_bool(&mut self, value: bool) -> CodecResult<()> {
        self.buffer.write_bit(value)
    }

    /// Writes the low `count` bits of `value`.
    ///
    /// # Errors
    ///
    /// See [`BitBuffer::write_bits`].
    #[inline]
    pub fn write_bits(&mut self, value: u64, count: u32) -> CodecResult<()> {
        self.buffer.write_bits(value, count)
    }

    /// Writes the low 4 bits of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_nibble(&mut self, value: u8) -> CodecResult<()> {
        self.buffer.write_nibble(value)
    }

    /// Pads with zero bits to the next byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_pad_bits(&mut self) -> CodecResult<()> {
        self.buffer.write_pad_bits()
    }

    /// Writes raw bytes with no length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> CodecResult<()> {
        self.buffer.write(bytes)
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    fixed_writes! {
        write_u8: u8;
        write_i8: i8;
        write_u16: u16;
        write_i16: i16;
        write_u32: u32;
        write_i32: i32;
        write_u64: u64;
        write_i64: i64;
        write_f32: f32;
        write_f64: f64;
    }

    packed_writes! {
        write_u16_packed: u16 => write_packed_u16;
        write_i16_packed: i16 => write_packed_i16;
        write_u32_packed: u32 => write_packed_u32;
        write_i32_packed: i32 => write_packed_i32;
        write_u64_packed: u64 => write_packed_u64;
        write_i64_packed: i64 => write_packed_i64;
        write_f32_packed: f32 => write_packed_f32;
        write_f64_packed: f64 => write_packed_f64;
    }

    /// Writes any [`FixedElement`] in its fixed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_fixed<T: FixedElement>(&mut self, value: T) -> CodecResult<()> {
        value.write_fixed(self.buffer)
    }

    /// Writes any [`PackedElement`] in its packed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    #[inline]
    pub fn write_packed<T: PackedElement>(&mut self, value: T) -> CodecResult<()> {
        value.write_packed(self.buffer)
    }

    // =========================================================================
    // Ranged floats
    // =========================================================================

    /// Quantises `value` in `[min, max]` into a `bytes`-wide integer (1..=4).
    ///
    /// The reader gets the value back to within `(max - min) / (256^bytes - 1)`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] for a bad width, an empty range, or a value outside it
    /// - [`CodecError::NotSupported`] if a fixed buffer is full
    pub fn write_ranged_f32(&mut self, value: f32, min: f32, max: f32, bytes: u32) -> CodecResult<()> {
        self.write_ranged(
            f64::from(value),
            f64::from(min),
            f64::from(max),
            bytes,
            MAX_RANGED_F32_BYTES,
        )
    }

    /// Quantises `value` in `[min, max]` into a `bytes`-wide integer (1..=8).
    ///
    /// # Errors
    ///
    /// As [`BitWriter::write_ranged_f32`].
    pub fn write_ranged_f64(&mut self, value: f64, min: f64, max: f64, bytes: u32) -> CodecResult<()> {
        self.write_ranged(value, min, max, bytes, MAX_RANGED_F64_BYTES)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn write_ranged(&mut self, value: f64, min: f64, max: f64, bytes: u32, max_bytes: u32) -> CodecResult<()> {
        let span = check_ranged(min, max, bytes, max_bytes)?;
        if !(min..=max).contains(&value) {
            return Err(CodecError::out_of_range(
                "ranged value",
                format!("{value} outside [{min}, {max}]"),
            ));
        }

        let steps = ranged_steps(bytes);
        let normalized = (value - min) / span;
        // Float to int casts saturate
        let quantized = ((normalized * steps as f64).round() as u64).min(steps);
        self.buffer.write_bits(quantized, bytes * 8)
    }
}
