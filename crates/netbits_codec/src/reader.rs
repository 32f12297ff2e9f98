//! # Bit Reader
//!
//! Typed reads over a borrowed [`BitBuffer`].
//!
//! Unlike the raw buffer primitives, which report starvation with `None` or
//! a short count, every typed read here returns a [`CodecResult`].

use crate::buffer::BitBuffer;
use crate::element::{FixedElement, PackedElement};
use crate::error::{CodecError, CodecResult};
use crate::packed;
use crate::writer::{check_ranged, ranged_steps, MAX_RANGED_F32_BYTES, MAX_RANGED_F64_BYTES};

/// Typed reader over a bit buffer.
///
/// Reads start at the buffer's cursor, advance it, and never move past the
/// logical length.
#[derive(Debug)]
pub struct BitReader<'a> {
    pub(crate) buffer: &'a mut BitBuffer,
}

macro_rules! fixed_reads {
    ($($name:ident: $ty:ty;)*) => {$(
        #[doc = concat!("Reads a little-endian `", stringify!($ty), "`.")]
        ///
        /// # Errors
        ///
        /// Returns [`CodecError::EndOfData`] if too few bits remain.
        #[inline]
        pub fn $name(&mut self) -> CodecResult<$ty> {
            <$ty as FixedElement>::read_fixed(self.buffer)
        }
    )*};
}

macro_rules! packed_reads {
    ($($name:ident: $ty:ty => $codec:ident;)*) => {$(
        #[doc = concat!("Reads a packed `", stringify!($ty), "`.")]
        ///
        /// # Errors
        ///
        /// Returns an error if the data is truncated, malformed, or too wide.
        #[inline]
        pub fn $name(&mut self) -> CodecResult<$ty> {
            packed::$codec(self.buffer)
        }
    )*};
}

impl<'a> BitReader<'a> {
    /// Wraps `buffer`. Reading starts at its current cursor.
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

    /// Bits left before the end of the data.
    #[inline]
    #[must_use]
    pub fn remaining_bits(&self) -> u64 {
        self.buffer.remaining_bits()
    }

    // =========================================================================
    // Bits & bytes
    // =========================================================================

    /// Reads a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] at the end of the data.
    #[inline]
    pub fn read_bit(&mut self) -> CodecResult<bool> {
        self.buffer.require(1)?;
        self.buffer.read_bit().ok_or(CodecError::EndOfData {
            requested: 1,
            available: 0,
        })
    }

    /// Reads a `bool` written as one bit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] at the end of the data.
    #[inline]
    pub fn read_bool(&mut self) -> CodecResult<bool> {
        self.read_bit()
    }

    /// Reads `count` bits.
    ///
    /// # Errors
    ///
    /// See [`BitBuffer::read_bits`].
    #[inline]
    pub fn read_bits(&mut self, count: u32) -> CodecResult<u64> {
        self.buffer.read_bits(count)
    }

    /// Reads 4 bits.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if fewer than 4 bits remain.
    #[inline]
    pub fn read_nibble(&mut self) -> CodecResult<u8> {
        self.buffer.read_nibble()
    }

    /// Skips to the next byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if the padding was never written.
    #[inline]
    pub fn skip_pad_bits(&mut self) -> CodecResult<()> {
        self.buffer.skip_pad_bits()
    }

    /// Fills `out` with raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if fewer than `out.len()` bytes remain.
    #[inline]
    pub fn read_bytes(&mut self, out: &mut [u8]) -> CodecResult<()> {
        self.buffer.read_exact(out)
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    fixed_reads! {
        read_u8: u8;
        read_i8: i8;
        read_u16: u16;
        read_i16: i16;
        read_u32: u32;
        read_i32: i32;
        read_u64: u64;
        read_i64: i64;
        read_f32: f32;
        read_f64: f64;
    }

    packed_reads! {
        read_u16_packed: u16 => read_packed_u16;
        read_i16_packed: i16 => read_packed_i16;
        read_u32_packed: u32 => read_packed_u32;
        read_i32_packed: i32 => read_packed_i32;
        read_u64_packed: u64 => read_packed_u64;
        read_i64_packed: i64 => read_packed_i64;
        read_f32_packed: f32 => read_packed_f32;
        read_f64_packed: f64 => read_packed_f64;
    }

    /// Reads any [`FixedElement`] in its fixed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if too few bits remain.
    #[inline]
    pub fn read_fixed<T: FixedElement>(&mut self) -> CodecResult<T> {
        T::read_fixed(self.buffer)
    }

    /// Reads any [`PackedElement`] in its packed encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated, malformed, or too wide.
    #[inline]
    pub fn read_packed<T: PackedElement>(&mut self) -> CodecResult<T> {
        T::read_packed(self.buffer)
    }

    // =========================================================================
    // Ranged floats
    // =========================================================================

    /// Reads a value written by [`crate::BitWriter::write_ranged_f32`] with
    /// the same bounds and width.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] for a bad width or an empty range,
    ///   before anything is consumed
    /// - [`CodecError::EndOfData`] if too few bits remain
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_ranged_f32(&mut self, min: f32, max: f32, bytes: u32) -> CodecResult<f32> {
        let value = self.read_ranged(f64::from(min), f64::from(max), bytes, MAX_RANGED_F32_BYTES)?;
        Ok(value as f32)
    }

    /// Reads a value written by [`crate::BitWriter::write_ranged_f64`] with
    /// the same bounds and width.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_ranged_f32`].
    pub fn read_ranged_f64(&mut self, min: f64, max: f64, bytes: u32) -> CodecResult<f64> {
        self.read_ranged(min, max, bytes, MAX_RANGED_F64_BYTES)
    }

    #[allow(clippy::cast_precision_loss)]
    fn read_ranged(&mut self, min: f64, max: f64, bytes: u32, max_bytes: u32) -> CodecResult<f64> {
        let span = check_ranged(min, max, bytes, max_bytes)?;
        let quantized = self.buffer.read_bits(bytes * 8)?;
        let steps = ranged_steps(bytes);
        Ok(min + (quantized as f64 / steps as f64) * span)
    }
}
