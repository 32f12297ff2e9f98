//! # Array Codec
//!
//! Homogeneous arrays: a packed element count followed by the elements,
//! each fixed-width or packed. The `known_length` variants drop the count
//! when both ends already agree on it.
//!
//! On little-endian hosts fixed-width arrays are copied as raw bytes, since
//! the in-memory image already matches the wire layout.

use crate::buffer::BitBuffer;
use crate::element::{FixedElement, PackedElement};
use crate::error::{CodecError, CodecResult};
use crate::packed::{read_len, write_len};
use crate::reader::BitReader;
use crate::writer::BitWriter;

/// Smallest encoding of a packed element, in bits.
pub(crate) const MIN_PACKED_BITS: u64 = 8;

/// Fails with [`CodecError::OutOfRange`] unless `count` elements of at least
/// `bits_each` bits fit in what is left of the buffer.
pub(crate) fn check_count(buffer: &BitBuffer, count: usize, bits_each: u64) -> CodecResult<()> {
    let available = buffer.remaining_bits();
    let needed = (count as u64).checked_mul(bits_each);
    match needed {
        Some(needed) if needed <= available => Ok(()),
        _ => Err(CodecError::out_of_range(
            "element count",
            format!("{count} elements of {bits_each} bits, {available} bits left"),
        )),
    }
}

pub(crate) fn write_fixed_elements<T: FixedElement>(buffer: &mut BitBuffer, values: &[T]) -> CodecResult<()> {
    if cfg!(target_endian = "little") {
        buffer.write(bytemuck::cast_slice(values))
    } else {
        values.iter().try_for_each(|value| value.write_fixed(buffer))
    }
}

pub(crate) fn read_fixed_elements<T: FixedElement>(
    buffer: &mut BitBuffer,
    count: usize,
    out: &mut Vec<T>,
) -> CodecResult<()> {
    check_count(buffer, count, u64::from(T::BITS))?;
    out.clear();
    if cfg!(target_endian = "little") {
        out.resize(count, <T as bytemuck::Zeroable>::zeroed());
        buffer.read_exact(bytemuck::cast_slice_mut(out.as_mut_slice()))
    } else {
        out.reserve(count);
        for _ in 0..count {
            out.push(T::read_fixed(buffer)?);
        }
        Ok(())
    }
}

pub(crate) fn write_packed_elements<T: PackedElement>(buffer: &mut BitBuffer, values: &[T]) -> CodecResult<()> {
    values.iter().try_for_each(|value| value.write_packed(buffer))
}

pub(crate) fn read_packed_elements<T: PackedElement>(
    buffer: &mut BitBuffer,
    count: usize,
    out: &mut Vec<T>,
) -> CodecResult<()> {
    check_count(buffer, count, MIN_PACKED_BITS)?;
    out.clear();
    out.reserve(count);
    for _ in 0..count {
        out.push(T::read_packed(buffer)?);
    }
    Ok(())
}

impl BitWriter<'_> {
    /// Writes a count prefix followed by each element in its fixed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array<T: FixedElement>(&mut self, values: &[T]) -> CodecResult<()> {
        self.buffer.write_atomic(|buffer| {
            write_len(buffer, values.len())?;
            write_fixed_elements(buffer, values)
        })
    }

    /// Writes the elements in their fixed encoding with no count prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array_known_length<T: FixedElement>(&mut self, values: &[T]) -> CodecResult<()> {
        self.buffer
            .write_atomic(|buffer| write_fixed_elements(buffer, values))
    }

    /// Writes a count prefix followed by each element in its packed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array_packed<T: PackedElement>(&mut self, values: &[T]) -> CodecResult<()> {
        self.buffer.write_atomic(|buffer| {
            write_len(buffer, values.len())?;
            write_packed_elements(buffer, values)
        })
    }

    /// Writes the elements in their packed encoding with no count prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array_packed_known_length<T: PackedElement>(&mut self, values: &[T]) -> CodecResult<()> {
        self.buffer
            .write_atomic(|buffer| write_packed_elements(buffer, values))
    }
}

impl BitReader<'_> {
    /// Reads an array written by [`BitWriter::write_array`].
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if the declared count overruns the data
    /// - [`CodecError::EndOfData`] if the data is cut short
    pub fn read_array<T: FixedElement>(&mut self) -> CodecResult<Vec<T>> {
        let mut out = Vec::new();
        self.read_array_into(&mut out)?;
        Ok(out)
    }

    /// Like [`BitReader::read_array`], refilling `out` in place.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array`].
    pub fn read_array_into<T: FixedElement>(&mut self, out: &mut Vec<T>) -> CodecResult<()> {
        let count = read_len(self.buffer)?;
        read_fixed_elements(self.buffer, count, out)
    }

    /// Reads `count` fixed-width elements that were written without a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfRange`] if `count` overruns the data.
    pub fn read_array_known_length<T: FixedElement>(&mut self, count: usize) -> CodecResult<Vec<T>> {
        let mut out = Vec::new();
        read_fixed_elements(self.buffer, count, &mut out)?;
        Ok(out)
    }

    /// Reads an array written by [`BitWriter::write_array_packed`].
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if the declared count overruns the data
    /// - any packed decoding error
    pub fn read_array_packed<T: PackedElement>(&mut self) -> CodecResult<Vec<T>> {
        let mut out = Vec::new();
        self.read_array_packed_into(&mut out)?;
        Ok(out)
    }

    /// Like [`BitReader::read_array_packed`], refilling `out` in place.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array_packed`].
    pub fn read_array_packed_into<T: PackedElement>(&mut self, out: &mut Vec<T>) -> CodecResult<()> {
        let count = read_len(self.buffer)?;
        read_packed_elements(self.buffer, count, out)
    }

    /// Reads `count` packed elements that were written without a prefix.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array_packed`].
    pub fn read_array_packed_known_length<T: PackedElement>(&mut self, count: usize) -> CodecResult<Vec<T>> {
        let mut out = Vec::new();
        read_packed_elements(self.buffer, count, &mut out)?;
        Ok(out)
    }
}
