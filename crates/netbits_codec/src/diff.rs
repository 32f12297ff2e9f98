//! # Delta Codec
//!
//! Sends only what changed between a baseline both ends hold and a new value.
//!
//! ## Array layout
//!
//! ```text
//! new_len          packed count
//! change mask      1 bit per index in 0..min(old_len, new_len)
//! changed values   new value of every index whose bit is set, in order
//! extension        every element at index >= old_len
//! ```
//!
//! Elements compare by bit pattern, so `0.0 -> -0.0` is a change.
//!
//! ## String layout
//!
//! ```text
//! new_len          packed unit count
//! prefix_len       packed unit count shared with the baseline
//! tail             the units after the shared prefix
//! ```
//!
//! The shared prefix always ends on a character boundary.
//!
//! ## Mode pairing
//!
//! A payload must be read with the reader matching the writer (fixed with
//! fixed, packed with packed, same [`CharEncoding`]). A mismatch is a caller
//! bug and decodes to garbage or an error; it is not detected.

use crate::array::{check_count, MIN_PACKED_BITS};
use crate::buffer::BitBuffer;
use crate::element::{FixedElement, PackedElement};
use crate::error::{CodecError, CodecResult};
use crate::packed::{read_len, write_len};
use crate::reader::BitReader;
use crate::string::{read_units_into, validate, write_units, CharEncoding};
use crate::writer::BitWriter;

/// Change-mask bits consumed per read.
const MASK_CHUNK: usize = 64;

fn write_array_diff_with<T, E>(
    buffer: &mut BitBuffer,
    baseline: &[T],
    current: &[T],
    mut encode: E,
) -> CodecResult<()>
where
    T: FixedElement,
    E: FnMut(T, &mut BitBuffer) -> CodecResult<()>,
{
    write_len(buffer, current.len())?;

    let common = baseline.len().min(current.len());
    let pairs = baseline[..common].iter().zip(&current[..common]);
    for (old, new) in pairs.clone() {
        buffer.write_bit(!old.same_bits(new))?;
    }
    for (old, new) in pairs {
        if !old.same_bits(new) {
            encode(*new, buffer)?;
        }
    }
    current[common..]
        .iter()
        .try_for_each(|&value| encode(value, buffer))
}

fn read_array_diff_with<T, D>(
    buffer: &mut BitBuffer,
    target: &mut Vec<T>,
    min_bits: u64,
    mut decode: D,
) -> CodecResult<()>
where
    T: FixedElement,
    D: FnMut(&mut BitBuffer) -> CodecResult<T>,
{
    let new_len = read_len(buffer)?;
    let common = target.len().min(new_len);
    let appended = new_len - common;

    buffer.require(common as u64)?;
    let mut mask_pos = buffer.bit_position();
    let mut data_pos = mask_pos + common as u64;
    buffer.set_bit_position(data_pos);

    // Changed values sit after the whole mask, so the two cursors leapfrog
    let mut start = 0;
    while start < common {
        let chunk = (common - start).min(MASK_CHUNK);
        buffer.set_bit_position(mask_pos);
        #[allow(clippy::cast_possible_truncation)]
        let mut mask = buffer.read_bits(chunk as u32)?;
        mask_pos += chunk as u64;

        buffer.set_bit_position(data_pos);
        while mask != 0 {
            let index = start + mask.trailing_zeros() as usize;
            target[index] = decode(buffer)?;
            mask &= mask - 1;
        }
        data_pos = buffer.bit_position();
        start += chunk;
    }

    check_count(buffer, appended, min_bits)?;
    target.truncate(new_len);
    target.reserve(appended);
    for _ in 0..appended {
        target.push(decode(buffer)?);
    }
    Ok(())
}

/// Index just past the shared prefix of `baseline` and `current`, as
/// `(units, bytes into current)`.
fn common_prefix(baseline: &str, current: &str, encoding: CharEncoding) -> (usize, usize) {
    let mut units = 0;
    let mut bytes = 0;
    for (old, new) in baseline.chars().zip(current.chars()) {
        if old != new {
            break;
        }
        units += encoding.unit_width(new);
        bytes += new.len_utf8();
    }
    (units, bytes)
}

/// Byte offset in `text` just after its first `units` units.
fn prefix_cut(text: &str, units: usize, encoding: CharEncoding) -> Option<usize> {
    if units == 0 {
        return Some(0);
    }
    let mut counted = 0;
    for (index, c) in text.char_indices() {
        counted += encoding.unit_width(c);
        if counted == units {
            return Some(index + c.len_utf8());
        }
        if counted > units {
            return None;
        }
    }
    None
}

impl BitWriter<'_> {
    /// Writes the changes from `baseline` to `current`, values in their
    /// fixed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array_diff<T: FixedElement>(&mut self, baseline: &[T], current: &[T]) -> CodecResult<()> {
        self.buffer
            .write_atomic(|buffer| write_array_diff_with(buffer, baseline, current, T::write_fixed))
    }

    /// Writes the changes from `baseline` to `current`, values in their
    /// packed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write_array_packed_diff<T: PackedElement>(&mut self, baseline: &[T], current: &[T]) -> CodecResult<()> {
        self.buffer
            .write_atomic(|buffer| write_array_diff_with(buffer, baseline, current, T::write_packed))
    }

    /// Writes the changes from `baseline` to `current`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Unrepresentable`] in `SingleByte` mode for a changed
    ///   character above U+00FF, before anything is written
    /// - [`CodecError::NotSupported`] if a fixed buffer is too small, leaving
    ///   the buffer as it was
    pub fn write_string_diff(&mut self, baseline: &str, current: &str, encoding: CharEncoding) -> CodecResult<()> {
        let (prefix_units, prefix_bytes) = common_prefix(baseline, current, encoding);
        let tail = &current[prefix_bytes..];
        validate(tail, encoding)?;

        let total_units = prefix_units + encoding.unit_len(tail);
        self.buffer.write_atomic(|buffer| {
            write_len(buffer, total_units)?;
            write_len(buffer, prefix_units)?;
            write_units(buffer, tail, encoding)
        })
    }
}

impl BitReader<'_> {
    /// Applies a fixed-encoding array diff to `baseline`, returning the new value.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if the declared length overruns the data
    /// - [`CodecError::EndOfData`] if the payload is cut short
    pub fn read_array_diff<T: FixedElement>(&mut self, baseline: &[T]) -> CodecResult<Vec<T>> {
        let mut target = baseline.to_vec();
        self.read_array_diff_into(&mut target)?;
        Ok(target)
    }

    /// Applies a fixed-encoding array diff to `target` in place.
    ///
    /// `target` must hold the baseline. It is left unspecified on error.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array_diff`].
    pub fn read_array_diff_into<T: FixedElement>(&mut self, target: &mut Vec<T>) -> CodecResult<()> {
        read_array_diff_with(self.buffer, target, u64::from(T::BITS), T::read_fixed)
    }

    /// Applies a packed-encoding array diff to `baseline`, returning the new value.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array_diff`], plus any packed decoding error.
    pub fn read_array_packed_diff<T: PackedElement>(&mut self, baseline: &[T]) -> CodecResult<Vec<T>> {
        let mut target = baseline.to_vec();
        self.read_array_packed_diff_into(&mut target)?;
        Ok(target)
    }

    /// Applies a packed-encoding array diff to `target` in place.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_array_packed_diff`].
    pub fn read_array_packed_diff_into<T: PackedElement>(&mut self, target: &mut Vec<T>) -> CodecResult<()> {
        read_array_diff_with(self.buffer, target, MIN_PACKED_BITS, T::read_packed)
    }

    /// Applies a string diff to `baseline`, returning the new value.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_string_diff_into`].
    pub fn read_string_diff(&mut self, baseline: &str, encoding: CharEncoding) -> CodecResult<String> {
        let mut target = baseline.to_owned();
        self.read_string_diff_into(&mut target, encoding)?;
        Ok(target)
    }

    /// Applies a string diff to `target` in place.
    ///
    /// `target` must hold the baseline. The whole tail is decoded before
    /// `target` is touched, so it is unchanged on error.
    ///
    /// # Errors
    ///
    /// - [`CodecError::BaselineMismatch`] if the shared prefix does not fit `target`
    /// - [`CodecError::OutOfRange`] if the declared length overruns the data
    /// - [`CodecError::InvalidUtf16`] if the tail does not decode
    pub fn read_string_diff_into(&mut self, target: &mut String, encoding: CharEncoding) -> CodecResult<()> {
        let total_units = read_len(self.buffer)?;
        let prefix_units = read_len(self.buffer)?;
        if prefix_units > total_units {
            return Err(CodecError::BaselineMismatch("shared prefix longer than the new value"));
        }
        let cut = prefix_cut(target, prefix_units, encoding)
            .ok_or(CodecError::BaselineMismatch("shared prefix does not fit the baseline"))?;

        let mut tail = String::new();
        read_units_into(self.buffer, total_units - prefix_units, encoding, &mut tail)?;

        target.truncate(cut);
        target.push_str(&tail);
        Ok(())
    }
}
