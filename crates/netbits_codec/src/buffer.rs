//! # Bit Buffer
//!
//! Byte storage with a bit-granular cursor.
//!
//! ## Layout
//!
//! Bits are numbered least-significant first inside each byte, so bit 0 of a
//! stream is `storage[0] & 0x01` and bit 9 is `storage[1] & 0x02`. Multi-bit
//! groups are written least-significant bit first. The layout is the same on
//! every host.
//!
//! ## Length vs capacity
//!
//! - `capacity` is the size of the backing storage
//! - `bit_len` is the high-water mark of written bits
//!
//! Storage bits at or above the high-water mark are always zero, so a
//! recycled buffer produces the same bytes as a fresh one.

use std::fmt;
use std::io::SeekFrom;

use netbits_core::div8_ceil;

use crate::config::BufferConfig;
use crate::error::{CodecError, CodecResult};
use crate::reader::BitReader;
use crate::writer::BitWriter;

/// Largest backing storage a buffer will allocate, in bytes.
///
/// Bounded both by the allocator (`isize::MAX`) and by bit positions
/// fitting in a `u64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const MAX_CAPACITY: usize = {
    let by_bits = u64::MAX >> 3;
    if (isize::MAX as u64) < by_bits {
        isize::MAX as usize
    } else {
        by_bits as usize
    }
};

/// Converts a bit count into whole bytes, rounding up.
///
/// Every bit count handled by a buffer is below `MAX_CAPACITY * 8`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn bytes_for(bits: u64) -> usize {
    div8_ceil(bits) as usize
}

#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn byte_index(bit: u64) -> usize {
    (bit >> 3) as usize
}

/// Offset of `bit` inside its byte (0..8).
#[inline]
#[allow(clippy::cast_possible_truncation)]
const fn bit_offset(bit: u64) -> u32 {
    (bit & 7) as u32
}

/// Zero bits needed to reach the next byte boundary from `bit`.
#[inline]
const fn pad_len(bit: u64) -> u32 {
    (8 - bit_offset(bit)) & 7
}

/// A growable or fixed byte buffer with a bit cursor.
///
/// Reads and writes work at any bit offset. Byte-aligned bulk writes use a
/// block copy; misaligned ones merge each byte across two storage bytes
/// without touching bits outside the written range.
///
/// # Example
///
/// ```rust
/// use netbits_codec::BitBuffer;
///
/// let mut buffer = BitBuffer::new();
/// buffer.write_bit(true).unwrap();
/// buffer.write_byte(0xAB).unwrap();
/// assert_eq!(buffer.bit_len(), 9);
///
/// buffer.set_bit_position(0);
/// assert_eq!(buffer.read_bit(), Some(true));
/// assert_eq!(buffer.read_byte(), Some(0xAB));
/// assert_eq!(buffer.read_byte(), None);
/// ```
#[derive(Clone, Debug)]
pub struct BitBuffer {
    storage: Vec<u8>,
    bit_position: u64,
    bit_length: u64,
    resizable: bool,
    growth_factor: f32,
    min_growth: usize,
}

impl Default for BitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BitBuffer {
    /// Creates an empty growable buffer with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&BufferConfig::default())
    }

    /// Creates an empty growable buffer with `capacity` bytes pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(&BufferConfig {
            initial_capacity: capacity,
            ..BufferConfig::default()
        })
    }

    /// Creates an empty growable buffer sized by `config`.
    #[must_use]
    pub fn with_config(config: &BufferConfig) -> Self {
        Self {
            storage: vec![0; config.initial_capacity.min(MAX_CAPACITY)],
            bit_position: 0,
            bit_length: 0,
            resizable: true,
            growth_factor: config.effective_growth_factor(),
            min_growth: config.min_growth,
        }
    }

    /// Wraps existing bytes in a fixed buffer.
    ///
    /// The whole vector is readable and the cursor starts at 0. Writes may
    /// overwrite the contents but never grow the storage.
    #[must_use]
    pub fn wrap(bytes: Vec<u8>) -> Self {
        let bit_length = bytes.len() as u64 * 8;
        Self {
            storage: bytes,
            bit_position: 0,
            bit_length,
            resizable: false,
            growth_factor: BufferConfig::default().growth_factor,
            min_growth: 0,
        }
    }

    /// Copies `bytes` into a fixed buffer. See [`BitBuffer::wrap`].
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::wrap(bytes.to_vec())
    }

    /// Borrows the buffer through a typed writer.
    #[inline]
    pub fn writer(&mut self) -> BitWriter<'_> {
        BitWriter::new(self)
    }

    /// Borrows the buffer through a typed reader.
    #[inline]
    pub fn reader(&mut self) -> BitReader<'_> {
        BitReader::new(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Logical length in bytes, rounded up from [`BitBuffer::bit_len`].
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        bytes_for(self.bit_length)
    }

    /// Logical length in bits (the high-water mark).
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> u64 {
        self.bit_length
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_length == 0
    }

    /// Size of the backing storage in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    fn capacity_bits(&self) -> u64 {
        self.storage.len() as u64 * 8
    }

    /// Returns true if the buffer grows on demand.
    #[inline]
    #[must_use]
    pub const fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Cursor position in bits.
    #[inline]
    #[must_use]
    pub const fn bit_position(&self) -> u64 {
        self.bit_position
    }

    /// Cursor position in bytes, rounded up.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> u64 {
        div8_ceil(self.bit_position)
    }

    /// Returns true if the cursor sits on a byte boundary.
    #[inline]
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_position & 7 == 0
    }

    /// Bits left between the cursor and the high-water mark.
    #[inline]
    #[must_use]
    pub const fn remaining_bits(&self) -> u64 {
        self.bit_length.saturating_sub(self.bit_position)
    }

    /// Moves the cursor to `bit`, clamped to the capacity.
    #[inline]
    pub fn set_bit_position(&mut self, bit: u64) {
        self.bit_position = bit.min(self.capacity_bits());
    }

    /// Moves the cursor to byte `position`, clamped to the capacity.
    #[inline]
    pub fn set_position(&mut self, position: u64) {
        self.set_bit_position(position.saturating_mul(8));
    }

    /// Moves the cursor by whole bytes relative to the start, the cursor, or
    /// the end of the logical length.
    ///
    /// Out-of-range targets are clamped to `0..=capacity`. Returns the new
    /// position in bytes.
    pub fn seek(&mut self, target: SeekFrom) -> u64 {
        let (base, offset) = match target {
            SeekFrom::Start(offset) => (0, i128::from(offset)),
            SeekFrom::Current(offset) => (i128::from(self.bit_position), i128::from(offset)),
            SeekFrom::End(offset) => (i128::from(self.bit_length), i128::from(offset)),
        };
        let bits = (base + offset * 8).clamp(0, i128::from(self.capacity_bits()));
        self.bit_position = u64::try_from(bits).unwrap_or(0);
        self.position()
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Makes sure the storage covers bits up to (excluding) `end_bit`.
    fn ensure_capacity(&mut self, end_bit: u64) -> CodecResult<()> {
        let required = div8_ceil(end_bit);
        if required <= self.storage.len() as u64 {
            return Ok(());
        }
        if !self.resizable {
            return Err(CodecError::NotSupported {
                required,
                capacity: self.storage.len(),
            });
        }
        self.grow(required)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn grow(&mut self, required: u64) -> CodecResult<()> {
        let limit = MAX_CAPACITY as u64;
        if required > limit {
            return Err(CodecError::CapacityOverflow {
                requested: required,
            });
        }

        let current = self.storage.len() as u64;
        // Float to int casts saturate
        let scaled = (current as f64 * f64::from(self.growth_factor)) as u64;
        let target = required
            .max(scaled)
            .max(current.saturating_mul(2))
            .max(self.min_growth as u64)
            .min(limit);
        let target = usize::try_from(target)
            .map_err(|_| CodecError::CapacityOverflow { requested: target })?;

        tracing::trace!(from = current, to = target, "growing bit buffer");
        self.storage.resize(target, 0);
        Ok(())
    }

    /// End bit of an operation that covers `bits` bits from the cursor.
    #[inline]
    fn end_bit(&self, bits: u64) -> CodecResult<u64> {
        self.bit_position
            .checked_add(bits)
            .ok_or(CodecError::CapacityOverflow { requested: u64::MAX })
    }

    /// Makes room for `bits` more bits at the cursor, so that writes
    /// totalling that many bits cannot fail afterwards.
    #[inline]
    pub(crate) fn reserve_bits(&mut self, bits: u64) -> CodecResult<()> {
        let end = self.end_bit(bits)?;
        self.ensure_capacity(end)
    }

    /// Runs a multi-part write as one unit.
    ///
    /// If `write` fails, the cursor, the length and every byte it touched are
    /// put back, so the record is either written whole or not at all.
    pub(crate) fn write_atomic<R>(
        &mut self,
        write: impl FnOnce(&mut Self) -> CodecResult<R>,
    ) -> CodecResult<R> {
        let position = self.bit_position;
        let length = self.bit_length;
        let first = byte_index(position);
        let last = bytes_for(length).max(first);
        let overwritten = self.storage[first..last].to_vec();

        let result = write(self);
        if result.is_err() {
            self.storage[first..last].copy_from_slice(&overwritten);
            self.clear_bits(length, self.bit_length);
            self.bit_position = position;
            self.bit_length = length;
        }
        result
    }

    /// Resizes the backing storage to exactly `capacity` bytes.
    ///
    /// # Errors
    ///
    /// - [`CodecError::NotSupported`] on a fixed buffer
    /// - [`CodecError::OutOfRange`] if `capacity` is below the current length
    /// - [`CodecError::CapacityOverflow`] above [`MAX_CAPACITY`]
    pub fn set_capacity(&mut self, capacity: usize) -> CodecResult<()> {
        if capacity == self.storage.len() {
            return Ok(());
        }
        if !self.resizable {
            return Err(CodecError::NotSupported {
                required: capacity as u64,
                capacity: self.storage.len(),
            });
        }
        if capacity > MAX_CAPACITY {
            return Err(CodecError::CapacityOverflow {
                requested: capacity as u64,
            });
        }
        if capacity < self.len() {
            return Err(CodecError::out_of_range(
                "capacity",
                format!("{capacity} is below the length {}", self.len()),
            ));
        }

        self.storage.resize(capacity, 0);
        self.storage.shrink_to_fit();
        self.bit_position = self.bit_position.min(self.capacity_bits());
        Ok(())
    }

    /// Truncates or extends the logical length to `length` bytes.
    ///
    /// Extending grows the storage if needed and exposes zero bytes.
    /// Truncating zeroes the cut bits and pulls the cursor back if it sat
    /// past the new end.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    pub fn set_length(&mut self, length: usize) -> CodecResult<()> {
        let bits = (length as u64)
            .checked_mul(8)
            .ok_or(CodecError::CapacityOverflow {
                requested: length as u64,
            })?;
        self.ensure_capacity(bits)?;

        if bits < self.bit_length {
            self.clear_bits(bits, self.bit_length);
        }
        self.bit_length = bits;
        self.bit_position = self.bit_position.min(bits);
        Ok(())
    }

    /// Zeroes storage bits in `from..to`.
    fn clear_bits(&mut self, from: u64, to: u64) {
        if from >= to {
            return;
        }
        let mut start = byte_index(from);
        let offset = from & 7;
        if offset != 0 {
            self.storage[start] &= (1u8 << offset) - 1;
            start += 1;
        }
        let end = bytes_for(to);
        if start < end {
            self.storage[start..end].fill(0);
        }
    }

    /// Empties the buffer. Storage is kept.
    pub fn reset(&mut self) {
        self.clear_bits(0, self.bit_length);
        self.bit_position = 0;
        self.bit_length = 0;
    }

    #[inline]
    fn advance_write(&mut self, bits: u64) {
        self.bit_position += bits;
        if self.bit_position > self.bit_length {
            self.bit_length = self.bit_position;
        }
    }

    /// Fails with [`CodecError::EndOfData`] unless `bits` bits remain.
    #[inline]
    pub(crate) fn require(&self, bits: u64) -> CodecResult<()> {
        let available = self.remaining_bits();
        if bits > available {
            return Err(CodecError::EndOfData {
                requested: bits,
                available,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Sub-byte primitives
    // =========================================================================

    /// Stores the low `count` bits of `value` (1..=8) at the cursor.
    ///
    /// Capacity for the write must already be ensured.
    #[inline]
    fn store_bits(&mut self, value: u8, count: u32) {
        let index = byte_index(self.bit_position);
        let offset = bit_offset(self.bit_position);
        let mask = ((1u16 << count) - 1) << offset;
        let span = (u16::from(value) << offset) & mask;

        let high = self.storage.get(index + 1).copied().unwrap_or(0);
        let current = u16::from_le_bytes([self.storage[index], high]);
        let [lo, hi] = ((current & !mask) | span).to_le_bytes();

        self.storage[index] = lo;
        if mask > 0xFF {
            self.storage[index + 1] = hi;
        }
        self.advance_write(u64::from(count));
    }

    /// Loads `count` bits (1..=8) from the cursor.
    ///
    /// The caller must have checked that `count` bits remain.
    #[inline]
    fn load_bits(&mut self, count: u32) -> u8 {
        let index = byte_index(self.bit_position);
        let offset = bit_offset(self.bit_position);

        let high = self.storage.get(index + 1).copied().unwrap_or(0);
        let current = u16::from_le_bytes([self.storage[index], high]);
        let value = (current >> offset) & ((1u16 << count) - 1);

        self.bit_position += u64::from(count);
        value.to_le_bytes()[0]
    }

    // =========================================================================
    // Bits
    // =========================================================================

    /// Writes a single bit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    pub fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
        let end = self.end_bit(1)?;
        self.ensure_capacity(end)?;

        let index = byte_index(self.bit_position);
        let flag = 1u8 << (self.bit_position & 7);
        if bit {
            self.storage[index] |= flag;
        } else {
            self.storage[index] &= !flag;
        }
        self.advance_write(1);
        Ok(())
    }

    /// Reads a single bit, or `None` at the end of the data.
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.remaining_bits() == 0 {
            return None;
        }
        let index = byte_index(self.bit_position);
        let flag = 1u8 << (self.bit_position & 7);
        self.bit_position += 1;
        Some(self.storage[index] & flag != 0)
    }

    /// Writes the low `count` bits of `value`, least significant first.
    ///
    /// Writing 0 bits is a no-op.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if `count > 64`
    /// - [`CodecError::NotSupported`] if a fixed buffer is full
    pub fn write_bits(&mut self, value: u64, count: u32) -> CodecResult<()> {
        if count > 64 {
            return Err(CodecError::out_of_range("bit count", format!("{count} > 64")));
        }
        if count == 0 {
            return Ok(());
        }
        let end = self.end_bit(u64::from(count))?;
        self.ensure_capacity(end)?;

        let mut remaining = count;
        let mut bits = value;
        while remaining > 0 {
            let chunk = remaining.min(8);
            self.store_bits(bits.to_le_bytes()[0], chunk);
            bits >>= 8;
            remaining -= chunk;
        }
        Ok(())
    }

    /// Reads `count` bits written by [`BitBuffer::write_bits`].
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if `count > 64`
    /// - [`CodecError::EndOfData`] if fewer than `count` bits remain
    pub fn read_bits(&mut self, count: u32) -> CodecResult<u64> {
        if count > 64 {
            return Err(CodecError::out_of_range("bit count", format!("{count} > 64")));
        }
        self.require(u64::from(count))?;

        let mut value = 0u64;
        let mut shift = 0;
        while shift < count {
            let chunk = (count - shift).min(8);
            value |= u64::from(self.load_bits(chunk)) << shift;
            shift += chunk;
        }
        Ok(value)
    }

    /// Writes the low 4 bits of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    pub fn write_nibble(&mut self, value: u8) -> CodecResult<()> {
        self.write_bits(u64::from(value), 4)
    }

    /// Reads 4 bits.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if fewer than 4 bits remain.
    pub fn read_nibble(&mut self) -> CodecResult<u8> {
        self.require(4)?;
        Ok(self.load_bits(4))
    }

    /// Writes zero bits up to the next byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    pub fn write_pad_bits(&mut self) -> CodecResult<()> {
        self.write_bits(0, pad_len(self.bit_position))
    }

    /// Skips to the next byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] if the padding was never written.
    pub fn skip_pad_bits(&mut self) -> CodecResult<()> {
        let pad = u64::from(pad_len(self.bit_position));
        self.require(pad)?;
        self.bit_position += pad;
        Ok(())
    }

    // =========================================================================
    // Bytes
    // =========================================================================

    /// Writes one byte at any bit offset.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is full.
    pub fn write_byte(&mut self, value: u8) -> CodecResult<()> {
        let end = self.end_bit(8)?;
        self.ensure_capacity(end)?;

        if self.is_aligned() {
            self.storage[byte_index(self.bit_position)] = value;
            self.advance_write(8);
        } else {
            self.store_bits(value, 8);
        }
        Ok(())
    }

    /// Reads one byte, or `None` if fewer than 8 bits remain.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.remaining_bits() < 8 {
            return None;
        }
        if self.is_aligned() {
            let value = self.storage[byte_index(self.bit_position)];
            self.bit_position += 8;
            Some(value)
        } else {
            Some(self.load_bits(8))
        }
    }

    /// Reads one byte, failing with [`CodecError::EndOfData`] at the end.
    #[inline]
    pub(crate) fn take_byte(&mut self) -> CodecResult<u8> {
        self.require(8)?;
        self.read_byte().ok_or(CodecError::EndOfData {
            requested: 8,
            available: self.remaining_bits(),
        })
    }

    /// Writes `data` at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NotSupported`] if a fixed buffer is too small.
    /// Nothing is written in that case.
    pub fn write(&mut self, data: &[u8]) -> CodecResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let bits = (data.len() as u64)
            .checked_mul(8)
            .ok_or(CodecError::CapacityOverflow { requested: u64::MAX })?;
        let end = self.end_bit(bits)?;
        self.ensure_capacity(end)?;

        if self.is_aligned() {
            let start = byte_index(self.bit_position);
            self.storage[start..start + data.len()].copy_from_slice(data);
            self.advance_write(bits);
        } else {
            for &byte in data {
                self.store_bits(byte, 8);
            }
        }
        Ok(())
    }

    /// Reads up to `out.len()` whole bytes and returns how many were read.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let available = usize::try_from(self.remaining_bits() / 8).unwrap_or(usize::MAX);
        let count = out.len().min(available);
        if count == 0 {
            return 0;
        }

        if self.is_aligned() {
            let start = byte_index(self.bit_position);
            out[..count].copy_from_slice(&self.storage[start..start + count]);
            self.bit_position += count as u64 * 8;
        } else {
            for slot in &mut out[..count] {
                *slot = self.load_bits(8);
            }
        }
        count
    }

    /// Fills `out` completely.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EndOfData`] without consuming anything if fewer
    /// than `out.len()` bytes remain.
    pub fn read_exact(&mut self, out: &mut [u8]) -> CodecResult<()> {
        self.require(out.len() as u64 * 8)?;
        self.read(out);
        Ok(())
    }

    /// Appends the first `count` bytes of `source` (all of it if `None`).
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if `count` exceeds the source length
    /// - [`CodecError::NotSupported`] if a fixed buffer is too small
    pub fn copy_from(&mut self, source: &BitBuffer, count: Option<usize>) -> CodecResult<()> {
        let bytes = source.as_slice();
        let count = count.unwrap_or(bytes.len());
        if count > bytes.len() {
            return Err(CodecError::out_of_range(
                "copy length",
                format!("{count} exceeds source length {}", bytes.len()),
            ));
        }
        self.write(&bytes[..count])
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// The logical contents: exactly [`BitBuffer::len`] bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len()]
    }

    /// Copies out the logical contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// The whole backing storage, including unused capacity.
    ///
    /// For callers that track the valid length themselves.
    #[inline]
    #[must_use]
    pub fn get_buffer(&self) -> &[u8] {
        &self.storage
    }

    /// Consumes the buffer, returning exactly [`BitBuffer::len`] bytes.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        let len = self.len();
        self.storage.truncate(len);
        self.storage
    }
}

impl fmt::Display for BitBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
