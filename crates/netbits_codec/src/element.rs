//! # Element Traits
//!
//! Scalar types that can be stored in arrays and array diffs.

use bytemuck::Pod;

use crate::buffer::BitBuffer;
use crate::error::CodecResult;
use crate::packed;

/// A scalar with a fixed-width little-endian encoding.
///
/// The `Pod` bound lets arrays of these types be copied as raw bytes on
/// little-endian hosts.
pub trait FixedElement: Pod {
    /// Encoded width in bits.
    const BITS: u32;

    /// Writes the value in its fixed-width encoding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodecError::NotSupported`] if a fixed buffer is full.
    fn write_fixed(self, buffer: &mut BitBuffer) -> CodecResult<()>;

    /// Reads a value in its fixed-width encoding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodecError::EndOfData`] if too few bits remain.
    fn read_fixed(buffer: &mut BitBuffer) -> CodecResult<Self>;

    /// Bit-pattern equality: `-0.0` differs from `0.0`, identical NaNs match.
    #[inline]
    fn same_bits(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

/// A scalar that also has a packed encoding.
pub trait PackedElement: FixedElement {
    /// Writes the value in its packed encoding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodecError::NotSupported`] if a fixed buffer is full.
    fn write_packed(self, buffer: &mut BitBuffer) -> CodecResult<()>;

    /// Reads a value in its packed encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated, malformed, or too wide.
    fn read_packed(buffer: &mut BitBuffer) -> CodecResult<Self>;
}

macro_rules! impl_fixed {
    ($($ty:ty => $bytes:literal),* $(,)?) => {$(
        impl FixedElement for $ty {
            const BITS: u32 = $bytes * 8;

            #[inline]
            fn write_fixed(self, buffer: &mut BitBuffer) -> CodecResult<()> {
                buffer.write(&self.to_le_bytes())
            }

            #[inline]
            fn read_fixed(buffer: &mut BitBuffer) -> CodecResult<Self> {
                let mut bytes = [0u8; $bytes];
                buffer.read_exact(&mut bytes)?;
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    )*};
}

impl_fixed! {
    u8 => 1,
    i8 => 1,
    u16 => 2,
    i16 => 2,
    u32 => 4,
    i32 => 4,
    u64 => 8,
    i64 => 8,
    f32 => 4,
    f64 => 8,
}

// Single bytes gain nothing from packing
impl PackedElement for u8 {
    #[inline]
    fn write_packed(self, buffer: &mut BitBuffer) -> CodecResult<()> {
        self.write_fixed(buffer)
    }

    #[inline]
    fn read_packed(buffer: &mut BitBuffer) -> CodecResult<Self> {
        Self::read_fixed(buffer)
    }
}

impl PackedElement for i8 {
    #[inline]
    fn write_packed(self, buffer: &mut BitBuffer) -> CodecResult<()> {
        self.write_fixed(buffer)
    }

    #[inline]
    fn read_packed(buffer: &mut BitBuffer) -> CodecResult<Self> {
        Self::read_fixed(buffer)
    }
}

macro_rules! impl_packed {
    ($($ty:ty => $write:ident, $read:ident;)*) => {$(
        impl PackedElement for $ty {
            #[inline]
            fn write_packed(self, buffer: &mut BitBuffer) -> CodecResult<()> {
                packed::$write(buffer, self)
            }

            #[inline]
            fn read_packed(buffer: &mut BitBuffer) -> CodecResult<Self> {
                packed::$read(buffer)
            }
        }
    )*};
}

impl_packed! {
    u16 => write_packed_u16, read_packed_u16;
    i16 => write_packed_i16, read_packed_i16;
    u32 => write_packed_u32, read_packed_u32;
    i32 => write_packed_i32, read_packed_i32;
    u64 => write_packed_u64, read_packed_u64;
    i64 => write_packed_i64, read_packed_i64;
    f32 => write_packed_f32, read_packed_f32;
    f64 => write_packed_f64, read_packed_f64;
}
