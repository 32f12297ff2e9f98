//! # String Codec
//!
//! Strings are sent as a packed unit count followed by the units.
//!
//! | Encoding     | Unit              | Per unit       |
//! |--------------|-------------------|----------------|
//! | `Wide`       | UTF-16 code unit  | 2 bytes, LE    |
//! | `SingleByte` | `char` <= U+00FF  | 1 byte         |
//! | `Packed`     | UTF-16 code unit  | packed `u16`   |

use crate::array::{check_count, MIN_PACKED_BITS};
use crate::buffer::BitBuffer;
use crate::element::FixedElement;
use crate::error::{CodecError, CodecResult};
use crate::packed::{read_len, read_packed_u16, write_len, write_packed_u16};
use crate::reader::BitReader;
use crate::writer::BitWriter;

/// How string characters are laid out on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CharEncoding {
    /// Two bytes per UTF-16 code unit.
    #[default]
    Wide,
    /// One byte per character. Only U+0000..=U+00FF can be written.
    SingleByte,
    /// One packed integer per UTF-16 code unit. ASCII costs one byte.
    Packed,
}

impl CharEncoding {
    /// Number of units `c` occupies.
    #[inline]
    #[must_use]
    pub fn unit_width(self, c: char) -> usize {
        match self {
            Self::Wide | Self::Packed => c.len_utf16(),
            Self::SingleByte => 1,
        }
    }

    /// Number of units `text` occupies.
    #[must_use]
    pub fn unit_len(self, text: &str) -> usize {
        match self {
            Self::Wide | Self::Packed => text.encode_utf16().count(),
            Self::SingleByte => text.chars().count(),
        }
    }

    /// Smallest encoding of one unit, in bits.
    const fn min_unit_bits(self) -> u64 {
        match self {
            Self::Wide => 16,
            Self::SingleByte | Self::Packed => MIN_PACKED_BITS,
        }
    }
}

/// Checks that every character of `text` fits the encoding.
pub(crate) fn validate(text: &str, encoding: CharEncoding) -> CodecResult<()> {
    if encoding == CharEncoding::SingleByte {
        if let Some(c) = text.chars().find(|&c| u8::try_from(c).is_err()) {
            return Err(CodecError::Unrepresentable(c));
        }
    }
    Ok(())
}

/// Writes the units of `text` with no count prefix.
///
/// Callers run [`validate`] first so a bad character writes nothing.
pub(crate) fn write_units(buffer: &mut BitBuffer, text: &str, encoding: CharEncoding) -> CodecResult<()> {
    match encoding {
        CharEncoding::Wide => text
            .encode_utf16()
            .try_for_each(|unit| unit.write_fixed(buffer)),
        CharEncoding::Packed => text
            .encode_utf16()
            .try_for_each(|unit| write_packed_u16(buffer, unit)),
        CharEncoding::SingleByte => text.chars().try_for_each(|c| {
            let byte = u8::try_from(c).map_err(|_| CodecError::Unrepresentable(c))?;
            buffer.write_byte(byte)
        }),
    }
}

/// Reads `count` units and appends the decoded text to `out`.
pub(crate) fn read_units_into(
    buffer: &mut BitBuffer,
    count: usize,
    encoding: CharEncoding,
    out: &mut String,
) -> CodecResult<()> {
    check_count(buffer, count, encoding.min_unit_bits())?;
    out.reserve(count);

    match encoding {
        CharEncoding::SingleByte => {
            for _ in 0..count {
                out.push(char::from(buffer.take_byte()?));
            }
        }
        CharEncoding::Wide | CharEncoding::Packed => {
            let mut units = Vec::with_capacity(count);
            for _ in 0..count {
                let unit = if encoding == CharEncoding::Wide {
                    u16::read_fixed(buffer)?
                } else {
                    read_packed_u16(buffer)?
                };
                units.push(unit);
            }
            for decoded in char::decode_utf16(units) {
                out.push(decoded.map_err(|_| CodecError::InvalidUtf16)?);
            }
        }
    }
    Ok(())
}

impl BitWriter<'_> {
    /// Writes `text` with a unit-count prefix.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Unrepresentable`] in `SingleByte` mode for a character
    ///   above U+00FF, before anything is written
    /// - [`CodecError::NotSupported`] if a fixed buffer is too small, leaving
    ///   the buffer as it was
    pub fn write_string(&mut self, text: &str, encoding: CharEncoding) -> CodecResult<()> {
        validate(text, encoding)?;
        self.buffer.write_atomic(|buffer| {
            write_len(buffer, encoding.unit_len(text))?;
            write_units(buffer, text, encoding)
        })
    }
}

impl BitReader<'_> {
    /// Reads a string written by [`BitWriter::write_string`] in the same encoding.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfRange`] if the declared length overruns the data
    /// - [`CodecError::InvalidUtf16`] for unpaired surrogates
    pub fn read_string(&mut self, encoding: CharEncoding) -> CodecResult<String> {
        let mut out = String::new();
        self.read_string_into(&mut out, encoding)?;
        Ok(out)
    }

    /// Like [`BitReader::read_string`], replacing the contents of `out`.
    ///
    /// `out` is left unspecified on error.
    ///
    /// # Errors
    ///
    /// As [`BitReader::read_string`].
    pub fn read_string_into(&mut self, out: &mut String, encoding: CharEncoding) -> CodecResult<()> {
        let count = read_len(self.buffer)?;
        out.clear();
        read_units_into(self.buffer, count, encoding, out)
    }
}
