//! # Arithmetic Helpers
//!
//! Small integer routines shared by the bit buffer and the packed codecs.
//! All of them are `const fn` and allocation free.

/// Maximum number of bytes a packed (LEB128) `u64` can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Integer ceiling division.
///
/// Returns the smallest `k` such that `k * denominator >= numerator`.
///
/// # Panics
///
/// Panics if `denominator` is zero.
#[inline]
#[must_use]
pub const fn ceiling_exact(numerator: u64, denominator: u64) -> u64 {
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// Converts a length in bits to the number of bytes needed to hold it.
#[inline]
#[must_use]
pub const fn div8_ceil(bits: u64) -> u64 {
    ceiling_exact(bits, 8)
}

/// Maps a signed value onto an unsigned one so that small magnitudes stay small.
///
/// `0, -1, 1, -2, 2, ...` become `0, 1, 2, 3, 4, ...`.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Exact inverse of [`zigzag_encode`].
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes the LEB128 encoding of `value` occupies (1..=10).
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let significant = 64 - value.leading_zeros() as usize;
    (significant + 6) / 7
}
