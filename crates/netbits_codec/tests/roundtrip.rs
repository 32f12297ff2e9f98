//! # Round-Trip Verification
//!
//! End-to-end checks of the public codec surface: every write has a matching
//! read that reproduces the value exactly, at any bit offset, and every diff
//! applied to its baseline reproduces the new value.

#![allow(missing_docs)]

use netbits_codec::{BitBuffer, CharEncoding, CodecConfig, CodecContext, CodecError};
use netbits_core::{ceiling_exact, zigzag_decode, zigzag_encode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// ARITHMETIC
// =============================================================================

#[test]
fn test_zigzag_full_range() {
    for value in [i64::MIN, i64::MAX, 0, -1, 1] {
        assert_eq!(zigzag_decode(zigzag_encode(value)), value);
    }
}

#[test]
fn test_ceiling_exact_matches_float_ceil() {
    for n in 0..500u64 {
        for d in 1..20u64 {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let expected = (n as f64 / d as f64).ceil() as u64;
            assert_eq!(ceiling_exact(n, d), expected);
        }
    }
}

// =============================================================================
// BIT BUFFER
// =============================================================================

#[test]
fn test_three_bits() {
    let mut buffer = BitBuffer::new();
    buffer.write_bit(true).unwrap();
    buffer.write_bit(false).unwrap();
    buffer.write_bit(true).unwrap();

    buffer.set_bit_position(0);
    assert_eq!(buffer.read_bit(), Some(true));
    assert_eq!(buffer.read_bit(), Some(false));
    assert_eq!(buffer.read_bit(), Some(true));
}

#[test]
fn test_growth_from_four_bytes() {
    let mut buffer = BitBuffer::with_capacity(4);
    for byte in [10u8, 20, 30, 40, 50] {
        buffer.write_byte(byte).unwrap();
    }
    assert_eq!(buffer.len(), 5);
    assert!(buffer.capacity() >= 5);
    assert_eq!(buffer.to_vec(), vec![10, 20, 30, 40, 50]);
}

#[test]
fn test_zero_length_external_buffer() {
    let mut buffer = BitBuffer::wrap(Vec::new());
    assert!(matches!(
        buffer.write(&[1, 2]),
        Err(CodecError::NotSupported { .. })
    ));
}

#[test]
fn test_sixteen_bytes_after_one_bit() {
    let data = [0u8, 5, 2, 54, 192, 60, 214, 65, 95, 2, 43, 62, 252, 190, 45, 2];
    let mut buffer = BitBuffer::new();
    buffer.write_bit(true).unwrap();
    buffer.write(&data).unwrap();

    buffer.set_bit_position(0);
    assert_eq!(buffer.read_bit(), Some(true));
    let mut out = [0u8; 16];
    assert_eq!(buffer.read(&mut out), 16);
    assert_eq!(out, data);
}

#[test]
fn test_random_bit_groups_at_random_offsets() {
    let mut rng = StdRng::seed_from_u64(0xB175);
    let groups: Vec<(u64, u32)> = (0..2_000)
        .map(|_| {
            let width = rng.gen_range(0..=64u32);
            let value = if width == 64 {
                rng.gen()
            } else {
                rng.gen::<u64>() & ((1u64 << width) - 1)
            };
            (value, width)
        })
        .collect();

    let mut buffer = BitBuffer::with_capacity(1);
    for &(value, width) in &groups {
        buffer.write_bits(value, width).unwrap();
    }

    buffer.set_bit_position(0);
    for &(value, width) in &groups {
        assert_eq!(buffer.read_bits(width).unwrap(), value);
    }
    assert_eq!(buffer.remaining_bits(), 0);
}

#[test]
fn test_overwrite_inside_written_region() {
    let mut buffer = BitBuffer::new();
    buffer.write(&[0xFF; 4]).unwrap();

    buffer.set_bit_position(5);
    buffer.write_bits(0, 13).unwrap();
    assert_eq!(buffer.bit_len(), 32);
    assert_eq!(buffer.to_vec(), vec![0x1F, 0x00, 0xFC, 0xFF]);
}

// =============================================================================
// PACKED SCALARS
// =============================================================================

#[test]
fn test_packed_reference_values() {
    let mut buffer = BitBuffer::new();
    {
        let mut writer = buffer.writer();
        writer.write_i64_packed(-1_469_598_103_934_656_037).unwrap();
        writer.write_i16_packed(-31934).unwrap();
        writer.write_u16_packed(64893).unwrap();
        writer.write_i32_packed(-100_913_642).unwrap();
        writer.write_u32_packed(1_467_867_235).unwrap();
    }

    buffer.set_bit_position(0);
    let mut reader = buffer.reader();
    assert_eq!(reader.read_i64_packed().unwrap(), -1_469_598_103_934_656_037);
    assert_eq!(reader.read_i16_packed().unwrap(), -31934);
    assert_eq!(reader.read_u16_packed().unwrap(), 64893);
    assert_eq!(reader.read_i32_packed().unwrap(), -100_913_642);
    assert_eq!(reader.read_u32_packed().unwrap(), 1_467_867_235);
}

#[test]
fn test_packed_random_values_misaligned() {
    let mut rng = StdRng::seed_from_u64(99);
    let signed: Vec<i64> = (0..500).map(|_| rng.gen::<i64>() >> rng.gen_range(0..64)).collect();
    let floats: Vec<u32> = (0..500).map(|_| rng.gen()).collect();

    let mut buffer = BitBuffer::new();
    {
        let mut writer = buffer.writer();
        writer.write_bits(0b101, 3).unwrap();
        for (&value, &bits) in signed.iter().zip(&floats) {
            writer.write_i64_packed(value).unwrap();
            writer.write_f32_packed(f32::from_bits(bits)).unwrap();
        }
    }

    buffer.set_bit_position(3);
    let mut reader = buffer.reader();
    for (&value, &bits) in signed.iter().zip(&floats) {
        assert_eq!(reader.read_i64_packed().unwrap(), value);
        assert_eq!(reader.read_f32_packed().unwrap().to_bits(), bits);
    }
}

#[test]
fn test_packed_special_floats() {
    let specials = [
        0.0f64,
        -0.0,
        f64::NAN,
        f64::from_bits(0x7FF0_0000_0000_0001),
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::MIN_POSITIVE / 2.0,
        f64::EPSILON,
    ];

    let mut buffer = BitBuffer::new();
    for value in specials {
        buffer.writer().write_f64_packed(value).unwrap();
    }

    buffer.set_bit_position(0);
    let mut reader = buffer.reader();
    for value in specials {
        assert_eq!(reader.read_f64_packed().unwrap().to_bits(), value.to_bits());
    }
}

// =============================================================================
// ARRAYS & STRINGS
// =============================================================================

#[test]
fn test_packed_byte_array() {
    let mut buffer = BitBuffer::new();
    buffer.writer().write_array_packed(&[1u8, 2, 13, 37, 69]).unwrap();

    buffer.set_bit_position(0);
    let decoded = buffer.reader().read_array_packed::<u8>().unwrap();
    assert_eq!(decoded, [1, 2, 13, 37, 69]);
    assert_eq!(decoded.len(), 5);
}

#[test]
fn test_mixed_arrays_and_strings() {
    let ints = [1337i32, 69420, 12345, 0, 0, 5];
    let doubles = [0.02f64, 0.06, 1e40, 256.0];

    let mut buffer = BitBuffer::new();
    {
        let mut writer = buffer.writer();
        writer.write_nibble(0x9).unwrap();
        writer.write_array(&ints).unwrap();
        writer.write_string("Hello, World", CharEncoding::Wide).unwrap();
        writer.write_array_packed(&doubles).unwrap();
        writer.write_string("plain", CharEncoding::SingleByte).unwrap();
        writer.write_pad_bits().unwrap();
        writer.write_string("\u{1F980}", CharEncoding::Packed).unwrap();
    }

    buffer.set_bit_position(0);
    let mut reader = buffer.reader();
    assert_eq!(reader.read_nibble().unwrap(), 0x9);
    assert_eq!(reader.read_array::<i32>().unwrap(), ints);
    assert_eq!(reader.read_string(CharEncoding::Wide).unwrap(), "Hello, World");
    assert_eq!(reader.read_array_packed::<f64>().unwrap(), doubles);
    assert_eq!(reader.read_string(CharEncoding::SingleByte).unwrap(), "plain");
    reader.skip_pad_bits().unwrap();
    assert_eq!(reader.read_string(CharEncoding::Packed).unwrap(), "\u{1F980}");
}

#[test]
fn test_array_count_overrun_is_clean() {
    let mut buffer = BitBuffer::new();
    buffer.writer().write_u64_packed(1 << 40).unwrap();

    buffer.set_bit_position(0);
    assert!(matches!(
        buffer.reader().read_array::<u8>(),
        Err(CodecError::OutOfRange { .. })
    ));
}

// =============================================================================
// DIFFS
// =============================================================================

#[test]
fn test_string_diff_both_modes() {
    for encoding in [CharEncoding::Wide, CharEncoding::SingleByte, CharEncoding::Packed] {
        let mut buffer = BitBuffer::new();
        buffer
            .writer()
            .write_string_diff("Heyo,  World", "Hello, World", encoding)
            .unwrap();

        buffer.set_bit_position(0);
        let mut target = String::from("Heyo,  World");
        buffer.reader().read_string_diff_into(&mut target, encoding).unwrap();
        assert_eq!(target, "Hello, World");
    }
}

#[test]
fn test_double_array_diff_shrinks() {
    let baseline = [0.02f64, 0.06, 1e40, 256.0];
    let current = [0.2f64, 6.0, 1e39];

    let mut buffer = BitBuffer::new();
    buffer.writer().write_array_diff(&baseline, &current).unwrap();

    buffer.set_bit_position(0);
    let decoded = buffer.reader().read_array_diff(&baseline).unwrap();
    assert_eq!(decoded.len(), 3);
    for (got, want) in decoded.iter().zip(&current) {
        assert_eq!(got.to_bits(), want.to_bits());
    }
}

#[test]
fn test_random_array_diffs() {
    let mut rng = StdRng::seed_from_u64(0xD1FF);
    for _ in 0..200 {
        let old_len = rng.gen_range(0..80);
        let new_len = rng.gen_range(0..80);
        let baseline: Vec<i64> = (0..old_len).map(|_| rng.gen_range(-1000..1000)).collect();
        let current: Vec<i64> = (0..new_len)
            .map(|i| {
                if i < old_len && rng.gen_bool(0.7) {
                    baseline[i]
                } else {
                    rng.gen()
                }
            })
            .collect();

        let mut buffer = BitBuffer::new();
        {
            let mut writer = buffer.writer();
            writer.write_array_diff(&baseline, &current).unwrap();
            writer.write_array_packed_diff(&baseline, &current).unwrap();
        }

        buffer.set_bit_position(0);
        let mut reader = buffer.reader();
        assert_eq!(reader.read_array_diff(&baseline).unwrap(), current);
        assert_eq!(reader.read_array_packed_diff(&baseline).unwrap(), current);
        assert_eq!(reader.remaining_bits(), 0);
    }
}

#[test]
fn test_diff_is_smaller_than_full_value() {
    let baseline: Vec<u32> = (0..64).collect();
    let mut current = baseline.clone();
    current[10] = 1_000_000;

    let mut diff = BitBuffer::new();
    diff.writer().write_array_diff(&baseline, &current).unwrap();

    let mut full = BitBuffer::new();
    full.writer().write_array(&current).unwrap();

    assert!(diff.len() < full.len());
}

// =============================================================================
// POOLING
// =============================================================================

#[test]
fn test_pool_returns_clean_buffers() {
    let context = CodecContext::new(CodecConfig::default()).unwrap();

    let mut buffer = context.acquire();
    buffer
        .writer()
        .write_string("leftover", CharEncoding::Wide)
        .unwrap();
    context.release(buffer).unwrap();

    let mut buffer = context.acquire();
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.bit_position(), 0);

    // Recycled storage must not leak old bits into new output
    buffer.write_bit(true).unwrap();
    assert_eq!(buffer.to_vec(), vec![0x01]);
}

#[test]
fn test_context_from_toml() {
    let config = CodecConfig::from_toml_str(
        r"
        [buffer]
        initial_capacity = 8

        [pool]
        max_retained = 2
        ",
    )
    .unwrap();
    let context = CodecContext::new(config).unwrap();

    let buffer = context.acquire();
    assert_eq!(buffer.capacity(), 8);
    assert_eq!(context.config().pool.max_retained, 2);
}
