//! # NETBITS Codec
//!
//! Bit-level serialization for state replication.
//!
//! ## Building Blocks
//!
//! - [`BitBuffer`]: growable or fixed storage with a bit-granular cursor
//! - [`BitWriter`] / [`BitReader`]: typed views over a buffer
//! - [`packed`]: LEB128 + ZigZag integers and flag-prefixed packed floats
//! - Arrays and strings with a packed count prefix ([`CharEncoding`])
//! - Array and string diffs against a baseline both ends already hold
//! - [`CodecContext`]: configuration plus a pool of recycled buffers
//!
//! ## Wire Rules
//!
//! 1. **Host independent** - fixed-width values are little-endian and bits
//!    fill each byte least-significant first, on every platform
//! 2. **Fixed means fixed** - a wrapped buffer never grows, it fails
//! 3. **Bit exact** - floats round-trip by bit pattern, `-0.0` and NaN
//!    payloads included
//!
//! ## Example
//!
//! ```rust
//! use netbits_codec::{BitBuffer, CharEncoding};
//!
//! let mut buffer = BitBuffer::new();
//! {
//!     let mut writer = buffer.writer();
//!     writer.write_bit(true).unwrap();
//!     writer.write_i64_packed(-1_469_598_103_934_656_037).unwrap();
//!     writer.write_array_diff(&[0.02f64, 0.06, 1e40, 256.0], &[0.2, 6.0, 1e39]).unwrap();
//!     writer.write_string_diff("Heyo,  World", "Hello, World", CharEncoding::Wide).unwrap();
//! }
//!
//! buffer.set_bit_position(0);
//! let mut reader = buffer.reader();
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_i64_packed().unwrap(), -1_469_598_103_934_656_037);
//! assert_eq!(
//!     reader.read_array_diff(&[0.02f64, 0.06, 1e40, 256.0]).unwrap(),
//!     [0.2, 6.0, 1e39]
//! );
//! assert_eq!(
//!     reader.read_string_diff("Heyo,  World", CharEncoding::Wide).unwrap(),
//!     "Hello, World"
//! );
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod array;
pub mod buffer;
pub mod config;
mod diff;
pub mod element;
pub mod error;
pub mod packed;
pub mod pool;
pub mod reader;
pub mod string;
pub mod writer;

pub use buffer::{BitBuffer, MAX_CAPACITY};
pub use config::{BufferConfig, CodecConfig};
pub use element::{FixedElement, PackedElement};
pub use error::{CodecError, CodecResult};
pub use netbits_core::{PoolConfig, PoolError, PoolStats};
pub use pool::{BufferPool, CodecContext, PooledBuffer};
pub use reader::BitReader;
pub use string::CharEncoding;
pub use writer::BitWriter;
