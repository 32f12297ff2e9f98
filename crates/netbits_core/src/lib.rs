//! # NETBITS Core
//!
//! Leaf helpers for the NETBITS replication codec:
//! - Integer arithmetic used to size bit streams (ceiling division, `Div8Ceil`)
//! - ZigZag mapping of signed integers onto unsigned ones for varint packing
//! - A bounded object pool for recycling buffers between messages
//!
//! ## Architecture Rules
//!
//! 1. **No codec knowledge** - this crate never sees a byte layout
//! 2. **Explicit ownership** - pools are values owned by a context, never globals
//! 3. **Serialized free lists** - every pool guards its free list with one lock
//!
//! ## Example
//!
//! ```rust
//! use netbits_core::{div8_ceil, zigzag_decode, zigzag_encode};
//!
//! assert_eq!(div8_ceil(9), 2);
//! assert_eq!(zigzag_encode(-1), 1);
//! assert_eq!(zigzag_decode(zigzag_encode(i64::MIN)), i64::MIN);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arithmetic;
pub mod memory;

pub use arithmetic::{ceiling_exact, div8_ceil, varint_len, zigzag_decode, zigzag_encode};
pub use memory::{ObjectPool, PoolConfig, PoolError, PoolId, PoolStats, Poolable, Pooled};
