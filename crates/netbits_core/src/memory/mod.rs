//! # Memory Management
//!
//! Reusable instance pools for codec buffers.
//!
//! ## Design Philosophy
//!
//! Replication traffic is bursty. Buffers are recycled between messages:
//! - No allocation once the pool is warm
//! - Bounded retention so a burst does not pin memory forever
//! - Misuse (double return) is detected and reported, never silently absorbed

mod pool;

pub use pool::{ObjectPool, PoolConfig, PoolError, PoolId, PoolStats, Poolable, Pooled};
