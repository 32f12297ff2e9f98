//! # Buffer Pooling
//!
//! Recycles [`BitBuffer`]s between messages through an explicit
//! [`CodecContext`] instead of a process-wide singleton.
//!
//! Readers and writers are borrowed views over a buffer and cost nothing to
//! create, so only buffers are pooled.

use std::path::Path;

use netbits_core::{ObjectPool, Poolable, Pooled};

use crate::buffer::BitBuffer;
use crate::config::CodecConfig;
use crate::error::CodecResult;

impl Poolable for BitBuffer {
    #[inline]
    fn reset(&mut self) {
        BitBuffer::reset(self);
    }
}

/// Pool of growable bit buffers.
pub type BufferPool = ObjectPool<BitBuffer>;

/// A pooled buffer checked out of a [`CodecContext`].
pub type PooledBuffer = Pooled<BitBuffer>;

/// Serialization context owning the configuration and the buffer pool.
///
/// One context is typically created per process or per connection and
/// shared by reference.
///
/// # Example
///
/// ```rust
/// use netbits_codec::{CharEncoding, CodecContext};
///
/// let context = CodecContext::default();
///
/// let mut buffer = context.acquire();
/// buffer.writer().write_string("hello", CharEncoding::Packed).unwrap();
/// let bytes = buffer.to_vec();
/// context.release(buffer).unwrap();
///
/// // The recycled buffer comes back empty
/// let buffer = context.acquire();
/// assert!(buffer.is_empty());
/// assert_eq!(bytes.len(), 6);
/// ```
#[derive(Debug)]
pub struct CodecContext {
    config: CodecConfig,
    buffers: BufferPool,
}

impl Default for CodecContext {
    fn default() -> Self {
        Self::build(CodecConfig::default())
    }
}

impl CodecContext {
    /// Creates a context from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodecError::InvalidConfig`] if `config` is invalid.
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Loads the configuration from a TOML file and creates a context.
    ///
    /// # Errors
    ///
    /// As [`CodecConfig::from_toml_file`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> CodecResult<Self> {
        CodecConfig::from_toml_file(path).map(Self::build)
    }

    fn build(config: CodecConfig) -> Self {
        let buffer_config = config.buffer.clone();
        let buffers = ObjectPool::new(config.pool.clone(), move || {
            BitBuffer::with_config(&buffer_config)
        });
        Self { config, buffers }
    }

    /// Checks out an empty buffer.
    #[must_use]
    pub fn acquire(&self) -> PooledBuffer {
        self.buffers.get()
    }

    /// Returns a buffer to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CodecError::Pool`] if the buffer is already in the
    /// pool or came from another context.
    pub fn release(&self, buffer: PooledBuffer) -> CodecResult<()> {
        self.buffers.put(buffer)?;
        Ok(())
    }

    /// The configuration this context was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// The underlying buffer pool.
    #[inline]
    #[must_use]
    pub const fn buffers(&self) -> &BufferPool {
        &self.buffers
    }
}
