//! # Object Pool
//!
//! Bounded free list of reusable instances, keyed only by instance type.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of idle instances a pool keeps.
pub const DEFAULT_MAX_RETAINED: usize = 64;

/// Default number of creations after which the pool logs a warning.
pub const DEFAULT_CREATION_WARNING_THRESHOLD: u64 = 1024;

static NEXT_POOL_TAG: AtomicU32 = AtomicU32::new(0);

/// An instance that can be recycled by an [`ObjectPool`].
pub trait Poolable {
    /// Returns the instance to its empty state. Backing storage may be kept.
    fn reset(&mut self);
}

/// Identity of an instance handed out by a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId {
    pool: u32,
    serial: u64,
}

impl PoolId {
    /// Serial number of the instance within its pool.
    #[inline]
    #[must_use]
    pub const fn serial(self) -> u64 {
        self.serial
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.pool, self.serial)
    }
}

/// A pooled instance together with its identity.
///
/// Dereferences to the wrapped value. Cloning keeps the identity, which is
/// what lets the pool catch a second return of the same instance.
#[derive(Clone, Debug)]
pub struct Pooled<T> {
    id: PoolId,
    value: T,
}

impl<T> Pooled<T> {
    /// Identity assigned when the pool created this instance.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Detaches the value from the pool for good.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Pool sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of idle instances kept on the free list.
    pub max_retained: usize,
    /// Creation count above which the pool emits a single warning.
    pub creation_warning_threshold: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_retained: DEFAULT_MAX_RETAINED,
            creation_warning_threshold: DEFAULT_CREATION_WARNING_THRESHOLD,
        }
    }
}

/// Counters describing pool traffic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built by the factory.
    pub created: u64,
    /// `get` calls served from the free list.
    pub reused: u64,
    /// Instances accepted back onto the free list.
    pub returned: u64,
    /// Instances released because the free list was full.
    pub discarded: u64,
    /// Returns refused as misuse.
    pub rejected: u64,
}

/// Pool misuse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The instance is already sitting on the free list.
    #[error("instance {0} is already in the pool")]
    AlreadyPooled(PoolId),

    /// The instance was created by a different pool.
    #[error("instance {0} does not belong to this pool")]
    ForeignInstance(PoolId),
}

struct FreeList<T> {
    slots: Vec<Pooled<T>>,
    pooled: HashSet<PoolId>,
    next_serial: u64,
    stats: PoolStats,
    warned: bool,
}

/// A bounded, thread-safe pool of reusable instances.
///
/// The free list sits behind a single lock, so `get` and `put` may be called
/// from any thread. The instances themselves are not shared: whoever holds a
/// [`Pooled`] owns it exclusively until it is handed back.
///
/// # Example
///
/// ```rust
/// use netbits_core::{ObjectPool, PoolConfig, Poolable};
///
/// struct Scratch(Vec<u8>);
///
/// impl Poolable for Scratch {
///     fn reset(&mut self) {
///         self.0.clear();
///     }
/// }
///
/// let pool = ObjectPool::new(PoolConfig::default(), || Scratch(Vec::with_capacity(256)));
///
/// let mut scratch = pool.get();
/// scratch.0.extend_from_slice(b"payload");
/// pool.put(scratch).unwrap();
///
/// // Comes back empty
/// assert!(pool.get().0.is_empty());
/// ```
pub struct ObjectPool<T> {
    tag: u32,
    config: PoolConfig,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    free: Mutex<FreeList<T>>,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool that builds new instances with `factory`.
    pub fn new<F>(config: PoolConfig, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            tag: NEXT_POOL_TAG.fetch_add(1, Ordering::Relaxed),
            config,
            factory: Box::new(factory),
            free: Mutex::new(FreeList {
                slots: Vec::new(),
                pooled: HashSet::new(),
                next_serial: 0,
                stats: PoolStats::default(),
                warned: false,
            }),
        }
    }

    /// Takes an instance from the free list, or builds a new one.
    ///
    /// The instance is always in its reset state.
    pub fn get(&self) -> Pooled<T> {
        let id = {
            let mut free = self.free.lock();
            if let Some(item) = free.slots.pop() {
                free.pooled.remove(&item.id);
                free.stats.reused += 1;
                return item;
            }

            let id = PoolId {
                pool: self.tag,
                serial: free.next_serial,
            };
            free.next_serial += 1;
            free.stats.created += 1;

            if free.stats.created > self.config.creation_warning_threshold && !free.warned {
                free.warned = true;
                tracing::warn!(
                    created = free.stats.created,
                    threshold = self.config.creation_warning_threshold,
                    "object pool keeps allocating, instances are probably not being returned"
                );
            }
            id
        };

        tracing::debug!(%id, "object pool created a new instance");
        Pooled {
            id,
            value: (self.factory)(),
        }
    }

    /// Hands an instance back to the pool.
    ///
    /// The instance is reset first. When the free list is already at
    /// `max_retained` the instance is simply dropped.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyPooled`] if the same instance is already on the free list
    /// - [`PoolError::ForeignInstance`] if another pool created it
    ///
    /// The free list is left untouched in both cases.
    pub fn put(&self, mut item: Pooled<T>) -> Result<(), PoolError> {
        if item.id.pool != self.tag {
            self.free.lock().stats.rejected += 1;
            tracing::error!(id = %item.id, "instance returned to a pool that did not create it");
            return Err(PoolError::ForeignInstance(item.id));
        }

        item.value.reset();

        let mut free = self.free.lock();
        if free.pooled.contains(&item.id) {
            free.stats.rejected += 1;
            tracing::error!(id = %item.id, "instance returned to the pool twice");
            return Err(PoolError::AlreadyPooled(item.id));
        }

        if free.slots.len() >= self.config.max_retained {
            free.stats.discarded += 1;
            tracing::trace!(id = %item.id, retained = free.slots.len(), "free list full, releasing instance");
            return Ok(());
        }

        free.pooled.insert(item.id);
        free.slots.push(item);
        free.stats.returned += 1;
        Ok(())
    }
}

impl<T> ObjectPool<T> {
    /// Number of idle instances on the free list.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.lock().slots.len()
    }

    /// Snapshot of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.free.lock().stats
    }

    /// The sizing this pool was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drops every idle instance.
    pub fn clear(&self) {
        let mut free = self.free.lock();
        free.slots.clear();
        free.pooled.clear();
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("tag", &self.tag)
            .field("config", &self.config)
            .field("available", &self.available())
            .finish_non_exhaustive()
    }
}
