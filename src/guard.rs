//! Scoped ownership of a [`Lock`].

use std::fmt;
use std::marker::PhantomData;
#[cfg(not(feature = "loom"))]
use std::thread::current;

#[cfg(feature = "loom")]
use loom::thread::current;

use log::debug;

use crate::Lock;
use crate::config::{Config, DefaultConfig};

/// An RAII implementation of a scoped read lock.
///
/// The guard releases one level of the lock when dropped. Ownership is tracked per thread,
/// therefore the guard cannot be sent to another thread.
///
/// Calling [`Lock::unlock`] for a level a guard owns makes the guard release one more level of the
/// current thread, if any, when dropped.
///
/// # Examples
///
/// ```
/// use fifo_rwlock::{Lock, ReadGuard};
///
/// let lock = Lock::new();
/// let first: ReadGuard = lock.read();
/// let second: ReadGuard = lock.read();
/// drop(first);
/// assert!(lock.is_shared());
/// drop(second);
/// assert!(lock.is_free());
/// ```
#[must_use = "if unused the lock will immediately be released"]
pub struct ReadGuard<'l, C: Config = DefaultConfig> {
    /// The lock to release.
    lock: &'l Lock<C>,
    /// The guard must be dropped by the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

/// An RAII implementation of a scoped write lock.
///
/// The guard releases one level of the lock when dropped. Ownership is tracked per thread,
/// therefore the guard cannot be sent to another thread.
///
/// Calling [`Lock::unlock`] for a level a guard owns makes the guard release one more level of the
/// current thread, if any, when dropped.
///
/// # Examples
///
/// ```
/// use fifo_rwlock::{Lock, WriteGuard};
///
/// let lock = Lock::new();
/// let guard: WriteGuard = lock.write().unwrap();
/// assert!(lock.is_locked());
/// drop(guard);
/// assert!(lock.is_free());
/// ```
#[must_use = "if unused the lock will immediately be released"]
pub struct WriteGuard<'l, C: Config = DefaultConfig> {
    /// The lock to release.
    lock: &'l Lock<C>,
    /// The guard must be dropped by the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

impl<'l, C: Config> ReadGuard<'l, C> {
    /// Wraps a read lock acquired by the current thread.
    pub(crate) fn new(lock: &'l Lock<C>) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl<'l, C: Config> WriteGuard<'l, C> {
    /// Wraps a write lock acquired by the current thread.
    pub(crate) fn new(lock: &'l Lock<C>) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl<C: Config> Drop for ReadGuard<'_, C> {
    #[inline]
    fn drop(&mut self) {
        // The level may already have been released through `Lock::unlock`.
        if let Err(error) = self.lock.unlock() {
            debug!("{:?}: guard dropped without a held level: {error}", current().id());
        }
    }
}

impl<C: Config> Drop for WriteGuard<'_, C> {
    #[inline]
    fn drop(&mut self) {
        // The level may already have been released through `Lock::unlock`.
        if let Err(error) = self.lock.unlock() {
            debug!("{:?}: guard dropped without a held level: {error}", current().id());
        }
    }
}

impl<C: Config> fmt::Debug for ReadGuard<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGuard").field("lock", self.lock).finish()
    }
}

impl<C: Config> fmt::Debug for WriteGuard<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteGuard").field("lock", self.lock).finish()
    }
}
