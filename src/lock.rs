//! [`Lock`] is a reentrant read/write lock that admits threads in arrival order.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError};
#[cfg(not(feature = "loom"))]
use std::sync::{Mutex, MutexGuard};
#[cfg(not(feature = "loom"))]
use std::thread::current;

#[cfg(feature = "loom")]
use loom::sync::{Mutex, MutexGuard};
#[cfg(feature = "loom")]
use loom::thread::current;

use log::{debug, trace};

use crate::Error;
use crate::config::{Config, DefaultConfig};
use crate::guard::{ReadGuard, WriteGuard};
use crate::opcode::Opcode;
use crate::state::State;
use crate::wait_queue::{Entry, WaitQueue};

/// [`Lock`] is a reentrant read/write lock that admits threads in arrival order.
///
/// Ownership is tracked per thread: any number of threads can hold the lock in read mode, or a
/// single thread can hold it in write mode, and each thread can acquire the lock again while it
/// holds it. Every acquisition must be matched by a call to [`unlock`](Self::unlock).
///
/// Requests that cannot be admitted right away are queued and admitted strictly in order: a write
/// request waits for every earlier request, and once a write request is queued, no reader that
/// arrives later is admitted before it, even if the lock is currently held by readers. When the
/// lock becomes free, all the read requests at the head of the queue are admitted together.
///
/// A thread holding a write lock may acquire read locks without losing exclusive access, whereas a
/// thread holding only a read lock cannot upgrade it to a write lock.
pub struct Lock<C: Config = DefaultConfig> {
    /// Ownership state and pending requests.
    inner: Mutex<Inner>,
    /// Waiting strategy.
    _config: PhantomData<fn() -> C>,
}

/// Data protected by the internal mutex of a [`Lock`].
#[derive(Debug, Default)]
struct Inner {
    /// Current owners.
    state: State,
    /// Requests that are waiting for admission.
    wait_queue: WaitQueue,
}

impl Lock {
    /// Creates a new free [`Lock`] with the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(lock.is_free());
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config()
    }
}

impl<C: Config> Lock<C> {
    /// Creates a new free [`Lock`] that waits according to `C`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::{Lock, ParkImmediately};
    ///
    /// let lock: Lock<ParkImmediately> = Lock::with_config();
    /// assert!(lock.is_free());
    /// ```
    #[inline]
    #[must_use]
    pub fn with_config() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            _config: PhantomData,
        }
    }

    /// Returns `true` if nobody holds the lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(lock.is_free());
    ///
    /// lock.lock_read();
    /// assert!(!lock.is_free());
    /// ```
    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self.inner().state, State::Free)
    }

    /// Returns `true` if a write lock is currently held.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(!lock.is_locked());
    ///
    /// lock.lock_write().unwrap();
    /// assert!(lock.is_locked());
    /// assert!(!lock.is_shared());
    /// ```
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner().state.writer_depth() != 0
    }

    /// Returns `true` if read locks are currently held.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(!lock.is_shared());
    ///
    /// lock.lock_read();
    /// assert!(lock.is_shared());
    /// assert!(!lock.is_locked());
    /// ```
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.inner().state.num_readers() != 0
    }

    /// Returns the number of requests waiting for admission.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// lock.lock_write().unwrap();
    /// assert_eq!(lock.num_waiting(), 0);
    /// ```
    #[inline]
    pub fn num_waiting(&self) -> usize {
        self.inner().wait_queue.len()
    }

    /// Returns `true` if the current thread holds the lock in either mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// assert!(!lock.is_held_by_current_thread());
    ///
    /// lock.lock_read();
    /// assert!(lock.is_held_by_current_thread());
    /// ```
    #[inline]
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner().state.is_held_by(current().id())
    }

    /// Acquires a read lock, blocking the current thread until it is admitted.
    ///
    /// The call returns immediately if the current thread already holds the lock in either mode,
    /// or if no write lock is held and no request is waiting. Otherwise the request is queued
    /// behind every pending request.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    ///
    /// lock.lock_read();
    /// lock.lock_read();
    ///
    /// assert!(lock.unlock().is_ok());
    /// assert!(lock.is_shared());
    /// assert!(lock.unlock().is_ok());
    /// assert!(lock.is_free());
    /// ```
    #[inline]
    pub fn lock_read(&self) {
        let result = self.acquire(Opcode::Read);
        debug_assert!(result.is_ok());
    }

    /// Acquires a write lock, blocking the current thread until it is admitted.
    ///
    /// The call returns immediately if the current thread already holds the write lock, or if the
    /// lock is free and no request is waiting. Otherwise the request is queued behind every
    /// pending request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upgrade`] without blocking if the current thread holds a read lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::{Error, Lock};
    ///
    /// let lock = Lock::new();
    ///
    /// assert!(lock.lock_write().is_ok());
    /// lock.lock_read();
    /// assert!(lock.lock_write().is_ok());
    ///
    /// for _ in 0..3 {
    ///     assert!(lock.is_locked());
    ///     assert!(lock.unlock().is_ok());
    /// }
    /// assert!(lock.is_free());
    ///
    /// lock.lock_read();
    /// assert_eq!(lock.lock_write(), Err(Error::Upgrade));
    /// assert!(lock.is_shared());
    /// ```
    #[inline]
    pub fn lock_write(&self) -> Result<(), Error> {
        self.acquire(Opcode::Write)
    }

    /// Releases one level of the lock held by the current thread.
    ///
    /// Once the lock becomes free, the longest run of read requests at the head of the queue, or
    /// else the single write request at the head of the queue, is admitted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotHeld`] if the current thread does not hold the lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::{Error, Lock};
    ///
    /// let lock = Lock::new();
    /// assert_eq!(lock.unlock(), Err(Error::NotHeld));
    ///
    /// lock.lock_read();
    /// assert!(lock.unlock().is_ok());
    /// assert_eq!(lock.unlock(), Err(Error::NotHeld));
    /// ```
    pub fn unlock(&self) -> Result<(), Error> {
        let thread_id = current().id();
        let mut inner = self.inner();
        let freed = match inner.state.release(thread_id) {
            Ok(freed) => freed,
            Err(error) => {
                drop(inner);
                debug!("{thread_id:?}: {error}");
                return Err(error);
            }
        };
        if !freed {
            drop(inner);
            trace!("{thread_id:?} released one level");
            return Ok(());
        }
        let granted = inner.drain();
        let num_waiting = inner.wait_queue.len();
        drop(inner);

        // Admitted threads are woken up outside the critical section.
        for entry in &granted {
            entry.grant();
        }
        trace!(
            "{thread_id:?} freed the lock: admitted {} queued request(s), {num_waiting} still waiting",
            granted.len()
        );
        Ok(())
    }

    /// Acquires a read lock and returns a guard that releases it when dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// {
    ///     let _guard = lock.read();
    ///     assert!(lock.is_shared());
    /// }
    /// assert!(lock.is_free());
    /// ```
    #[inline]
    pub fn read(&self) -> ReadGuard<'_, C> {
        self.lock_read();
        ReadGuard::new(self)
    }

    /// Acquires a write lock and returns a guard that releases it when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upgrade`] without blocking if the current thread holds a read lock.
    ///
    /// # Examples
    ///
    /// ```
    /// use fifo_rwlock::Lock;
    ///
    /// let lock = Lock::new();
    /// {
    ///     let _outer = lock.write().unwrap();
    ///     let _inner = lock.write().unwrap();
    ///     assert!(lock.is_locked());
    /// }
    /// assert!(lock.is_free());
    /// ```
    #[inline]
    pub fn write(&self) -> Result<WriteGuard<'_, C>, Error> {
        self.lock_write()?;
        Ok(WriteGuard::new(self))
    }

    /// Acquires the lock in the mode specified by `opcode` for the current thread.
    fn acquire(&self, opcode: Opcode) -> Result<(), Error> {
        let thread_id = current().id();
        let mut inner = self.inner();
        match inner.state.reenter(thread_id, opcode) {
            Ok(false) => (),
            Ok(true) => {
                drop(inner);
                trace!("{thread_id:?} reentered for {opcode:?}");
                return Ok(());
            }
            Err(error) => {
                drop(inner);
                debug!("{thread_id:?}: {error}");
                return Err(error);
            }
        }

        // An empty queue check keeps new readers behind a pending writer.
        if inner.wait_queue.is_empty() && inner.state.is_compatible(opcode) {
            inner.state.admit(thread_id, opcode);
            drop(inner);
            trace!("{thread_id:?} admitted for {opcode:?}");
            return Ok(());
        }

        let entry = inner.wait_queue.push(opcode);
        let position = inner.wait_queue.len();
        drop(inner);
        trace!("{thread_id:?} queued for {opcode:?} at position {position}");

        entry.wait::<C>();
        trace!("{thread_id:?} resumed for {opcode:?}");
        Ok(())
    }

    /// Locks the internal mutex.
    #[inline]
    fn inner(&self) -> MutexGuard<'_, Inner> {
        // The state is consistent whenever the mutex is released.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    /// Admits the maximal admissible prefix of the wait queue into a free lock.
    ///
    /// Returns the admitted entries which need to be woken up.
    fn drain(&mut self) -> Vec<Arc<Entry>> {
        debug_assert!(matches!(self.state, State::Free));

        let mut granted = Vec::new();
        while self
            .wait_queue
            .head()
            .is_some_and(|entry| self.state.is_compatible(entry.opcode()))
        {
            let Some(entry) = self.wait_queue.pop() else {
                break;
            };
            self.state.admit(entry.thread_id(), entry.opcode());
            granted.push(entry);
        }
        granted
    }
}

impl<C: Config> Default for Lock<C> {
    #[inline]
    fn default() -> Self {
        Self::with_config()
    }
}

impl<C: Config> fmt::Debug for Lock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner();
        f.debug_struct("Lock")
            .field("free", &matches!(inner.state, State::Free))
            .field("num_readers", &inner.state.num_readers())
            .field("writer_depth", &inner.state.writer_depth())
            .field("num_waiting", &inner.wait_queue.len())
            .finish()
    }
}
