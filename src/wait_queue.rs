//! Wait queue implementation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::Ordering::{Acquire, Release};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::AtomicBool;
#[cfg(not(feature = "loom"))]
use std::thread::{Thread, ThreadId, current, park};

#[cfg(feature = "loom")]
use loom::sync::atomic::AtomicBool;
#[cfg(feature = "loom")]
use loom::thread::{Thread, ThreadId, current, park};

use crate::config::Config;
use crate::opcode::Opcode;

/// First-in first-out queue of lock requests that could not be admitted on arrival.
///
/// The queue is only accessed while the internal mutex of the lock is held; entries are shared
/// with the waiting thread so that it can be woken up after the mutex is released.
#[derive(Debug, Default)]
pub(crate) struct WaitQueue {
    /// Pending requests, oldest first.
    entries: VecDeque<Arc<Entry>>,
}

/// Wait queue entry.
#[derive(Debug)]
pub(crate) struct Entry {
    /// Operation type.
    opcode: Opcode,
    /// Handle of the waiting thread.
    thread: Thread,
    /// Set when the request has been admitted.
    granted: AtomicBool,
}

impl WaitQueue {
    /// Returns `true` if no requests are pending.
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of pending requests.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pushes a new entry for the current thread at the tail of the queue.
    pub(crate) fn push(&mut self, opcode: Opcode) -> Arc<Entry> {
        let entry = Arc::new(Entry {
            opcode,
            thread: current(),
            granted: AtomicBool::new(false),
        });
        self.entries.push_back(entry.clone());
        entry
    }

    /// Returns the oldest pending request.
    #[inline]
    pub(crate) fn head(&self) -> Option<&Entry> {
        self.entries.front().map(|entry| &**entry)
    }

    /// Removes the oldest pending request.
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<Arc<Entry>> {
        self.entries.pop_front()
    }
}

impl Entry {
    /// Returns the operation code.
    #[inline]
    pub(crate) const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Returns the identifier of the waiting thread.
    #[inline]
    pub(crate) fn thread_id(&self) -> ThreadId {
        self.thread.id()
    }

    /// Marks the request as admitted and wakes up the waiting thread.
    pub(crate) fn grant(&self) {
        debug_assert!(!self.granted.load(Acquire));
        self.granted.store(true, Release);
        self.thread.unpark();
    }

    /// Blocks the current thread until the request is admitted.
    pub(crate) fn wait<C: Config>(&self) {
        debug_assert_eq!(self.thread.id(), current().id());
        let mut spin_count = 0;
        while !self.granted.load(Acquire) {
            if spin_count < C::spin_count() {
                spin_count += 1;
                C::backoff(spin_count);
            } else {
                // `park` may return spuriously, and a stale token may be left by a previous
                // wake-up of this thread.
                park();
            }
        }
    }
}
