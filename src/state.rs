//! Ownership bookkeeping of a [`Lock`](crate::Lock).

use std::collections::HashMap;
#[cfg(not(feature = "loom"))]
use std::thread::ThreadId;

#[cfg(feature = "loom")]
use loom::thread::ThreadId;

use crate::Error;
use crate::opcode::Opcode;

/// Current owners of the lock.
///
/// A writer that acquires read locks is not added to the reader map: those acquisitions are
/// counted in `depth` of [`State::WriteHeld`].
#[derive(Debug, Default)]
pub(crate) enum State {
    /// Nobody holds the lock.
    #[default]
    Free,
    /// Reentrancy depth of each reader; never empty.
    ReadHeld(HashMap<ThreadId, usize>),
    /// Single writer and its reentrancy depth; `depth >= 1`.
    WriteHeld {
        /// The writer.
        owner: ThreadId,
        /// Number of unreleased acquisitions.
        depth: usize,
    },
}

impl State {
    /// Acquires one more level on behalf of a thread that already holds the lock.
    ///
    /// Returns `Ok(false)` if the thread does not hold the lock.
    pub(crate) fn reenter(&mut self, thread_id: ThreadId, opcode: Opcode) -> Result<bool, Error> {
        match self {
            State::WriteHeld { owner, depth } if *owner == thread_id => {
                *depth += 1;
                Ok(true)
            }
            State::ReadHeld(readers) => match readers.get_mut(&thread_id) {
                Some(depth) if opcode == Opcode::Read => {
                    *depth += 1;
                    Ok(true)
                }
                Some(_) => Err(Error::Upgrade),
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    /// Returns `true` if a fresh request of the given type is compatible with the current owners.
    pub(crate) const fn is_compatible(&self, opcode: Opcode) -> bool {
        match self {
            State::Free => true,
            State::ReadHeld(_) => opcode.is_shareable(),
            State::WriteHeld { .. } => false,
        }
    }

    /// Makes the thread a fresh owner with a depth of `1`.
    pub(crate) fn admit(&mut self, thread_id: ThreadId, opcode: Opcode) {
        debug_assert!(self.is_compatible(opcode));
        match opcode {
            Opcode::Read => {
                if let State::ReadHeld(readers) = self {
                    let prev = readers.insert(thread_id, 1);
                    debug_assert!(prev.is_none());
                } else {
                    *self = State::ReadHeld(HashMap::from([(thread_id, 1)]));
                }
            }
            Opcode::Write => {
                *self = State::WriteHeld {
                    owner: thread_id,
                    depth: 1,
                };
            }
        }
    }

    /// Releases one level held by the thread.
    ///
    /// Returns `Ok(true)` if the lock became free.
    pub(crate) fn release(&mut self, thread_id: ThreadId) -> Result<bool, Error> {
        match self {
            State::WriteHeld { owner, depth } if *owner == thread_id => {
                *depth -= 1;
                if *depth == 0 {
                    *self = State::Free;
                    return Ok(true);
                }
                Ok(false)
            }
            State::ReadHeld(readers) => {
                let Some(depth) = readers.get_mut(&thread_id) else {
                    return Err(Error::NotHeld);
                };
                *depth -= 1;
                if *depth == 0 {
                    readers.remove(&thread_id);
                    if readers.is_empty() {
                        *self = State::Free;
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(Error::NotHeld),
        }
    }

    /// Returns `true` if the thread holds the lock in any mode.
    pub(crate) fn is_held_by(&self, thread_id: ThreadId) -> bool {
        match self {
            State::Free => false,
            State::ReadHeld(readers) => readers.contains_key(&thread_id),
            State::WriteHeld { owner, .. } => *owner == thread_id,
        }
    }

    /// Returns the number of distinct readers.
    pub(crate) fn num_readers(&self) -> usize {
        match self {
            State::ReadHeld(readers) => readers.len(),
            _ => 0,
        }
    }

    /// Returns the reentrancy depth of the writer, or `0`.
    pub(crate) const fn writer_depth(&self) -> usize {
        match self {
            State::WriteHeld { depth, .. } => *depth,
            _ => 0,
        }
    }
}
