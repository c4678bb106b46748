//! Illegal lock state errors.

use std::fmt;

/// The calling thread tried to use the [`Lock`](crate::Lock) in a way its current ownership does
/// not allow.
///
/// A failed call leaves the lock untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The calling thread holds a read lock and requested a write lock.
    Upgrade,
    /// The calling thread does not hold the lock.
    NotHeld,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Upgrade => f.write_str("illegal lock state: cannot upgrade read to write"),
            Error::NotHeld => {
                f.write_str("illegal lock state: calling thread does not hold the lock")
            }
        }
    }
}

impl std::error::Error for Error {}
