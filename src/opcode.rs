//! Lock request types.

/// Lock request types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Opcode {
    /// Requests shared read access.
    Read,
    /// Requests exclusive write access.
    Write,
}

impl Opcode {
    /// Returns `true` if requests of this type can be admitted together with other requests.
    #[inline]
    pub(crate) const fn is_shareable(self) -> bool {
        matches!(self, Opcode::Read)
    }
}
