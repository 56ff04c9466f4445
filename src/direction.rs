//! The two connection roles the relay pairs up.

use std::fmt;

/// Which side of a pair a connection plays.
///
/// `Unknown` only exists as the initial state while [`crate::header`] is
/// still parsing a connection's header line; it is never stored in the
/// registry and never reaches the pipe engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Originates from the host-side server process.
    Upstream,
    /// Originates from the agent runtime inside the container.
    Downstream,
    /// Header not yet parsed far enough to tell.
    Unknown,
}

impl Direction {
    /// The direction opposite `self`, used to find a waiting peer.
    ///
    /// Panics if called on [`Direction::Unknown`]: by the time a connection
    /// is looking for a peer its direction has already been resolved.
    pub fn opposite(self) -> Self {
        match self {
            Self::Upstream => Self::Downstream,
            Self::Downstream => Self::Upstream,
            Self::Unknown => unreachable!("opposite() called before direction was resolved"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
            Self::Unknown => "unknown",
        })
    }
}
