//! Session lifecycle states.

use std::fmt;

/// Where a [`crate::Session`] is in its lifecycle.
///
/// `Disconnected → Connected → Authenticated → Disconnected`. A failed
/// authentication leaves the session `Connected`; a transport failure or
/// `close()` always lands in `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}
