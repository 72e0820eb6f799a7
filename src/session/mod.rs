//! Session management and share attachment.

mod endpoint;
mod session;
mod share;
mod state;

pub use endpoint::{Credentials, DEFAULT_PORT, Endpoint};
pub(crate) use session::Connection;
pub use session::Session;
pub use share::ShareConnection;
pub use state::SessionState;
