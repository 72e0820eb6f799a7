//! Protocol vocabulary shared by the session layer and transports.

pub mod create;
pub mod flags;
pub mod status;

pub use create::{CreateDisposition, CreateOptions, CreateRequest, ObjectKind};
pub use flags::{AccessMask, FileAttributes, ShareAccess};
pub use status::NtStatus;
