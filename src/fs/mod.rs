//! Remote filesystem operations.

pub mod entry;
pub mod handle;
mod operations;
pub mod path;

pub use entry::{DirectoryEntry, EntriesExt, EntryKind};
pub use handle::{HandleState, ObjectHandle, OpenOptions};
pub use operations::{DeletionReport, EntryDeletion, MATCH_ALL, ReadAccumulator};
