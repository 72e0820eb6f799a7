//! Share operations split into focused modules.

mod browse;
mod create;
mod delete;
mod read;

pub use browse::MATCH_ALL;
pub use delete::{DeletionReport, EntryDeletion};
pub use read::ReadAccumulator;
