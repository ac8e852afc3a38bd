//! Filesystem operations used by the allocator.
//!
//! - `relocate`: move one file into a bucket directory (rename, or copy across devices).
//! - `duplicate`: name resolution when a bucket already holds a file with the same name.
//! - `helpers`: io::Error enrichment with actionable hints.

mod duplicate;
mod helpers;
mod relocate;
mod util;

pub use duplicate::{OnDuplicate, resolve_destination};
pub use helpers::io_error_with_help;
pub use relocate::{FsRelocator, Relocator, move_file_into};
