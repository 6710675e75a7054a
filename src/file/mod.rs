//! File management module for filekeep.
//!
//! This module provides the storage side of the file manager:
//! - Mapping of request path fragments under the storage root
//! - Typed wrappers around filesystem primitives
//! - Folder tree materialization for listings
//! - A [`FileStorage`] service composing the above per operation

pub mod fs;
pub mod path;
mod storage;
pub mod tree;

pub use fs::{CreateOutcome, EntryKind, FsError};
pub use storage::{Download, FileStorage};
pub use tree::{build_tree, Entry, TreeOptions};

/// Default maximum upload size (1 GiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1024 * 1024 * 1024;
