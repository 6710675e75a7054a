//! Filesystem adapter.
//!
//! Thin wrappers around the `std::fs` primitives the file manager needs.
//! Every failure is classified into an [`FsError`] that keeps the offending
//! path and the OS error text, so callers can map it to a response without
//! inspecting `io::ErrorKind` themselves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by filesystem operations under the storage root.
#[derive(Error, Debug)]
pub enum FsError {
    /// The target does not exist.
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    /// The target exists but is not a regular file.
    #[error("{} is not a regular file", path.display())]
    NotAFile { path: PathBuf },

    /// Non-forced removal of a populated directory.
    #[error("{} is not empty", path.display())]
    NotEmpty { path: PathBuf },

    /// The OS refused access.
    #[error("permission denied for {}: {source}", path.display())]
    PermissionDenied { path: PathBuf, source: io::Error },

    /// The requested path climbs above the storage root.
    #[error("{fragment:?} points outside the storage root")]
    OutsideRoot { fragment: String },

    /// An uploaded file name that does not name a file.
    #[error("invalid file name {name:?}")]
    InvalidName { name: String },

    /// Any other I/O failure.
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl FsError {
    /// Classify an `io::Error` raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path, source: err },
            io::ErrorKind::DirectoryNotEmpty => FsError::NotEmpty { path },
            _ => FsError::Io { path, source: err },
        }
    }

    /// Rewrite the carried path, e.g. to hide the storage root from clients.
    pub fn map_path(self, f: impl FnOnce(&Path) -> PathBuf) -> Self {
        match self {
            FsError::NotFound { path } => FsError::NotFound { path: f(&path) },
            FsError::NotAFile { path } => FsError::NotAFile { path: f(&path) },
            FsError::NotEmpty { path } => FsError::NotEmpty { path: f(&path) },
            FsError::PermissionDenied { path, source } => FsError::PermissionDenied {
                path: f(&path),
                source,
            },
            FsError::Io { path, source } => FsError::Io {
                path: f(&path),
                source,
            },
            other @ (FsError::OutsideRoot { .. } | FsError::InvalidName { .. }) => other,
        }
    }
}

/// Kind of filesystem object found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Anything that is not a directory (regular files, symlinks, devices).
    File,
    /// A directory.
    Directory,
}

impl EntryKind {
    fn from_metadata(metadata: &fs::Metadata) -> Self {
        if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Whether this is a directory.
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

/// Result of [`create_dir_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// At least one path segment was created.
    Created,
    /// The full path was already a directory.
    AlreadyExisted,
}

/// Stat `path`, following symlinks.
pub fn stat(path: &Path) -> Result<EntryKind, FsError> {
    fs::metadata(path)
        .map(|metadata| EntryKind::from_metadata(&metadata))
        .map_err(|e| FsError::from_io(path, e))
}

/// Whether `path` is a non-directory. Fails with `NotFound` when absent.
pub fn is_regular_file(path: &Path) -> Result<bool, FsError> {
    Ok(stat(path)? == EntryKind::File)
}

/// Whether `path` is a directory. Fails with `NotFound` when absent.
pub fn is_directory(path: &Path) -> Result<bool, FsError> {
    Ok(stat(path)?.is_dir())
}

/// Create `path` and every missing parent (`mkdir -p`).
pub fn create_dir_all(path: &Path) -> Result<CreateOutcome, FsError> {
    if matches!(fs::metadata(path), Ok(metadata) if metadata.is_dir()) {
        return Ok(CreateOutcome::AlreadyExisted);
    }

    fs::create_dir_all(path).map_err(|e| FsError::from_io(path, e))?;
    Ok(CreateOutcome::Created)
}

/// Remove the object at `path`.
///
/// Without `force` a populated directory fails with `NotEmpty`; with `force`
/// its contents are removed first. Symlinks are removed, never followed.
pub fn remove(path: &Path, force: bool) -> Result<EntryKind, FsError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::from_io(path, e))?;

    if !metadata.is_dir() {
        fs::remove_file(path).map_err(|e| FsError::from_io(path, e))?;
        return Ok(EntryKind::File);
    }

    if force {
        fs::remove_dir_all(path).map_err(|e| FsError::from_io(path, e))?;
    } else {
        let populated = fs::read_dir(path)
            .map_err(|e| FsError::from_io(path, e))?
            .next()
            .is_some();
        if populated {
            return Err(FsError::NotEmpty {
                path: path.to_path_buf(),
            });
        }
        fs::remove_dir(path).map_err(|e| FsError::from_io(path, e))?;
    }

    Ok(EntryKind::Directory)
}

/// Move `old` to `new` on the same filesystem.
///
/// A missing source is `NotFound`. A missing destination parent, a
/// cross-device move or a collision the host refuses is an `Io` error on
/// `new`. Whether an existing destination is replaced is up to the host.
pub fn rename(old: &Path, new: &Path) -> Result<(), FsError> {
    fs::symlink_metadata(old).map_err(|e| FsError::from_io(old, e))?;

    fs::rename(old, new).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
            path: new.to_path_buf(),
            source: e,
        },
        _ => FsError::Io {
            path: new.to_path_buf(),
            source: e,
        },
    })
}

/// Read the whole file at `path`.
pub fn read_file(path: &Path) -> Result<Vec<u8>, FsError> {
    fs::read(path).map_err(|e| FsError::from_io(path, e))
}

/// Write `content` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_file(path: &Path, content: &[u8]) -> Result<(), FsError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    fs::write(path, content).map_err(|e| FsError::from_io(path, e))
}
