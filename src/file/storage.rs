//! File storage under a single root directory.
//!
//! [`FileStorage`] is what the HTTP handlers talk to. Each operation takes
//! the path fragment from the request, resolves it under the root and runs
//! one filesystem call (or a tree build). All methods block; async callers
//! should run them on a blocking thread.
//!
//! ```text
//! {root}/
//! ├── docs/
//! │   └── report.pdf
//! └── photos/
//! ```

use std::path::{Path, PathBuf};

use super::fs::{self, CreateOutcome, EntryKind, FsError};
use super::path;
use super::tree::{build_tree, Entry, TreeOptions};

/// A downloaded file.
#[derive(Debug, Clone)]
pub struct Download {
    /// Final path segment, used for `Content-Disposition`.
    pub file_name: String,
    /// File content.
    pub content: Vec<u8>,
}

/// File storage service rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Root directory every fragment is resolved under.
    root: PathBuf,
    /// Options for folder listings.
    options: TreeOptions,
}

impl FileStorage {
    /// Create a new FileStorage rooted at `root`.
    ///
    /// The root directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            options: TreeOptions::default(),
        })
    }

    /// Replace the listing options.
    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the root directory of this storage.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a request fragment to a path under the root.
    pub fn resolve(&self, fragment: &str) -> Result<PathBuf, FsError> {
        path::bounded(&self.root, fragment)
    }

    /// `path` as seen from the root: `/`-separated with a leading `/`.
    ///
    /// Used for log output and error messages so the server's own layout
    /// never reaches clients.
    fn relative(&self, path: &Path) -> PathBuf {
        let inner = match path.strip_prefix(&self.root) {
            Ok(relative) => path::to_slash(relative),
            Err(_) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        PathBuf::from(format!("/{inner}"))
    }

    fn display(&self, path: &Path) -> String {
        self.relative(path).display().to_string()
    }

    /// Run `op`, rewriting paths in its error relative to the root.
    fn scoped<T>(&self, op: impl FnOnce() -> Result<T, FsError>) -> Result<T, FsError> {
        op().map_err(|e| e.map_path(|path| self.relative(path)))
    }

    /// Build the folder tree at `fragment`.
    pub fn list(&self, fragment: &str) -> Result<Entry, FsError> {
        self.scoped(|| {
            let target = self.resolve(fragment)?;
            build_tree(&target, &self.options)
        })
    }

    /// Read the regular file at `fragment`.
    pub fn download(&self, fragment: &str) -> Result<Download, FsError> {
        self.scoped(|| {
            let target = self.resolve(fragment)?;

            if !fs::is_regular_file(&target)? {
                return Err(FsError::NotAFile { path: target });
            }

            let content = fs::read_file(&target)?;
            let file_name = target
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            Ok(Download { file_name, content })
        })
    }

    /// Create the folder at `fragment` with all missing parents.
    pub fn create_folder(&self, fragment: &str) -> Result<CreateOutcome, FsError> {
        self.scoped(|| {
            let target = self.resolve(fragment)?;
            let outcome = fs::create_dir_all(&target)?;

            if outcome == CreateOutcome::Created {
                tracing::info!(folder = %self.display(&target), "Folder created");
            }
            Ok(outcome)
        })
    }

    /// Store `content` as `file_name` inside the folder at `fragment`.
    ///
    /// Missing folders are created and an existing file is replaced. The
    /// file name is applied without `%20` decoding and may not leave the
    /// target folder.
    pub fn upload(
        &self,
        fragment: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, FsError> {
        self.scoped(|| {
            let folder = self.resolve(fragment)?;
            let invalid = || FsError::InvalidName {
                name: file_name.to_string(),
            };

            let target = path::bound_within(&folder, file_name).ok_or_else(invalid)?;
            if target == folder {
                return Err(invalid());
            }

            fs::write_file(&target, content)?;

            tracing::info!(
                file = %self.display(&target),
                size = content.len(),
                "File uploaded"
            );
            Ok(target)
        })
    }

    /// Delete the file or folder at `fragment`.
    pub fn delete(&self, fragment: &str, force: bool) -> Result<EntryKind, FsError> {
        self.scoped(|| {
            let target = self.resolve(fragment)?;
            let kind = fs::remove(&target, force)?;

            tracing::info!(target = %self.display(&target), ?kind, force, "Deleted");
            Ok(kind)
        })
    }

    /// Move the object at `fragment` to `new_fragment`.
    pub fn rename(&self, fragment: &str, new_fragment: &str) -> Result<(), FsError> {
        self.scoped(|| {
            let from = self.resolve(fragment)?;
            let to = self.resolve(new_fragment)?;
            fs::rename(&from, &to)?;

            tracing::info!(
                from = %self.display(&from),
                to = %self.display(&to),
                "Renamed"
            );
            Ok(())
        })
    }
}
