//! filekeep - folder and file storage over HTTP
//!
//! Serves one root directory: list it as a tree, upload, download, create
//! folders, rename and delete.

pub mod auth;
pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{CredentialCheck, StaticSecret};
pub use config::Config;
pub use error::{FilekeepError, Result};
pub use file::{build_tree, Entry, FileStorage, FsError, TreeOptions};
pub use web::{create_router, ApiError, WebServer};
