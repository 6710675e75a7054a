//! Data Transfer Objects for the file API.
//!
//! Listings serialize [`crate::file::Entry`] directly; every other response
//! is plain text.

pub mod request;

pub use request::*;
