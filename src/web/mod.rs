//! Web API module for filekeep.
//!
//! Exposes the storage root over HTTP: GET lists or downloads, PUT creates
//! folders, POST uploads, PATCH renames and DELETE removes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
