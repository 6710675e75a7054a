//! Middleware for the file API.

pub mod cors;

pub use cors::create_cors_layer;
