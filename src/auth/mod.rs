//! Authorization for filekeep.
//!
//! The only guarded operation is delete, which requires a shared secret.

pub mod credential;

pub use credential::{
    from_config, hash_secret, CredentialCheck, CredentialError, DenyAll, HashedSecret,
    StaticSecret,
};
