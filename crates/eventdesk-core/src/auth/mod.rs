//! Authentication module for managing the admin session.
//!
//! This module provides:
//! - `SessionStore`: the single source of truth for "is the user signed in"
//! - `TokenStorage`: the persistent slot the token is mirrored to
//! - `FileStorage`, `KeyringStorage`, `MemoryStorage`: slot backends
//!
//! The token never expires on its own; it lives until `logout`.

pub mod credentials;
pub mod error;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use error::{SessionError, StorageError};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, SlotRecord, TokenStorage, TOKEN_KEY};
