#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_imports,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Session-aware HTTP client for the Demand Intelligence backend.
//!
//! Layout:
//! - `client.rs`: request pipeline, error normalization, and session state
//! - `auth.rs`: login, signup, logout, and password recovery
//! - `resources.rs`: catalog, forecast, inventory, data entry, and QR operations
//! - `session.rs`: persistence backends for the session slot
//! - `config.rs`: base URL, timeout, and session mode resolution
//! - `error.rs`: error taxonomy shared by the above

mod auth;
mod client;
pub mod config;
mod cookies;
pub mod error;
mod resources;
pub mod session;

pub use auth::{MIN_PASSWORD_LEN, validate_new_password};
pub use client::{ApiClient, Payload};
pub use config::{ClientConfig, DEFAULT_API_URL, SessionMode};
pub use error::{
    ApiError, ConfigError, DECODE_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE, SessionStoreError,
    UNAUTHORIZED_MESSAGE,
};
pub use session::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};
