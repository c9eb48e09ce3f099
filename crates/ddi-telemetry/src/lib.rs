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

//! Logging setup shared by the Demand Intelligence tools.
//!
//! Layout:
//! - `init.rs`: subscriber installation and logging configuration
//! - `context.rs`: per-command span helpers

pub mod context;
pub mod init;

pub use context::{command_span, in_command_span};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
