//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod data;
pub(crate) mod forecast;
pub(crate) mod qr;
