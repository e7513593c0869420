//! UTM CLI - command line tools for the UTM airspace backend.
//!
//! Binaries:
//! - generate_token: mint a signed operator token
//! - check_point: ask the server whether a point is in restricted airspace

pub mod auth;
pub mod client;

pub use auth::{generate_operator_token, TokenConfig};
pub use client::ZoneClient;
