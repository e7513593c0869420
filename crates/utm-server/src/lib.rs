//! Shared library surface for the UTM server binary and its tests.

pub mod api;
pub mod config;
pub mod persistence;
pub mod state;
