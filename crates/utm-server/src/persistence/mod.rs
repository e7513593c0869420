//! Persistence layer for the UTM server.
//!
//! SQLite-backed zone storage. Zone bounding boxes live in an R*Tree so
//! point lookups touch only zones whose box covers the point.

pub mod db;
pub mod zones;

pub use db::{init_database, Database};
pub use zones::SqliteZoneStore;
