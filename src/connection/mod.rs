//! Connection management.
//!
//! Centralizes the database load/unload lifecycle.

pub mod manager;

pub use manager::{ActiveConnection, ConnectionManager, ConnectionState};
