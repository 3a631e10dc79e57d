//! db-questionnaire - named, parameterized questions over a SQLite database.
//!
//! This library exposes the core modules used by the `questionnaire` binary
//! and the integration tests.

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod query;
pub mod question;
pub mod safety;
pub mod session;
