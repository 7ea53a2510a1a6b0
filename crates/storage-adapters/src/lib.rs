//! # storage-adapters
//!
//! Driven-side implementations of the `domains` ports: an in-memory
//! store (always available, used by tests and small deployments), a
//! SQLite store behind the `db-sqlite` feature, and the log-backed
//! notifier that stands in for a real mail transport.

pub mod memory;
pub mod notify;

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use memory::MemoryStore;
pub use notify::LogNotifier;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
