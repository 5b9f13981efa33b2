//! Staffbook: an employee and group management core.
//!
//! The domain model (employees, capacity-bounded groups, a group registry,
//! statistics, and a dynamic filter) lives in [`models`] and is pure
//! in-memory logic. [`db`] is the SQLite persistence boundary, [`dispatch`]
//! the asynchronous submission boundary over it, and [`export`] the CSV and
//! JSON text formats.

pub mod db;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod models;
