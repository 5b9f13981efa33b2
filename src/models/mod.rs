//! Domain models for staffbook.
//!
//! # Core Concepts
//!
//! - [`Employee`]: a single record whose identity is its (first, last) name
//!   pair; condition, birth year, and salary are payload, not identity.
//! - [`Group`]: a capacity-bounded, insertion-ordered collection of
//!   employees with membership rules and read-side query/statistics
//!   operations.
//! - [`GroupRegistry`]: a name-keyed collection of groups with a switchable
//!   iteration-order policy ([`StorageMode`]).
//! - [`EmployeeFilter`]: a composable criteria object that resolves into a
//!   sorted, paginated [`PagedResult`], either over in-memory rows or as a
//!   SQL query through the database.
//!
//! # Persistence-side entities
//!
//! - [`Rate`]: a 0–6 rating attached to a group.
//! - [`AuditEntry`]: the append-only change history; entities opt in via
//!   the [`Identified`] trait.

pub mod analysis;
mod audit;
mod employee;
mod filter;
mod group;
mod rate;
mod registry;

pub use audit::*;
pub use employee::*;
pub use filter::*;
pub use group::*;
pub use rate::*;
pub use registry::*;
