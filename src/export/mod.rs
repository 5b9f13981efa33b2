//! Text export and import for the registry model.
//!
//! CSV and JSON producers are plain formatting utilities; JSON import goes
//! back through [`Group::add`](crate::models::Group::add) so capacity and
//! duplicate rules hold for imported data too.

mod csv;
mod json;

pub use csv::{employees_to_csv, group_statistics_to_csv, registry_to_csv};
pub use json::{import_registry_json, registry_to_json};
