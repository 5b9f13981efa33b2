use serde::Deserialize;

use crate::error::Result;
use crate::models::{Employee, Group, GroupRegistry};

/// Renders the registry as a JSON document:
///
/// ```json
/// {"groups":[{"name":...,"maxCapacity":...,"employees":[
///   {"firstName":...,"lastName":...,"condition":...,"birthYear":...,"salary":...}]}]}
/// ```
///
/// Built by hand rather than through serde so the wire shape stays pinned
/// independently of the model structs. Conditions appear as their
/// `PRESENT`-style names; [`import_registry_json`] accepts the same shape.
pub fn registry_to_json(registry: &GroupRegistry) -> String {
    let mut out = String::from("{\"groups\":[");
    let mut first_group = true;
    for name in registry.list_group_names() {
        let Some(group) = registry.get(&name) else {
            continue;
        };
        if !first_group {
            out.push(',');
        }
        first_group = false;
        out.push_str("{\"name\":\"");
        out.push_str(&escape(group.name()));
        out.push_str("\",\"maxCapacity\":");
        out.push_str(&group.max_capacity().to_string());
        out.push_str(",\"employees\":[");
        let mut first_employee = true;
        for employee in group.employees() {
            if !first_employee {
                out.push(',');
            }
            first_employee = false;
            push_employee(&mut out, employee);
        }
        out.push_str("]}");
    }
    out.push_str("]}");
    out
}

/// Parses the [`registry_to_json`] shape back into a registry. Every
/// employee goes through the normal [`Group::add`] path, so capacity and
/// duplicate rules apply to imported data; an unknown condition name fails
/// the parse outright.
pub fn import_registry_json(input: &str) -> Result<GroupRegistry> {
    let file: ImportFile = serde_json::from_str(input)?;
    let mut registry = GroupRegistry::new();
    for imported in file.groups {
        let mut group = Group::new(imported.name, imported.max_capacity);
        for employee in imported.employees {
            group.add(employee)?;
        }
        registry.insert(group);
    }
    tracing::info!("Imported {} groups from JSON", registry.len());
    Ok(registry)
}

#[derive(Deserialize)]
struct ImportFile {
    groups: Vec<ImportGroup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportGroup {
    name: String,
    max_capacity: usize,
    #[serde(default)]
    employees: Vec<Employee>,
}

fn push_employee(out: &mut String, employee: &Employee) {
    out.push_str("{\"firstName\":\"");
    out.push_str(&escape(&employee.first_name));
    out.push_str("\",\"lastName\":\"");
    out.push_str(&escape(&employee.last_name));
    out.push_str("\",\"condition\":\"");
    out.push_str(employee.condition.as_str());
    out.push_str("\",\"birthYear\":");
    out.push_str(&employee.birth_year.to_string());
    out.push_str(",\"salary\":");
    out.push_str(&employee.salary.to_string());
    out.push('}');
}

/// Escapes backslash, double quote, newline, carriage return, and tab.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}
