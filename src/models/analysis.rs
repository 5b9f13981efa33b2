use serde::{Deserialize, Serialize};

use crate::models::employee::{Condition, Employee};

/// Min/max/average age and headcount over a group, relative to a caller-
/// supplied reference year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeStatistics {
    pub min_age: i32,
    pub max_age: i32,
    pub average_age: f64,
    pub count: usize,
}

/// Whether any employee in the list has the given condition.
pub fn has_condition(employees: &[Employee], condition: Condition) -> bool {
    employees.iter().any(|e| e.condition == condition)
}

/// Share of employees with the given condition, as a percentage of the
/// whole list. 0 for an empty list.
pub fn condition_percentage(employees: &[Employee], condition: Condition) -> f64 {
    if employees.is_empty() {
        return 0.0;
    }
    let count = employees.iter().filter(|e| e.condition == condition).count();
    count as f64 * 100.0 / employees.len() as f64
}
