use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::employee::{Condition, Employee};
use crate::models::registry::GroupRegistry;

/// Field an employee listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    LastName,
    FirstName,
    Salary,
    BirthYear,
    Condition,
    GroupName,
}

impl SortField {
    /// Resolves a sort key by name. Unrecognized keys fall back to the
    /// last-name default rather than erroring.
    pub fn from_key(key: &str) -> Self {
        match key.to_lowercase().as_str() {
            "lastname" | "last_name" => Self::LastName,
            "firstname" | "first_name" => Self::FirstName,
            "salary" => Self::Salary,
            "birthyear" | "birth_year" => Self::BirthYear,
            "condition" => Self::Condition,
            "groupname" | "group_name" => Self::GroupName,
            _ => Self::LastName,
        }
    }

    /// The column this field maps to in the persisted query.
    pub fn column(&self) -> &'static str {
        match self {
            Self::LastName => "e.last_name",
            Self::FirstName => "e.first_name",
            Self::Salary => "e.salary",
            Self::BirthYear => "e.birth_year",
            Self::Condition => "e.condition",
            Self::GroupName => "g.name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// An employee joined with the name of the group it belongs to, as produced
/// by filtered queries and consumed by the CSV exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    /// Persistence id; `None` for rows that only ever lived in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub group_name: String,
    #[serde(flatten)]
    pub employee: Employee,
}

/// A composable filter over employees: every criterion is optional, and the
/// ones that are set are ANDed together. Also carries the sort selection and
/// the pagination window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeFilter {
    /// Case-insensitive "contains" over the last name.
    pub last_name: Option<String>,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    pub condition: Option<Condition>,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    /// Exact group name match.
    pub group_name: Option<String>,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
    /// 1-indexed page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for EmployeeFilter {
    fn default() -> Self {
        Self {
            last_name: None,
            min_salary: None,
            max_salary: None,
            condition: None,
            birth_year_from: None,
            birth_year_to: None,
            group_name: None,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
            page: 1,
            page_size: 20,
        }
    }
}

impl EmployeeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_name(mut self, fragment: impl Into<String>) -> Self {
        self.last_name = Some(fragment.into());
        self
    }

    pub fn min_salary(mut self, min: f64) -> Self {
        self.min_salary = Some(min);
        self
    }

    pub fn max_salary(mut self, max: f64) -> Self {
        self.max_salary = Some(max);
        self
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn birth_year_from(mut self, year: i32) -> Self {
        self.birth_year_from = Some(year);
        self
    }

    pub fn birth_year_to(mut self, year: i32) -> Self {
        self.birth_year_to = Some(year);
        self
    }

    pub fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort_by = field;
        self
    }

    pub fn sort_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = direction;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Whether a row passes every criterion that is set.
    pub fn matches(&self, row: &EmployeeRow) -> bool {
        let e = &row.employee;
        if let Some(fragment) = &self.last_name {
            if !e.last_name.to_lowercase().contains(&fragment.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_salary {
            if e.salary < min {
                return false;
            }
        }
        if let Some(max) = self.max_salary {
            if e.salary > max {
                return false;
            }
        }
        if let Some(condition) = self.condition {
            if e.condition != condition {
                return false;
            }
        }
        if let Some(from) = self.birth_year_from {
            if e.birth_year < from {
                return false;
            }
        }
        if let Some(to) = self.birth_year_to {
            if e.birth_year > to {
                return false;
            }
        }
        if let Some(group) = &self.group_name {
            if &row.group_name != group {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &EmployeeRow, b: &EmployeeRow) -> Ordering {
        let ordering = match self.sort_by {
            SortField::LastName => a.employee.last_name.cmp(&b.employee.last_name),
            SortField::FirstName => a.employee.first_name.cmp(&b.employee.first_name),
            SortField::Salary => a.employee.salary.total_cmp(&b.employee.salary),
            SortField::BirthYear => a.employee.birth_year.cmp(&b.employee.birth_year),
            SortField::Condition => a.employee.condition.cmp(&b.employee.condition),
            SortField::GroupName => a.group_name.cmp(&b.group_name),
        };
        match self.sort_direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Runs the filter over in-memory rows: linear scan, comparator sort,
    /// then the pagination window. This is the in-memory twin of the
    /// database's SQL compilation of the same filter.
    pub fn apply(&self, rows: Vec<EmployeeRow>) -> PagedResult<EmployeeRow> {
        let mut matched: Vec<EmployeeRow> = rows.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        let total_count = matched.len() as u64;
        let offset = (self.page.saturating_sub(1) as usize) * self.page_size as usize;
        let data: Vec<EmployeeRow> = matched
            .into_iter()
            .skip(offset)
            .take(self.page_size as usize)
            .collect();
        PagedResult::new(data, total_count, self.page, self.page_size)
    }

    /// Convenience: runs the filter over every employee in a registry.
    pub fn run(&self, registry: &GroupRegistry) -> PagedResult<EmployeeRow> {
        let mut rows = Vec::new();
        for name in registry.list_group_names() {
            if let Some(group) = registry.get(&name) {
                for employee in group.employees() {
                    rows.push(EmployeeRow {
                        id: None,
                        group_name: group.name().to_string(),
                        employee: employee.clone(),
                    });
                }
            }
        }
        self.apply(rows)
    }
}

/// One page of query results plus the metadata to navigate the rest.
/// Everything beyond the four stored fields is derived, never set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, total_count: u64, current_page: u32, page_size: u32) -> Self {
        Self {
            data,
            total_count,
            current_page,
            page_size,
        }
    }

    /// Number of pages needed for `total_count` items; 0 when the page size
    /// is 0 (no division happens).
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size as u64) as u32
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}
