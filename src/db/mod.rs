mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    AuditEntry, AuditQuery, Condition, Employee, EmployeeFilter, EmployeeRow, Group,
    GroupRegistry, Identified, OperationType, PagedResult, Rate,
};

/// Handle to the SQLite store.
///
/// Owns the connection behind a mutex; clones share it. The lifecycle is
/// explicit (`open`/`migrate`), never a process-wide singleton, and every
/// mutation is either a single statement or a guarded check-then-insert
/// under the lock, so a failed call leaves no partial state behind.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "staffbook")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("staffbook.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Group operations
    // ============================================================

    /// Creates a group, or updates the capacity of an existing group with
    /// the same (case-insensitive) name. The silent overwrite mirrors the
    /// in-memory registry's `add_group`; existing members are kept.
    pub fn create_group(&self, name: &str, max_capacity: usize) -> Result<GroupRow> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO groups (name, max_capacity) VALUES (?, ?)
             ON CONFLICT(name) DO UPDATE SET max_capacity = excluded.max_capacity",
            (name, max_capacity as i64),
        )?;
        let row = conn.query_row(
            "SELECT id, name, max_capacity FROM groups WHERE name = ?",
            [name],
            map_group_row,
        )?;
        tracing::info!("Group {} stored (capacity {})", row.name, row.max_capacity);
        Ok(row)
    }

    pub fn get_group(&self, name: &str) -> Result<Option<GroupRow>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row = conn
            .query_row(
                "SELECT id, name, max_capacity FROM groups WHERE name = ?",
                [name],
                map_group_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Hydrates a full in-memory [`Group`] with its members, in insertion
    /// (rowid) order.
    pub fn load_group(&self, name: &str) -> Result<Option<Group>> {
        let Some(group_row) = self.get_group(name)? else {
            return Ok(None);
        };
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT first_name, last_name, condition, birth_year, salary
             FROM employees WHERE group_id = ? AND deleted = 0 ORDER BY id",
        )?;
        let employees = stmt
            .query_map([group_row.id], map_employee)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut group = Group::new(group_row.name, group_row.max_capacity);
        for employee in employees {
            group.add(employee)?;
        }
        Ok(Some(group))
    }

    /// Hydrates the whole store into an in-memory registry, for the export
    /// formats and bulk views.
    pub fn load_registry(&self) -> Result<GroupRegistry> {
        let mut registry = GroupRegistry::new();
        for name in self.list_group_names()? {
            if let Some(group) = self.load_group(&name)? {
                registry.insert(group);
            }
        }
        Ok(registry)
    }

    pub fn delete_group(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM groups WHERE name = ?", [name])?;
        Ok(rows > 0)
    }

    /// Group names in case-insensitive lexicographic order.
    pub fn list_group_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT name FROM groups ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Names of groups with no (non-deleted) members.
    pub fn find_empty_groups(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT g.name FROM groups g
             LEFT JOIN employees e ON e.group_id = g.id AND e.deleted = 0
             GROUP BY g.id HAVING COUNT(e.id) = 0 ORDER BY g.name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// (name, member count) for non-empty groups, highest count first.
    pub fn count_employees_per_group(&self) -> Result<Vec<(String, u64)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT g.name, COUNT(e.id) AS total FROM groups g
             JOIN employees e ON e.group_id = g.id AND e.deleted = 0
             GROUP BY g.id HAVING total > 0 ORDER BY total DESC",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    /// Names of groups with at least `min_count` members, alphabetical.
    pub fn groups_with_minimum_employees(&self, min_count: u64) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT g.name FROM groups g
             LEFT JOIN employees e ON e.group_id = g.id AND e.deleted = 0
             GROUP BY g.id HAVING COUNT(e.id) >= ? ORDER BY g.name",
        )?;
        let names = stmt
            .query_map([min_count as i64], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Per-group aggregates (member count, salary average, rating count and
    /// average, capacity), alphabetical by group name.
    pub fn group_statistics(&self) -> Result<Vec<GroupStatistics>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT g.name,
                    (SELECT COUNT(*) FROM employees e WHERE e.group_id = g.id AND e.deleted = 0),
                    (SELECT COALESCE(AVG(e.salary), 0) FROM employees e WHERE e.group_id = g.id AND e.deleted = 0),
                    (SELECT COUNT(*) FROM rates r WHERE r.group_id = g.id),
                    (SELECT COALESCE(AVG(r.value), 0) FROM rates r WHERE r.group_id = g.id),
                    g.max_capacity
             FROM groups g ORDER BY g.name",
        )?;
        let stats = stmt
            .query_map([], |row| {
                Ok(GroupStatistics {
                    group_name: row.get(0)?,
                    employee_count: row.get::<_, i64>(1)? as u64,
                    average_salary: row.get(2)?,
                    rating_count: row.get::<_, i64>(3)? as u64,
                    average_rating: row.get(4)?,
                    max_capacity: row.get::<_, i64>(5)? as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    // ============================================================
    // Employee operations
    // ============================================================

    /// Inserts an employee into a group, enforcing the same invariants as
    /// the in-memory `Group::add`: no duplicate identity, no overflow past
    /// capacity.
    pub fn add_employee(&self, group_name: &str, employee: &Employee) -> Result<EmployeeRow> {
        let group = self
            .get_group(group_name)?
            .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;

        let conn = self.conn.lock().expect("database lock poisoned");

        let duplicate: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM employees
             WHERE group_id = ? AND first_name = ? AND last_name = ? AND deleted = 0)",
            (group.id, &employee.first_name, &employee.last_name),
            |row| row.get(0),
        )?;
        if duplicate {
            return Err(Error::DuplicateEmployee(
                employee.first_name.clone(),
                employee.last_name.clone(),
            ));
        }

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM employees WHERE group_id = ? AND deleted = 0",
            [group.id],
            |row| row.get(0),
        )?;
        if count as usize >= group.max_capacity {
            return Err(Error::GroupFull {
                name: group.name.clone(),
                capacity: group.max_capacity,
            });
        }

        conn.execute(
            "INSERT INTO employees (group_id, first_name, last_name, condition, birth_year, salary)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                group.id,
                &employee.first_name,
                &employee.last_name,
                employee.condition.storage_token(),
                employee.birth_year,
                employee.salary,
            ),
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            "Employee {} {} added to group {}",
            employee.first_name,
            employee.last_name,
            group.name
        );

        Ok(EmployeeRow {
            id: Some(id),
            group_name: group.name,
            employee: employee.clone(),
        })
    }

    pub fn get_employee(&self, id: i64) -> Result<Option<EmployeeRow>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let row = conn
            .query_row(
                &format!("{EMPLOYEE_ROW_SELECT} WHERE e.id = ? AND e.deleted = 0"),
                [id],
                map_employee_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Overwrites every attribute of the employee with `id`.
    pub fn update_employee(&self, id: i64, employee: &Employee) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE employees SET first_name = ?, last_name = ?, condition = ?,
             birth_year = ?, salary = ? WHERE id = ? AND deleted = 0",
            (
                &employee.first_name,
                &employee.last_name,
                employee.condition.storage_token(),
                employee.birth_year,
                employee.salary,
                id,
            ),
        )?;
        Ok(rows > 0)
    }

    pub fn set_condition(&self, id: i64, condition: Condition) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE employees SET condition = ? WHERE id = ? AND deleted = 0",
            (condition.storage_token(), id),
        )?;
        Ok(rows > 0)
    }

    pub fn raise_salary(&self, id: i64, amount: f64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE employees SET salary = salary + ? WHERE id = ? AND deleted = 0",
            (amount, id),
        )?;
        Ok(rows > 0)
    }

    /// Soft delete: the row stays (restorable) but every read skips it.
    pub fn delete_employee(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE employees SET deleted = 1 WHERE id = ? AND deleted = 0",
            [id],
        )?;
        Ok(rows > 0)
    }

    pub fn restore_employee(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE employees SET deleted = 0 WHERE id = ? AND deleted = 1",
            [id],
        )?;
        Ok(rows > 0)
    }

    /// Members of a group, ascending by last name.
    pub fn employees_in_group(&self, group_name: &str) -> Result<Vec<EmployeeRow>> {
        let group = self
            .get_group(group_name)?
            .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "{EMPLOYEE_ROW_SELECT} WHERE e.group_id = ? AND e.deleted = 0 ORDER BY e.last_name"
        ))?;
        let rows = stmt
            .query_map([group.id], map_employee_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ============================================================
    // Query operations
    // ============================================================

    /// Employees whose last name contains `pattern`, ascending by last name.
    pub fn find_by_last_name_pattern(&self, pattern: &str) -> Result<Vec<EmployeeRow>> {
        self.query_rows(
            &format!(
                "{EMPLOYEE_ROW_SELECT} WHERE e.deleted = 0 AND e.last_name LIKE ?
                 ORDER BY e.last_name"
            ),
            [format!("%{}%", pattern)],
        )
    }

    /// Employees with `min <= salary <= max`, highest salary first.
    pub fn find_by_salary_range(&self, min: f64, max: f64) -> Result<Vec<EmployeeRow>> {
        self.query_rows(
            &format!(
                "{EMPLOYEE_ROW_SELECT} WHERE e.deleted = 0 AND e.salary BETWEEN ? AND ?
                 ORDER BY e.salary DESC"
            ),
            (min, max),
        )
    }

    pub fn find_by_condition(&self, condition: Condition) -> Result<Vec<EmployeeRow>> {
        self.query_rows(
            &format!(
                "{EMPLOYEE_ROW_SELECT} WHERE e.deleted = 0 AND e.condition = ?
                 ORDER BY e.last_name"
            ),
            [condition.storage_token()],
        )
    }

    pub fn top_earners(&self, limit: u32) -> Result<Vec<EmployeeRow>> {
        self.query_rows(
            &format!(
                "{EMPLOYEE_ROW_SELECT} WHERE e.deleted = 0 ORDER BY e.salary DESC LIMIT ?"
            ),
            [limit as i64],
        )
    }

    pub fn find_by_birth_year_range(&self, from: i32, to: i32) -> Result<Vec<EmployeeRow>> {
        self.query_rows(
            &format!(
                "{EMPLOYEE_ROW_SELECT} WHERE e.deleted = 0 AND e.birth_year BETWEEN ? AND ?
                 ORDER BY e.birth_year"
            ),
            (from, to),
        )
    }

    /// Count, average, min, and max salary over every persisted employee.
    pub fn employee_statistics(&self) -> Result<EmployeeStatistics> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(AVG(salary), 0), COALESCE(MIN(salary), 0),
                    COALESCE(MAX(salary), 0)
             FROM employees WHERE deleted = 0",
            [],
            |row| {
                Ok(EmployeeStatistics {
                    count: row.get::<_, i64>(0)? as u64,
                    average_salary: row.get(1)?,
                    min_salary: row.get(2)?,
                    max_salary: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Headcount per condition, over every persisted employee. Conditions
    /// with no employees are absent from the result.
    pub fn count_by_condition(&self) -> Result<Vec<(Condition, u64)>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT condition, COUNT(*) FROM employees WHERE deleted = 0
             GROUP BY condition ORDER BY condition",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let token: String = row.get(0)?;
                let condition = Condition::from_storage_token(&token)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
                Ok((condition, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    fn query_rows<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<EmployeeRow>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map_employee_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ============================================================
    // Dynamic filter
    // ============================================================

    /// Compiles an [`EmployeeFilter`] to SQL: one COUNT query for the total
    /// and one page query with the filter's sort and window. Predicate
    /// assembly matches the in-memory `EmployeeFilter::apply` semantics.
    pub fn filter_employees(&self, filter: &EmployeeFilter) -> Result<PagedResult<EmployeeRow>> {
        let mut clauses: Vec<&str> = vec!["e.deleted = 0"];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(fragment) = &filter.last_name {
            clauses.push("LOWER(e.last_name) LIKE ?");
            params.push(Box::new(format!("%{}%", fragment.to_lowercase())));
        }
        if let Some(min) = filter.min_salary {
            clauses.push("e.salary >= ?");
            params.push(Box::new(min));
        }
        if let Some(max) = filter.max_salary {
            clauses.push("e.salary <= ?");
            params.push(Box::new(max));
        }
        if let Some(condition) = filter.condition {
            clauses.push("e.condition = ?");
            params.push(Box::new(condition.storage_token().to_string()));
        }
        if let Some(from) = filter.birth_year_from {
            clauses.push("e.birth_year >= ?");
            params.push(Box::new(from));
        }
        if let Some(to) = filter.birth_year_to {
            clauses.push("e.birth_year <= ?");
            params.push(Box::new(to));
        }
        if let Some(group) = &filter.group_name {
            clauses.push("g.name = ?");
            params.push(Box::new(group.clone()));
        }

        let where_clause = clauses.join(" AND ");
        let conn = self.conn.lock().expect("database lock poisoned");

        let count_sql = format!(
            "SELECT COUNT(*) FROM employees e JOIN groups g ON g.id = e.group_id
             WHERE {where_clause}"
        );
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total_count: i64 =
            conn.query_row(&count_sql, params_ref.as_slice(), |row| row.get(0))?;

        let page_sql = format!(
            "{EMPLOYEE_ROW_SELECT} WHERE {where_clause}
             ORDER BY {} {} LIMIT ? OFFSET ?",
            filter.sort_by.column(),
            filter.sort_direction.keyword(),
        );
        let offset = filter.page.saturating_sub(1) as i64 * filter.page_size as i64;
        let mut page_params = params;
        page_params.push(Box::new(filter.page_size as i64));
        page_params.push(Box::new(offset));
        let page_params_ref: Vec<&dyn ToSql> = page_params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&page_sql)?;
        let data = stmt
            .query_map(page_params_ref.as_slice(), map_employee_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(
            "Dynamic filter returned {} of {} rows",
            data.len(),
            total_count
        );
        Ok(PagedResult::new(
            data,
            total_count as u64,
            filter.page,
            filter.page_size,
        ))
    }

    // ============================================================
    // Rates
    // ============================================================

    pub fn add_rate(&self, group_name: &str, rate: &Rate) -> Result<Rate> {
        let group = self
            .get_group(group_name)?
            .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO rates (group_id, value, rating_date, comment) VALUES (?, ?, ?, ?)",
            (
                group.id,
                rate.value,
                rate.rating_date.to_string(),
                &rate.comment,
            ),
        )?;
        Ok(Rate {
            id: Some(conn.last_insert_rowid()),
            ..rate.clone()
        })
    }

    pub fn rates_for_group(&self, group_name: &str) -> Result<Vec<Rate>> {
        let group = self
            .get_group(group_name)?
            .ok_or_else(|| Error::GroupNotFound(group_name.to_string()))?;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, value, rating_date, comment FROM rates
             WHERE group_id = ? ORDER BY rating_date DESC, id DESC",
        )?;
        let rates = stmt
            .query_map([group.id], |row| {
                let date: String = row.get(2)?;
                Ok(Rate {
                    id: Some(row.get(0)?),
                    value: row.get(1)?,
                    rating_date: date.parse().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?,
                    comment: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rates)
    }

    // ============================================================
    // Audit log
    // ============================================================

    /// Appends a change record for an [`Identified`] entity.
    pub fn log_change(
        &self,
        operation: OperationType,
        entity: &dyn Identified,
        username: Option<&str>,
        changes: Option<&str>,
    ) -> Result<AuditEntry> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let now = Utc::now();
        conn.execute(
            "INSERT INTO audit_log (operation_type, entity_name, entity_id, timestamp, username, changes)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                operation.as_str(),
                entity.entity_name(),
                entity.entity_id(),
                now.to_rfc3339(),
                username,
                changes,
            ),
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(
            "Audit: {} {} [{}]",
            operation.as_str(),
            entity.entity_name(),
            entity.entity_id().map_or("-".into(), |i| i.to_string()),
        );
        Ok(AuditEntry {
            id,
            operation,
            entity_name: entity.entity_name().to_string(),
            entity_id: entity.entity_id(),
            timestamp: now,
            username: username.map(String::from),
            changes: changes.map(String::from),
        })
    }

    /// Change history for one entity, newest first.
    pub fn entity_history(&self, entity_name: &str, entity_id: i64) -> Result<Vec<AuditEntry>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, operation_type, entity_name, entity_id, timestamp, username, changes
             FROM audit_log WHERE entity_name = ? AND entity_id = ?
             ORDER BY timestamp DESC, id DESC",
        )?;
        let entries = stmt
            .query_map((entity_name, entity_id), map_audit_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// History filtered by any combination of operation, time window, and
    /// username, newest first.
    pub fn filtered_history(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(operation) = query.operation {
            clauses.push("operation_type = ?");
            params.push(Box::new(operation.as_str().to_string()));
        }
        if let Some(from) = query.from {
            clauses.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }
        if let Some(to) = query.to {
            clauses.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }
        if let Some(username) = &query.username {
            clauses.push("username = ?");
            params.push(Box::new(username.clone()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT id, operation_type, entity_name, entity_id, timestamp, username, changes
             FROM audit_log {where_clause} ORDER BY timestamp DESC, id DESC"
        );

        let conn = self.conn.lock().expect("database lock poisoned");
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_ref.as_slice(), map_audit_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// A persisted group header (without members).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub max_capacity: usize,
}

impl Identified for GroupRow {
    fn entity_name(&self) -> &'static str {
        "group"
    }

    fn entity_id(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Identified for EmployeeRow {
    fn entity_name(&self) -> &'static str {
        "employee"
    }

    fn entity_id(&self) -> Option<i64> {
        self.id
    }
}

/// Aggregates over the whole employee table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStatistics {
    pub count: u64,
    pub average_salary: f64,
    pub min_salary: f64,
    pub max_salary: f64,
}

/// Per-group aggregates used by the statistics views and CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStatistics {
    pub group_name: String,
    pub employee_count: u64,
    pub average_salary: f64,
    pub rating_count: u64,
    pub average_rating: f64,
    pub max_capacity: usize,
}

impl GroupStatistics {
    /// Member count as a percentage of capacity; 0 for a zero capacity.
    pub fn fill_percentage(&self) -> f64 {
        if self.max_capacity == 0 {
            0.0
        } else {
            self.employee_count as f64 / self.max_capacity as f64 * 100.0
        }
    }
}

const EMPLOYEE_ROW_SELECT: &str =
    "SELECT e.id, e.first_name, e.last_name, e.condition, e.birth_year, e.salary, g.name
     FROM employees e JOIN groups g ON g.id = e.group_id";

fn map_group_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        name: row.get(1)?,
        max_capacity: row.get::<_, i64>(2)? as usize,
    })
}

/// Maps the five employee columns starting at index 0. An unknown condition
/// token is a conversion failure, never a silent default.
fn map_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<Employee> {
    let token: String = row.get(2)?;
    Ok(Employee {
        first_name: row.get(0)?,
        last_name: row.get(1)?,
        condition: Condition::from_storage_token(&token)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        birth_year: row.get(3)?,
        salary: row.get(4)?,
    })
}

fn map_employee_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmployeeRow> {
    let token: String = row.get(3)?;
    Ok(EmployeeRow {
        id: Some(row.get(0)?),
        group_name: row.get(6)?,
        employee: Employee {
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            condition: Condition::from_storage_token(&token).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
            })?,
            birth_year: row.get(4)?,
            salary: row.get(5)?,
        },
    })
}

fn map_audit_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    let operation: String = row.get(1)?;
    let timestamp: String = row.get(4)?;
    Ok(AuditEntry {
        id: row.get(0)?,
        operation: OperationType::from_str(&operation).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("unknown operation type: {operation}").into(),
            )
        })?,
        entity_name: row.get(2)?,
        entity_id: row.get(3)?,
        timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        username: row.get(5)?,
        changes: row.get(6)?,
    })
}
