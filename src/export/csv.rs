use crate::db::GroupStatistics;
use crate::models::{Employee, Group, GroupRegistry};

const EMPLOYEE_HEADER: &str = "First Name,Last Name,Condition,Birth Year,Salary";

/// One group's members, without a group column.
pub fn employees_to_csv(group: &Group) -> String {
    let mut out = String::from(EMPLOYEE_HEADER);
    out.push('\n');
    for employee in group.employees() {
        push_employee_fields(&mut out, employee);
        out.push('\n');
    }
    out
}

/// Every group in the registry, with a trailing `Group Name` column. Groups
/// come out in the registry's iteration order for its storage mode.
pub fn registry_to_csv(registry: &GroupRegistry) -> String {
    let mut out = String::from(EMPLOYEE_HEADER);
    out.push_str(",Group Name\n");
    for name in registry.list_group_names() {
        let Some(group) = registry.get(&name) else {
            continue;
        };
        for employee in group.employees() {
            push_employee_fields(&mut out, employee);
            out.push(',');
            out.push_str(&escape(group.name()));
            out.push('\n');
        }
    }
    out
}

/// Per-group aggregate report.
pub fn group_statistics_to_csv(stats: &[GroupStatistics]) -> String {
    let mut out = String::from(
        "Group Name,Employee Count,Average Salary,Rating Count,Average Rating,Fill Percentage\n",
    );
    for stat in stats {
        out.push_str(&escape(&stat.group_name));
        out.push_str(&format!(
            ",{},{:.2},{},{:.2},{:.2}\n",
            stat.employee_count,
            stat.average_salary,
            stat.rating_count,
            stat.average_rating,
            stat.fill_percentage(),
        ));
    }
    out
}

fn push_employee_fields(out: &mut String, employee: &Employee) {
    out.push_str(&escape(&employee.first_name));
    out.push(',');
    out.push_str(&escape(&employee.last_name));
    out.push(',');
    out.push_str(employee.condition.storage_token());
    out.push(',');
    out.push_str(&employee.birth_year.to_string());
    out.push(',');
    out.push_str(&format!("{:.2}", employee.salary));
}

/// Double-quote wraps a value containing a comma, quote, or newline, with
/// internal quotes doubled. Everything else passes through untouched.
fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
