use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::analysis::AgeStatistics;
use crate::models::employee::{Condition, Employee};

/// A capacity-bounded, insertion-ordered collection of employees.
///
/// Two invariants hold at all times: the member count never exceeds
/// `max_capacity`, and no two members share an identity (first + last name).
/// `add` enforces both; `remove_duplicates` exists to repair lists built
/// outside those checks (imports, bulk edits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    name: String,
    employees: Vec<Employee>,
    max_capacity: usize,
}

impl Group {
    pub fn new(name: impl Into<String>, max_capacity: usize) -> Self {
        Self {
            name: name.into(),
            employees: Vec::new(),
            max_capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Whether an employee with the same identity is already a member.
    pub fn contains(&self, employee: &Employee) -> bool {
        self.employees.iter().any(|e| e.same_identity(employee))
    }

    /// Appends an employee, rejecting duplicates before capacity so the
    /// caller learns the more specific failure first.
    pub fn add(&mut self, employee: Employee) -> Result<(), Error> {
        if self.contains(&employee) {
            return Err(Error::DuplicateEmployee(
                employee.first_name,
                employee.last_name,
            ));
        }
        if self.employees.len() >= self.max_capacity {
            return Err(Error::GroupFull {
                name: self.name.clone(),
                capacity: self.max_capacity,
            });
        }
        self.employees.push(employee);
        Ok(())
    }

    /// Removes the member matching `employee`'s identity and returns it.
    pub fn remove(&mut self, employee: &Employee) -> Result<Employee, Error> {
        match self.employees.iter().position(|e| e.same_identity(employee)) {
            Some(idx) => Ok(self.employees.remove(idx)),
            None => Err(Error::EmployeeNotFound(
                employee.first_name.clone(),
                employee.last_name.clone(),
            )),
        }
    }

    /// Sets the condition of the member matching `employee`'s identity.
    pub fn change_condition(
        &mut self,
        employee: &Employee,
        condition: Condition,
    ) -> Result<(), Error> {
        let member = self.member_mut(employee)?;
        member.condition = condition;
        Ok(())
    }

    /// Adds `amount` to the salary of the member matching `employee`'s
    /// identity.
    pub fn raise_salary(&mut self, employee: &Employee, amount: f64) -> Result<(), Error> {
        let member = self.member_mut(employee)?;
        member.salary += amount;
        Ok(())
    }

    fn member_mut(&mut self, employee: &Employee) -> Result<&mut Employee, Error> {
        self.employees
            .iter_mut()
            .find(|e| e.same_identity(employee))
            .ok_or_else(|| {
                Error::EmployeeNotFound(employee.first_name.clone(), employee.last_name.clone())
            })
    }

    /// First member whose last name equals `last_name` exactly.
    pub fn find_by_last_name(&self, last_name: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.last_name == last_name)
    }

    /// Members whose first or last name contains `fragment` (case-sensitive).
    pub fn find_partial(&self, fragment: &str) -> Vec<&Employee> {
        self.employees
            .iter()
            .filter(|e| e.first_name.contains(fragment) || e.last_name.contains(fragment))
            .collect()
    }

    pub fn count_by_condition(&self, condition: Condition) -> usize {
        self.employees
            .iter()
            .filter(|e| e.condition == condition)
            .count()
    }

    /// Members in natural order (ascending last name), stable.
    pub fn sorted_by_name(&self) -> Vec<Employee> {
        let mut sorted = self.employees.clone();
        sorted.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        sorted
    }

    /// Members by salary, highest first, stable.
    pub fn sorted_by_salary_desc(&self) -> Vec<Employee> {
        let mut sorted = self.employees.clone();
        sorted.sort_by(|a, b| b.salary.total_cmp(&a.salary));
        sorted
    }

    /// The member greatest in natural order (last in the alphabet).
    pub fn max_by_name(&self) -> Option<&Employee> {
        self.employees
            .iter()
            .max_by(|a, b| a.last_name.cmp(&b.last_name))
    }

    /// Scans in list order, keeps the first occurrence of each identity and
    /// drops later ones. Returns how many were dropped. Order-preserving.
    pub fn remove_duplicates(&mut self) -> usize {
        if self.employees.is_empty() {
            return 0;
        }
        let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
        let before = self.employees.len();
        self.employees
            .retain(|e| seen.insert((e.first_name.clone(), e.last_name.clone())));
        before - self.employees.len()
    }

    /// Partitions members by condition. Every condition is present as a key
    /// even when its partition is empty; each partition is sorted by last
    /// name.
    pub fn group_by_condition(&self) -> BTreeMap<Condition, Vec<Employee>> {
        let mut result: BTreeMap<Condition, Vec<Employee>> = BTreeMap::new();
        for condition in Condition::ALL {
            result.insert(condition, Vec::new());
        }
        for employee in self.sorted_by_name() {
            result
                .get_mut(&employee.condition)
                .expect("all conditions pre-seeded")
                .push(employee);
        }
        result
    }

    /// Median of member salaries: the middle element for an odd count, the
    /// average of the two middle elements for an even count, 0 when empty.
    pub fn median_salary(&self) -> f64 {
        if self.employees.is_empty() {
            return 0.0;
        }
        let mut salaries: Vec<f64> = self.employees.iter().map(|e| e.salary).collect();
        salaries.sort_by(|a, b| a.total_cmp(b));
        let n = salaries.len();
        if n % 2 == 1 {
            salaries[n / 2]
        } else {
            (salaries[n / 2 - 1] + salaries[n / 2]) / 2.0
        }
    }

    pub fn oldest(&self) -> Option<&Employee> {
        self.employees.iter().min_by_key(|e| e.birth_year)
    }

    pub fn youngest(&self) -> Option<&Employee> {
        self.employees.iter().max_by_key(|e| e.birth_year)
    }

    /// Mean age relative to `current_year`; 0 for an empty group.
    pub fn average_age(&self, current_year: i32) -> f64 {
        if self.employees.is_empty() {
            return 0.0;
        }
        let total: i64 = self
            .employees
            .iter()
            .map(|e| (current_year - e.birth_year) as i64)
            .sum();
        total as f64 / self.employees.len() as f64
    }

    /// Min/max/average age and member count relative to `current_year`.
    /// All zeros for an empty group.
    pub fn age_statistics(&self, current_year: i32) -> AgeStatistics {
        if self.employees.is_empty() {
            return AgeStatistics::default();
        }
        let ages: Vec<i32> = self
            .employees
            .iter()
            .map(|e| current_year - e.birth_year)
            .collect();
        AgeStatistics {
            min_age: *ages.iter().min().expect("non-empty"),
            max_age: *ages.iter().max().expect("non-empty"),
            average_age: ages.iter().map(|&a| a as i64).sum::<i64>() as f64 / ages.len() as f64,
            count: ages.len(),
        }
    }

    /// Members earning at least `min`, highest salary first.
    pub fn filter_by_min_salary(&self, min: f64) -> Vec<Employee> {
        let mut matched: Vec<Employee> = self
            .employees
            .iter()
            .filter(|e| e.salary >= min)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.salary.total_cmp(&a.salary));
        matched
    }

    /// Members with `min <= salary <= max`, highest salary first.
    pub fn filter_by_salary_range(&self, min: f64, max: f64) -> Vec<Employee> {
        let mut matched: Vec<Employee> = self
            .employees
            .iter()
            .filter(|e| e.salary >= min && e.salary <= max)
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.salary.total_cmp(&a.salary));
        matched
    }

    /// The `count` highest-paid members, highest first.
    pub fn top_earners(&self, count: usize) -> Vec<Employee> {
        let mut sorted = self.sorted_by_salary_desc();
        sorted.truncate(count);
        sorted
    }

    /// Rank cutoff over salaries: sorts ascending and returns the suffix
    /// starting at `ceil(percentile/100 * n) - 1`, inclusive.
    ///
    /// Note this is a suffix by rank, not a true percentile cutoff value;
    /// the arithmetic is kept exactly as the historical behavior, with the
    /// index clamped at 0 so a percentile of 0 returns everyone.
    pub fn filter_by_percentile(&self, percentile: f64) -> Vec<Employee> {
        let n = self.employees.len();
        let index = ((percentile / 100.0) * n as f64).ceil() as i64 - 1;
        let index = index.max(0) as usize;
        let mut sorted = self.employees.clone();
        sorted.sort_by(|a, b| a.salary.total_cmp(&b.salary));
        sorted.into_iter().skip(index).collect()
    }

    /// Groups members by exact salary, ascending.
    pub fn group_by_salary(&self) -> Vec<(f64, Vec<Employee>)> {
        let mut sorted = self.employees.clone();
        sorted.sort_by(|a, b| a.salary.total_cmp(&b.salary));
        let mut result: Vec<(f64, Vec<Employee>)> = Vec::new();
        for employee in sorted {
            match result.last_mut() {
                Some((salary, bucket)) if *salary == employee.salary => bucket.push(employee),
                _ => result.push((employee.salary, vec![employee])),
            }
        }
        result
    }

    /// Buckets members into `[floor(salary/bucket)*bucket, +bucket)` ranges,
    /// keyed by a "low-high" label such as `"3000-4000"`.
    pub fn group_by_salary_range(&self, bucket_size: f64) -> BTreeMap<String, Vec<Employee>> {
        let mut result: BTreeMap<String, Vec<Employee>> = BTreeMap::new();
        for employee in &self.employees {
            let floor = (employee.salary / bucket_size).floor() * bucket_size;
            let label = format!("{}-{}", floor as i64, (floor + bucket_size) as i64);
            result.entry(label).or_default().push(employee.clone());
        }
        result
    }
}
