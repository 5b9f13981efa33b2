use speculate2::speculate;
use staffbook::models::*;

fn row(first: &str, last: &str, condition: Condition, year: i32, salary: f64, group: &str) -> EmployeeRow {
    EmployeeRow {
        id: None,
        group_name: group.to_string(),
        employee: Employee::new(first, last, condition, year, salary),
    }
}

fn numbered_rows(count: usize) -> Vec<EmployeeRow> {
    (0..count)
        .map(|i| {
            row(
                "Emp",
                &format!("Name{i:02}"),
                Condition::Present,
                1980 + (i as i32 % 20),
                3000.0 + i as f64 * 100.0,
                "bulk",
            )
        })
        .collect()
}

speculate! {
    describe "criteria" {
        it "matches a last-name fragment case-insensitively" {
            let filter = EmployeeFilter::new().last_name("kowal");
            assert!(filter.matches(&row("Jan", "Kowalski", Condition::Present, 1985, 4000.0, "dev")));
            assert!(!filter.matches(&row("Jan", "Nowak", Condition::Present, 1985, 4000.0, "dev")));
        }

        it "ANDs every criterion that is set" {
            let filter = EmployeeFilter::new()
                .min_salary(3000.0)
                .max_salary(5000.0)
                .condition(Condition::Present)
                .group_name("dev");
            assert!(filter.matches(&row("A", "Aa", Condition::Present, 1985, 4000.0, "dev")));
            assert!(!filter.matches(&row("A", "Aa", Condition::Sick, 1985, 4000.0, "dev")));
            assert!(!filter.matches(&row("A", "Aa", Condition::Present, 1985, 5500.0, "dev")));
            assert!(!filter.matches(&row("A", "Aa", Condition::Present, 1985, 4000.0, "ops")));
        }

        it "birth year bounds are inclusive" {
            let filter = EmployeeFilter::new().birth_year_from(1985).birth_year_to(1990);
            assert!(filter.matches(&row("A", "Aa", Condition::Present, 1985, 1.0, "dev")));
            assert!(filter.matches(&row("A", "Aa", Condition::Present, 1990, 1.0, "dev")));
            assert!(!filter.matches(&row("A", "Aa", Condition::Present, 1984, 1.0, "dev")));
        }

        it "an empty filter matches everything" {
            let filter = EmployeeFilter::new();
            assert!(filter.matches(&row("A", "Aa", Condition::Absent, 1950, 0.5, "anything")));
        }
    }

    describe "sorting" {
        it "sorts by the selected field and direction" {
            let rows = vec![
                row("A", "Cc", Condition::Present, 1985, 2000.0, "dev"),
                row("B", "Aa", Condition::Present, 1985, 3000.0, "dev"),
                row("C", "Bb", Condition::Present, 1985, 1000.0, "dev"),
            ];
            let by_name = EmployeeFilter::new().apply(rows.clone());
            let names: Vec<&str> = by_name.data.iter().map(|r| r.employee.last_name.as_str()).collect();
            assert_eq!(names, vec!["Aa", "Bb", "Cc"]);

            let by_salary = EmployeeFilter::new()
                .sort_by(SortField::Salary)
                .sort_direction(SortDirection::Descending)
                .apply(rows);
            let salaries: Vec<f64> = by_salary.data.iter().map(|r| r.employee.salary).collect();
            assert_eq!(salaries, vec![3000.0, 2000.0, 1000.0]);
        }

        it "falls back to the last-name default for an unknown sort key" {
            assert_eq!(SortField::from_key("salary"), SortField::Salary);
            assert_eq!(SortField::from_key("nonsense"), SortField::LastName);
        }
    }

    describe "pagination" {
        it "25 rows at page size 10 make 3 pages" {
            let result = EmployeeFilter::new().page_size(10).apply(numbered_rows(25));
            assert_eq!(result.total_count, 25);
            assert_eq!(result.total_pages(), 3);
            assert_eq!(result.data.len(), 10);
        }

        it "the last page holds the remainder" {
            let result = EmployeeFilter::new().page(3).page_size(10).apply(numbered_rows(25));
            assert_eq!(result.data.len(), 5);
            assert!(result.has_previous());
            assert!(!result.has_next());
        }

        it "has_next is true before the last page" {
            let first = EmployeeFilter::new().page(1).page_size(10).apply(numbered_rows(25));
            assert!(first.has_next());
            assert!(!first.has_previous());
        }

        it "a page past the end is empty but keeps the totals" {
            let result = EmployeeFilter::new().page(9).page_size(10).apply(numbered_rows(25));
            assert!(result.data.is_empty());
            assert_eq!(result.total_count, 25);
        }

        it "page size zero yields zero pages and no division" {
            let result = EmployeeFilter::new().page_size(0).apply(numbered_rows(5));
            assert_eq!(result.total_pages(), 0);
            assert!(result.data.is_empty());
            assert!(!result.has_next());
        }
    }

    describe "run over a registry" {
        it "flattens every group into rows and filters across them" {
            let mut registry = GroupRegistry::new();
            registry.add_group("dev", 10);
            registry.add_group("ops", 10);
            registry.get_mut("dev").unwrap()
                .add(Employee::new("Jan", "Kowalski", Condition::Present, 1985, 6000.0)).unwrap();
            registry.get_mut("ops").unwrap()
                .add(Employee::new("Anna", "Nowak", Condition::Sick, 1990, 4000.0)).unwrap();

            let everyone = EmployeeFilter::new().run(&registry);
            assert_eq!(everyone.total_count, 2);

            let sick = EmployeeFilter::new().condition(Condition::Sick).run(&registry);
            assert_eq!(sick.total_count, 1);
            assert_eq!(sick.data[0].group_name, "ops");
        }
    }
}
