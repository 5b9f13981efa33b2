use speculate2::speculate;
use staffbook::db::Database;
use staffbook::error::Error;
use staffbook::models::*;

fn employee(first: &str, last: &str, condition: Condition, year: i32, salary: f64) -> Employee {
    Employee::new(first, last, condition, year, salary)
}

fn seed_group(db: &Database, name: &str, capacity: usize) {
    db.create_group(name, capacity).expect("Failed to create group");
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "groups" {
        it "creates a group and reads it back" {
            let created = db.create_group("developers", 12).expect("Failed to create group");
            assert_eq!(created.name, "developers");
            assert_eq!(created.max_capacity, 12);

            let found = db.get_group("developers").expect("Query failed");
            assert_eq!(found.unwrap().id, created.id);
        }

        it "returns None for a missing group" {
            assert!(db.get_group("nobody").expect("Query failed").is_none());
        }

        it "re-creating an existing name updates the capacity and keeps members" {
            seed_group(&db, "dev", 5);
            db.add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");

            let updated = db.create_group("dev", 9).expect("Failed to update group");
            assert_eq!(updated.max_capacity, 9);
            assert_eq!(db.employees_in_group("dev").expect("Query failed").len(), 1);
        }

        it "group names are case-insensitively unique" {
            seed_group(&db, "Dev", 5);
            let second = db.create_group("dev", 7).expect("Failed to upsert");
            assert_eq!(db.list_group_names().expect("Query failed").len(), 1);
            assert_eq!(second.max_capacity, 7);
        }

        it "deleting a group cascades to its members" {
            seed_group(&db, "dev", 5);
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");

            assert!(db.delete_group("dev").expect("Delete failed"));
            assert!(db.get_employee(row.id.unwrap()).expect("Query failed").is_none());
            assert!(!db.delete_group("dev").expect("Delete failed"));
        }

        it "lists names alphabetically" {
            seed_group(&db, "zebra", 5);
            seed_group(&db, "alpha", 5);
            assert_eq!(db.list_group_names().expect("Query failed"), vec!["alpha", "zebra"]);
        }

        it "finds empty groups and counts members per group" {
            seed_group(&db, "idle", 5);
            seed_group(&db, "busy", 5);
            db.add_employee("busy", &employee("A", "Aa", Condition::Present, 1985, 1000.0))
                .expect("Failed to add");
            db.add_employee("busy", &employee("B", "Bb", Condition::Present, 1985, 1000.0))
                .expect("Failed to add");

            assert_eq!(db.find_empty_groups().expect("Query failed"), vec!["idle"]);
            assert_eq!(
                db.count_employees_per_group().expect("Query failed"),
                vec![("busy".to_string(), 2)]
            );
            assert_eq!(
                db.groups_with_minimum_employees(2).expect("Query failed"),
                vec!["busy"]
            );
        }
    }

    describe "employees" {
        before {
            seed_group(&db, "dev", 3);
        }

        it "rejects an add into a missing group" {
            let err = db
                .add_employee("ghost", &employee("A", "Aa", Condition::Present, 1985, 1000.0))
                .unwrap_err();
            assert!(matches!(err, Error::GroupNotFound(name) if name == "ghost"));
        }

        it "rejects a duplicate identity within the group" {
            db.add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");
            let err = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Sick, 1990, 1.0))
                .unwrap_err();
            assert!(matches!(err, Error::DuplicateEmployee(..)));
        }

        it "rejects an add past the group capacity" {
            db.add_employee("dev", &employee("A", "Aa", Condition::Present, 1985, 1.0)).expect("add");
            db.add_employee("dev", &employee("B", "Bb", Condition::Present, 1985, 1.0)).expect("add");
            db.add_employee("dev", &employee("C", "Cc", Condition::Present, 1985, 1.0)).expect("add");
            let err = db
                .add_employee("dev", &employee("D", "Dd", Condition::Present, 1985, 1.0))
                .unwrap_err();
            assert!(matches!(err, Error::GroupFull { capacity: 3, .. }));
        }

        it "persists the condition as its storage token and reads it back" {
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::OnTrip, 1985, 4000.0))
                .expect("Failed to add");
            let found = db.get_employee(row.id.unwrap()).expect("Query failed").unwrap();
            assert_eq!(found.employee.condition, Condition::OnTrip);
            assert_eq!(found.group_name, "dev");
        }

        it "updates condition and salary in place" {
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");
            let id = row.id.unwrap();

            assert!(db.set_condition(id, Condition::Sick).expect("Update failed"));
            assert!(db.raise_salary(id, 500.0).expect("Update failed"));

            let found = db.get_employee(id).expect("Query failed").unwrap();
            assert_eq!(found.employee.condition, Condition::Sick);
            assert_eq!(found.employee.salary, 4500.0);
        }

        it "soft delete hides the row until it is restored" {
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");
            let id = row.id.unwrap();

            assert!(db.delete_employee(id).expect("Delete failed"));
            assert!(db.get_employee(id).expect("Query failed").is_none());
            assert!(db.employees_in_group("dev").expect("Query failed").is_empty());
            // deleting twice is a no-op
            assert!(!db.delete_employee(id).expect("Delete failed"));

            assert!(db.restore_employee(id).expect("Restore failed"));
            assert!(db.get_employee(id).expect("Query failed").is_some());
        }

        it "a soft-deleted identity no longer blocks a new add" {
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");
            db.delete_employee(row.id.unwrap()).expect("Delete failed");
            db.add_employee("dev", &employee("Jan", "Kowalski", Condition::Absent, 1985, 4200.0))
                .expect("Failed to re-add");
        }
    }

    describe "queries" {
        before {
            seed_group(&db, "dev", 10);
            seed_group(&db, "ops", 10);
            db.add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 6000.0)).expect("add");
            db.add_employee("dev", &employee("Anna", "Nowak", Condition::Sick, 1990, 4000.0)).expect("add");
            db.add_employee("ops", &employee("Piotr", "Wisniewski", Condition::Present, 1978, 5000.0)).expect("add");
        }

        it "matches last-name fragments" {
            let rows = db.find_by_last_name_pattern("owa").expect("Query failed");
            let names: Vec<&str> = rows.iter().map(|r| r.employee.last_name.as_str()).collect();
            assert_eq!(names, vec!["Kowalski", "Nowak"]);
        }

        it "salary range is inclusive and sorted highest first" {
            let rows = db.find_by_salary_range(4000.0, 5000.0).expect("Query failed");
            let salaries: Vec<f64> = rows.iter().map(|r| r.employee.salary).collect();
            assert_eq!(salaries, vec![5000.0, 4000.0]);
        }

        it "filters by condition" {
            let rows = db.find_by_condition(Condition::Sick).expect("Query failed");
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].employee.last_name, "Nowak");
        }

        it "limits the top earners" {
            let rows = db.top_earners(2).expect("Query failed");
            let salaries: Vec<f64> = rows.iter().map(|r| r.employee.salary).collect();
            assert_eq!(salaries, vec![6000.0, 5000.0]);
        }

        it "filters by birth year range" {
            let rows = db.find_by_birth_year_range(1980, 1990).expect("Query failed");
            assert_eq!(rows.len(), 2);
        }

        it "aggregates salary statistics" {
            let stats = db.employee_statistics().expect("Query failed");
            assert_eq!(stats.count, 3);
            assert_eq!(stats.average_salary, 5000.0);
            assert_eq!(stats.min_salary, 4000.0);
            assert_eq!(stats.max_salary, 6000.0);
        }

        it "statistics over an empty store are zeroed" {
            let db = Database::open_memory().expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            let stats = db.employee_statistics().expect("Query failed");
            assert_eq!(stats.count, 0);
            assert_eq!(stats.average_salary, 0.0);
        }

        it "counts per condition" {
            let counts = db.count_by_condition().expect("Query failed");
            assert!(counts.contains(&(Condition::Present, 2)));
            assert!(counts.contains(&(Condition::Sick, 1)));
        }
    }

    describe "dynamic filter" {
        before {
            seed_group(&db, "bulk", 100);
            for i in 0..25 {
                db.add_employee("bulk", &employee(
                    "Emp",
                    &format!("Name{i:02}"),
                    if i % 5 == 0 { Condition::Sick } else { Condition::Present },
                    1980 + (i % 20),
                    3000.0 + i as f64 * 100.0,
                )).expect("Failed to add");
            }
        }

        it "pages through the full set" {
            let filter = EmployeeFilter::new().page_size(10);
            let page1 = db.filter_employees(&filter).expect("Query failed");
            assert_eq!(page1.total_count, 25);
            assert_eq!(page1.total_pages(), 3);
            assert_eq!(page1.data.len(), 10);
            assert!(page1.has_next());

            let page3 = db.filter_employees(&filter.clone().page(3)).expect("Query failed");
            assert_eq!(page3.data.len(), 5);
            assert!(!page3.has_next());
            assert!(page3.has_previous());
        }

        it "combines criteria the way the in-memory filter does" {
            let filter = EmployeeFilter::new()
                .condition(Condition::Sick)
                .min_salary(3400.0)
                .page_size(50);
            let result = db.filter_employees(&filter).expect("Query failed");
            // sick rows are i = 0, 5, 10, 15, 20; salaries 3000, 3500, ...
            assert_eq!(result.total_count, 4);
            assert!(result.data.iter().all(|r| r.employee.condition == Condition::Sick));
            assert!(result.data.iter().all(|r| r.employee.salary >= 3400.0));
        }

        it "sorts by the selected column and direction" {
            let filter = EmployeeFilter::new()
                .sort_by(SortField::Salary)
                .sort_direction(SortDirection::Descending)
                .page_size(3);
            let result = db.filter_employees(&filter).expect("Query failed");
            let salaries: Vec<f64> = result.data.iter().map(|r| r.employee.salary).collect();
            assert_eq!(salaries, vec![5400.0, 5300.0, 5200.0]);
        }

        it "matches last-name fragments case-insensitively" {
            let filter = EmployeeFilter::new().last_name("name2").page_size(50);
            let result = db.filter_employees(&filter).expect("Query failed");
            // Name20 .. Name24
            assert_eq!(result.total_count, 5);
        }
    }

    describe "rates" {
        before {
            seed_group(&db, "dev", 5);
        }

        it "stores ratings and lists them newest first" {
            let d1 = chrono::NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
            let d2 = chrono::NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
            db.add_rate("dev", &Rate::new(4, d1, None).unwrap()).expect("Failed to rate");
            db.add_rate("dev", &Rate::new(6, d2, Some("great month".into())).unwrap())
                .expect("Failed to rate");

            let rates = db.rates_for_group("dev").expect("Query failed");
            assert_eq!(rates.len(), 2);
            assert_eq!(rates[0].value, 6);
            assert_eq!(rates[0].comment.as_deref(), Some("great month"));
            assert_eq!(rates[1].rating_date, d1);
        }

        it "rejects ratings for a missing group" {
            let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
            let err = db.add_rate("ghost", &Rate::new(3, date, None).unwrap()).unwrap_err();
            assert!(matches!(err, Error::GroupNotFound(_)));
        }

        it "feeds the per-group statistics" {
            let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
            db.add_rate("dev", &Rate::new(4, date, None).unwrap()).expect("rate");
            db.add_rate("dev", &Rate::new(6, date, None).unwrap()).expect("rate");
            db.add_employee("dev", &employee("A", "Aa", Condition::Present, 1985, 4000.0)).expect("add");

            let stats = db.group_statistics().expect("Query failed");
            assert_eq!(stats.len(), 1);
            assert_eq!(stats[0].rating_count, 2);
            assert_eq!(stats[0].average_rating, 5.0);
            assert_eq!(stats[0].employee_count, 1);
            assert_eq!(stats[0].fill_percentage(), 20.0);
        }
    }

    describe "audit log" {
        before {
            seed_group(&db, "dev", 5);
            let row = db
                .add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 4000.0))
                .expect("Failed to add");
        }

        it "records and replays an entity's history" {
            db.log_change(OperationType::Create, &row, Some("alice"), None).expect("log");
            db.log_change(OperationType::Update, &row, Some("bob"), Some("salary +500"))
                .expect("log");

            let history = db
                .entity_history(row.entity_name(), row.entity_id().unwrap())
                .expect("Query failed");
            assert_eq!(history.len(), 2);
            // newest first
            assert_eq!(history[0].operation, OperationType::Update);
            assert_eq!(history[0].changes.as_deref(), Some("salary +500"));
            assert_eq!(history[1].username.as_deref(), Some("alice"));
        }

        it "filters history by operation and username" {
            db.log_change(OperationType::Create, &row, Some("alice"), None).expect("log");
            db.log_change(OperationType::Update, &row, Some("bob"), None).expect("log");
            db.log_change(OperationType::Delete, &row, Some("alice"), None).expect("log");

            let by_user = db
                .filtered_history(&AuditQuery { username: Some("alice".into()), ..Default::default() })
                .expect("Query failed");
            assert_eq!(by_user.len(), 2);

            let deletes = db
                .filtered_history(&AuditQuery { operation: Some(OperationType::Delete), ..Default::default() })
                .expect("Query failed");
            assert_eq!(deletes.len(), 1);
            assert_eq!(deletes[0].username.as_deref(), Some("alice"));
        }

        it "an unfiltered query returns everything" {
            db.log_change(OperationType::Create, &row, None, None).expect("log");
            let all = db.filtered_history(&AuditQuery::default()).expect("Query failed");
            assert_eq!(all.len(), 1);
            assert!(all[0].username.is_none());
        }
    }

    describe "registry hydration" {
        it "loads the whole store into an in-memory registry" {
            seed_group(&db, "dev", 10);
            seed_group(&db, "ops", 10);
            db.add_employee("dev", &employee("Jan", "Kowalski", Condition::Present, 1985, 6000.0)).expect("add");

            let registry = db.load_registry().expect("Load failed");
            assert_eq!(registry.len(), 2);
            assert_eq!(registry.get("dev").unwrap().len(), 1);
            assert!(registry.get("ops").unwrap().is_empty());
        }
    }
}
