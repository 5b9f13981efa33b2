use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffbook::db::Database;
use staffbook::dispatch::Dispatcher;
use staffbook::error::Error;
use staffbook::export;
use staffbook::models::{
    Condition, Employee, EmployeeFilter, Identified, OperationType, Rate, SortDirection, SortField,
};

#[derive(Parser)]
#[command(name = "staffbook")]
#[command(about = "Employee and group management over SQLite")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply pending migrations
    Init,
    /// Create a group (updates the capacity if the name already exists)
    AddGroup {
        name: String,
        #[arg(long, default_value = "30")]
        capacity: usize,
    },
    /// Add an employee to a group
    AddEmployee {
        group: String,
        first_name: String,
        last_name: String,
        #[arg(long, default_value = "present")]
        condition: String,
        #[arg(long)]
        birth_year: i32,
        #[arg(long)]
        salary: f64,
    },
    /// List group names, or the members of one group
    List {
        group: Option<String>,
    },
    /// Change an employee's condition
    SetCondition {
        id: i64,
        condition: String,
    },
    /// Raise an employee's salary by an amount
    RaiseSalary {
        id: i64,
        amount: f64,
    },
    /// Soft-delete an employee
    Remove {
        id: i64,
    },
    /// Restore a soft-deleted employee
    Restore {
        id: i64,
    },
    /// Filter and page through employees
    Filter {
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        min_salary: Option<f64>,
        #[arg(long)]
        max_salary: Option<f64>,
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        year_from: Option<i32>,
        #[arg(long)]
        year_to: Option<i32>,
        #[arg(long)]
        group: Option<String>,
        /// Sort key: last-name, first-name, salary, birth-year, condition, group-name
        #[arg(long, default_value = "last-name")]
        sort: String,
        #[arg(long)]
        descending: bool,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        page_size: u32,
    },
    /// Employee and group statistics
    Stats,
    /// Record a rating for a group
    Rate {
        group: String,
        value: u8,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Show the audit history of an employee
    History {
        id: i64,
    },
    /// Export every group to CSV
    ExportCsv {
        output: PathBuf,
    },
    /// Export every group to JSON
    ExportJson {
        output: PathBuf,
    },
    /// Export the per-group statistics report to CSV
    ExportStats {
        output: PathBuf,
    },
    /// Import groups and employees from a JSON export
    ImportJson {
        input: PathBuf,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "staffbook=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn parse_condition(input: &str) -> anyhow::Result<Condition> {
    let normalized = input.to_uppercase().replace('-', "_");
    Condition::from_str(&normalized)
        .or_else(|| Condition::from_storage_token(input).ok())
        .ok_or_else(|| anyhow::anyhow!("unknown condition: {input}"))
}

fn current_user() -> Option<String> {
    std::env::var("USER").ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let db = match &cli.db {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    let dispatcher = Dispatcher::new(db.clone());

    match cli.command {
        Commands::Init => {
            println!("Database ready");
        }
        Commands::AddGroup { name, capacity } => {
            let row = dispatcher
                .submit(move |db| db.create_group(&name, capacity))
                .await?;
            db.log_change(OperationType::Create, &row, current_user().as_deref(), None)?;
            println!("Group {} (capacity {})", row.name, row.max_capacity);
        }
        Commands::AddEmployee {
            group,
            first_name,
            last_name,
            condition,
            birth_year,
            salary,
        } => {
            let condition = parse_condition(&condition)?;
            let employee = Employee::new(first_name, last_name, condition, birth_year, salary);
            employee.validate()?;
            let row = dispatcher
                .submit(move |db| db.add_employee(&group, &employee))
                .await?;
            db.log_change(OperationType::Create, &row, current_user().as_deref(), None)?;
            println!(
                "Added {} {} (id {})",
                row.employee.first_name,
                row.employee.last_name,
                row.id.unwrap_or_default()
            );
        }
        Commands::List { group: None } => {
            let names = dispatcher.submit(|db| db.list_group_names()).await?;
            for name in names {
                println!("{name}");
            }
        }
        Commands::List { group: Some(name) } => {
            let rows = dispatcher
                .submit(move |db| db.employees_in_group(&name))
                .await?;
            for row in rows {
                println!(
                    "{:>5}  {} {}  {}  {}  {:.2}",
                    row.id.unwrap_or_default(),
                    row.employee.first_name,
                    row.employee.last_name,
                    row.employee.condition.display_name(),
                    row.employee.birth_year,
                    row.employee.salary,
                );
            }
        }
        Commands::SetCondition { id, condition } => {
            let condition = parse_condition(&condition)?;
            let changed = dispatcher
                .submit(move |db| db.set_condition(id, condition))
                .await?;
            if !changed {
                anyhow::bail!("no employee with id {id}");
            }
            if let Some(row) = db.get_employee(id)? {
                db.log_change(
                    OperationType::Update,
                    &row,
                    current_user().as_deref(),
                    Some(&format!("condition -> {}", condition.display_name())),
                )?;
            }
            println!("Condition updated");
        }
        Commands::RaiseSalary { id, amount } => {
            let changed = dispatcher
                .submit(move |db| db.raise_salary(id, amount))
                .await?;
            if !changed {
                anyhow::bail!("no employee with id {id}");
            }
            if let Some(row) = db.get_employee(id)? {
                db.log_change(
                    OperationType::Update,
                    &row,
                    current_user().as_deref(),
                    Some(&format!("salary +{amount:.2}")),
                )?;
            }
            println!("Salary updated");
        }
        Commands::Remove { id } => {
            let row = db
                .get_employee(id)?
                .ok_or_else(|| anyhow::anyhow!("no employee with id {id}"))?;
            let removed = dispatcher.submit(move |db| db.delete_employee(id)).await?;
            if removed {
                db.log_change(OperationType::Delete, &row, current_user().as_deref(), None)?;
                println!("Removed employee {id}");
            }
        }
        Commands::Restore { id } => {
            let restored = dispatcher.submit(move |db| db.restore_employee(id)).await?;
            if !restored {
                anyhow::bail!("no deleted employee with id {id}");
            }
            println!("Restored employee {id}");
        }
        Commands::Filter {
            last_name,
            min_salary,
            max_salary,
            condition,
            year_from,
            year_to,
            group,
            sort,
            descending,
            page,
            page_size,
        } => {
            let mut filter = EmployeeFilter::new()
                .sort_by(SortField::from_key(&sort))
                .page(page)
                .page_size(page_size);
            if descending {
                filter = filter.sort_direction(SortDirection::Descending);
            }
            filter.last_name = last_name;
            filter.min_salary = min_salary;
            filter.max_salary = max_salary;
            filter.birth_year_from = year_from;
            filter.birth_year_to = year_to;
            filter.group_name = group;
            if let Some(raw) = condition {
                filter.condition = Some(parse_condition(&raw)?);
            }

            let result = dispatcher
                .submit(move |db| db.filter_employees(&filter))
                .await?;
            for row in &result.data {
                println!(
                    "{:>5}  {} {}  {}  {:.2}  [{}]",
                    row.id.unwrap_or_default(),
                    row.employee.first_name,
                    row.employee.last_name,
                    row.employee.condition.display_name(),
                    row.employee.salary,
                    row.group_name,
                );
            }
            println!(
                "Page {}/{} ({} total)",
                result.current_page,
                result.total_pages(),
                result.total_count
            );
        }
        Commands::Stats => {
            let stats = dispatcher.submit(|db| db.employee_statistics()).await?;
            println!(
                "{} employees, salary avg {:.2} (min {:.2}, max {:.2})",
                stats.count, stats.average_salary, stats.min_salary, stats.max_salary
            );
            for (condition, count) in db.count_by_condition()? {
                println!("  {}: {}", condition.display_name(), count);
            }
            for group in db.group_statistics()? {
                println!(
                    "  {}: {} members, avg salary {:.2}, rating {:.2} ({} ratings), {:.0}% full",
                    group.group_name,
                    group.employee_count,
                    group.average_salary,
                    group.average_rating,
                    group.rating_count,
                    group.fill_percentage(),
                );
            }
        }
        Commands::Rate {
            group,
            value,
            comment,
        } => {
            let rate = Rate::new(value, chrono::Utc::now().date_naive(), comment)?;
            let stored = dispatcher
                .submit(move |db| db.add_rate(&group, &rate))
                .await?;
            println!("Rating {} recorded (id {})", stored.value, stored.id.unwrap_or_default());
        }
        Commands::History { id } => {
            let row = db
                .get_employee(id)?
                .ok_or_else(|| anyhow::anyhow!("no employee with id {id}"))?;
            for entry in db.entity_history(row.entity_name(), id)? {
                println!(
                    "{}  {}  {}  {}",
                    entry.timestamp.to_rfc3339(),
                    entry.operation.as_str(),
                    entry.username.as_deref().unwrap_or("-"),
                    entry.changes.as_deref().unwrap_or("-"),
                );
            }
        }
        Commands::ExportCsv { output } => {
            let registry = dispatcher.submit(|db| db.load_registry()).await?;
            std::fs::write(&output, export::registry_to_csv(&registry))?;
            println!("Wrote {}", output.display());
        }
        Commands::ExportJson { output } => {
            let registry = dispatcher.submit(|db| db.load_registry()).await?;
            std::fs::write(&output, export::registry_to_json(&registry))?;
            println!("Wrote {}", output.display());
        }
        Commands::ExportStats { output } => {
            let stats = dispatcher.submit(|db| db.group_statistics()).await?;
            std::fs::write(&output, export::group_statistics_to_csv(&stats))?;
            println!("Wrote {}", output.display());
        }
        Commands::ImportJson { input } => {
            let text = std::fs::read_to_string(&input)?;
            let registry = export::import_registry_json(&text)?;
            let mut imported = 0usize;
            for name in registry.list_group_names() {
                let Some(group) = registry.get(&name) else {
                    continue;
                };
                db.create_group(group.name(), group.max_capacity())?;
                for employee in group.employees() {
                    match db.add_employee(group.name(), employee) {
                        Ok(_) => imported += 1,
                        Err(Error::DuplicateEmployee(first, last)) => {
                            tracing::warn!("Skipping duplicate {} {}", first, last);
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
            }
            println!("Imported {} employees", imported);
        }
    }

    Ok(())
}
