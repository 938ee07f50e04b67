use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Month, OffsetDateTime};

use fintrack::{
    BudgetPeriod, Transaction, TransactionType, create_transaction, initialize_db, upsert_budget,
};

/// A utility for creating a database filled with sample data for fintrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of months of transactions to generate, ending with the current month.
    #[arg(long, default_value_t = 12)]
    months: u8,
}

/// (day of month, amount, description, type, category ID)
type SampleTransaction = (u8, f64, &'static str, TransactionType, &'static str);

const MONTHLY_TRANSACTIONS: [SampleTransaction; 10] = [
    (1, 5200.0, "Salary", TransactionType::Income, "salary"),
    (2, 1850.0, "Rent", TransactionType::Expense, "housing"),
    (4, 142.35, "Supermarket", TransactionType::Expense, "food"),
    (6, 64.0, "Fuel", TransactionType::Expense, "transportation"),
    (9, 38.5, "Thai takeaway", TransactionType::Expense, "food"),
    (12, 129.99, "Internet and phone", TransactionType::Expense, "bills"),
    (15, 22.99, "Streaming subscriptions", TransactionType::Expense, "entertainment"),
    (18, 156.8, "Supermarket", TransactionType::Expense, "food"),
    (21, 89.95, "New shoes", TransactionType::Expense, "shopping"),
    (26, 45.0, "Pharmacy", TransactionType::Expense, "healthcare"),
];

const CURRENT_BUDGETS: [(&str, f64); 5] = [
    ("Housing", 1900.0),
    ("Food & Dining", 400.0),
    ("Transportation", 120.0),
    ("Entertainment", 50.0),
    ("Shopping", 75.0),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let today = OffsetDateTime::now_utc().date();
    let mut year = today.year();
    let mut month = today.month();
    let mut transaction_count = 0;

    println!("Creating sample transactions...");

    for month_index in 0..args.months {
        for (day, amount, description, transaction_type, category) in MONTHLY_TRANSACTIONS {
            let date = Date::from_calendar_date(year, month, day)?;

            if date > today {
                continue;
            }

            // Vary the amounts a little so the charts are not flat.
            let amount = amount * (1.0 + f64::from(month_index % 4) * 0.05);
            let transaction = Transaction::build(amount, date, description, transaction_type)
                .category(Some(category.to_owned()))
                .validate()?;

            create_transaction(&transaction, &conn)?;
            transaction_count += 1;
        }

        if month_index % 3 == 0 {
            let date = Date::from_calendar_date(year, month, 20)?;

            if date <= today {
                let transaction =
                    Transaction::build(750.0, date, "Website project", TransactionType::Income)
                        .category(Some("freelance".to_owned()))
                        .validate()?;
                create_transaction(&transaction, &conn)?;
                transaction_count += 1;
            }
        }

        if month == Month::January {
            year -= 1;
        }
        month = month.previous();
    }

    println!("Created {transaction_count} transactions.");
    println!("Creating budgets for the current month...");

    let period = BudgetPeriod::containing(today);

    for (category_name, amount) in CURRENT_BUDGETS {
        upsert_budget(category_name, amount, period, &conn)?;
    }

    println!("Success!");

    Ok(())
}
