use std::{
    error::Error,
    path::Path,
    process::exit,
    str::FromStr,
    sync::{Arc, Mutex},
};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime};

use expense_tracker::{
    ExpenseInput, NewUser, PasswordHash, PaymentMethod, ValidatedPassword, create_expense,
    initialize_db,
    stores::{
        UserStore,
        sqlite::{SQLiteExpenseStore, SQLiteUserStore},
    },
    update_budget,
};

/// A utility for creating a test database for the expense tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

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
    let conn = Arc::new(Mutex::new(conn));

    println!("Creating test user...");

    let mut users = SQLiteUserStore::new(conn.clone());
    let user = users.create(NewUser {
        username: "test".to_owned(),
        email: EmailAddress::from_str("test@example.com")?,
        password_hash: PasswordHash::new(
            ValidatedPassword::new_unchecked("test"),
            PasswordHash::DEFAULT_COST,
        )?,
    })?;
    update_budget(&user, Decimal::new(20_000, 0), &mut users)?;

    println!("Creating sample expenses...");

    let mut expenses = SQLiteExpenseStore::new(conn);
    let today = OffsetDateTime::now_utc().date();

    for input in sample_expenses(today) {
        create_expense(input, &user, &mut expenses)?;
    }

    println!("Success! Log in as 'test' with the password 'test'.");

    Ok(())
}

fn sample_expenses(today: Date) -> Vec<ExpenseInput> {
    let samples = [
        (45_000, "Groceries", PaymentMethod::Cash, None, 2),
        (12_050, "Dining", PaymentMethod::Upi, Some(("cafe@okbank", "UPI1001")), 5),
        (150_000, "Rent", PaymentMethod::Upi, Some(("landlord@okaxis", "UPI1002")), 20),
        (3_000, "Transport", PaymentMethod::Cash, None, 33),
        (89_900, "Electronics", PaymentMethod::Upi, Some(("store@ybl", "UPI1003")), 41),
        (25_000, "Groceries", PaymentMethod::Cash, None, 64),
    ];

    samples
        .into_iter()
        .map(|(paise, category, payment_method, upi, days_ago)| {
            let (upi_vpa, transaction_id) = match upi {
                Some((vpa, id)) => (Some(vpa.to_owned()), Some(id.to_owned())),
                None => (None, None),
            };

            ExpenseInput {
                amount: Some(Decimal::new(paise, 2)),
                category: Some(category.to_owned()),
                expense_date: Some(today - Duration::days(days_ago)),
                payment_method: Some(payment_method),
                upi_vpa,
                transaction_id,
                payer_name: None,
                notes: None,
            }
        })
        .collect()
}
