use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::Duration;

use ledgerly::{
    Category, DEFAULT_TIMEZONE, Email, Frequency, InvestmentDetails, NewBudget, NewInvestment,
    PasswordHash, Role, Transaction, TransactionType, UserID, ValidatedPassword,
    create_budget, create_contact_message, create_investment, create_transaction, create_user,
    get_categories_for_user, initialize_db, local_now,
};

/// The password for the demo accounts.
const DEMO_PASSWORD: &str = "correct horse battery staple";

/// A utility for creating a test database for ledgerly.
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

    println!("Creating test users...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new(DEMO_PASSWORD, &[])?,
        PasswordHash::DEFAULT_COST,
    )?;

    let demo = create_user(
        "demo",
        &Email::new("demo@example.com")?,
        password_hash.clone(),
        Role::User,
        &conn,
    )?;
    create_user(
        "admin",
        &Email::new("admin@example.com")?,
        password_hash,
        Role::Admin,
        &conn,
    )?;

    println!("Creating transactions...");
    create_demo_transactions(demo.id, &conn)?;

    println!("Creating budget and investments...");
    create_demo_budget_and_investments(demo.id, &conn)?;

    create_contact_message(
        "Visitor",
        "visitor@example.com",
        "Can I export my transactions to a spreadsheet?",
        local_now(DEFAULT_TIMEZONE)?,
        &conn,
    )?;

    println!("Success! Log in as demo@example.com or admin@example.com with the password \"{DEMO_PASSWORD}\".");

    Ok(())
}

fn find_category(categories: &[Category], name: &str) -> Option<i64> {
    categories
        .iter()
        .find(|category| category.name == name)
        .map(|category| category.id)
}

fn create_demo_transactions(user_id: UserID, conn: &Connection) -> Result<(), Box<dyn Error>> {
    let now = local_now(DEFAULT_TIMEZONE)?;
    let categories = get_categories_for_user(user_id, conn)?;
    let salary = find_category(&categories, "Salary");
    let food = find_category(&categories, "Food");
    let travel = find_category(&categories, "Travel");

    for months_ago in 0..6 {
        let date = now - Duration::days(30 * months_ago);

        create_transaction(
            Transaction::build(85_000.0, TransactionType::Income, date)
                .category_id(salary)
                .note(Some("Monthly salary")),
            user_id,
            conn,
        )?;
        create_transaction(
            Transaction::build(12_500.0, TransactionType::Expense, date)
                .category_id(food)
                .note(Some("Groceries")),
            user_id,
            conn,
        )?;
        create_transaction(
            Transaction::build(3_200.0 + 400.0 * months_ago as f64, TransactionType::Expense, date)
                .category_id(travel)
                .note(Some("Bus fare")),
            user_id,
            conn,
        )?;
    }

    // Due on the first request after the database is created.
    create_transaction(
        Transaction::build(
            25_000.0,
            TransactionType::Expense,
            now - Duration::days(31),
        )
        .category_id(find_category(&categories, "Rent"))
        .note(Some("Flat rent"))
        .recurring(Some(Frequency::Monthly)),
        user_id,
        conn,
    )?;

    Ok(())
}

fn create_demo_budget_and_investments(
    user_id: UserID,
    conn: &Connection,
) -> Result<(), Box<dyn Error>> {
    let now = local_now(DEFAULT_TIMEZONE)?;
    let categories = get_categories_for_user(user_id, conn)?;

    if let Some(food) = find_category(&categories, "Food") {
        create_budget(
            NewBudget {
                name: "Groceries".to_owned(),
                amount: 15_000.0,
                period: "monthly".to_owned(),
                start_date: None,
                end_date: None,
                category_id: food,
            },
            user_id,
            now,
            conn,
        )?;
    }

    let investments = [
        NewInvestment {
            name: "Bank FD".to_owned(),
            notes: Some("One year term".to_owned()),
            details: InvestmentDetails::FixedDeposit {
                amount: 100_000.0,
                interest_rate: 8.5,
                maturity_date: Some((now + Duration::days(365)).date()),
            },
        },
        NewInvestment {
            name: "Growth Fund".to_owned(),
            notes: None,
            details: InvestmentDetails::MutualFund {
                units: 500.0,
                nav: 10.0,
                current_value: 5_600.0,
            },
        },
        NewInvestment {
            name: "NABIL".to_owned(),
            notes: None,
            details: InvestmentDetails::Share {
                quantity: 20.0,
                price: 550.0,
                total_value: 11_800.0,
            },
        },
    ];

    for investment in investments {
        create_investment(investment, user_id, now, conn)?;
    }

    Ok(())
}
