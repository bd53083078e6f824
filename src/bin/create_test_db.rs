use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    account::create_account,
    calendar::first_day_of_month,
    category::{
        BudgetBucket, CategoryKind, CategoryName, Classification, NewCategory, create_category,
    },
    goal::{NewGoal, create_goal},
    initialize_db,
    installment::{NewInstallmentPlan, create_installment_plan},
    ledger::{LedgerEntry, create_ledger_entry},
    recurrence::{Frequency, NewRecurringTransaction, create_recurring_transaction},
};

/// A utility for creating a test database for finance_tracker.
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

    println!("Creating categories...");
    let mut categories = Vec::new();
    for (name, kind, classification, bucket) in [
        (
            "Salary",
            CategoryKind::Income,
            Classification::A,
            BudgetBucket::NotApplicable,
        ),
        (
            "Rent",
            CategoryKind::Expense,
            Classification::A,
            BudgetBucket::Essentials,
        ),
        (
            "Eating out",
            CategoryKind::Expense,
            Classification::C,
            BudgetBucket::Lifestyle,
        ),
        (
            "Emergency fund",
            CategoryKind::Expense,
            Classification::B,
            BudgetBucket::Savings,
        ),
    ] {
        let category = create_category(
            NewCategory::new(CategoryName::new(name)?)
                .kind(kind)
                .classification(classification)
                .bucket(bucket),
            &conn,
        )?;
        categories.push(category.id);
    }
    let [salary, rent, eating_out, emergency_fund] = categories[..] else {
        return Err("expected four categories".into());
    };

    println!("Creating accounts...");
    let checking = create_account("Checking", &conn)?.id;
    let credit_card = create_account("Credit card", &conn)?.id;

    let today = OffsetDateTime::now_utc().date();
    let this_month = first_day_of_month(today);

    println!("Creating entries...");
    for (category_id, amount, days_ago, description) in [
        (salary, Decimal::new(520000, 2), 40, "Salary"),
        (salary, Decimal::new(520000, 2), 10, "Salary"),
        (eating_out, Decimal::new(4850, 2), 8, "Pizza"),
        (emergency_fund, Decimal::new(50000, 2), 5, "Monthly saving"),
    ] {
        create_ledger_entry(
            LedgerEntry::build(
                category_id,
                checking,
                amount,
                today - Duration::days(days_ago),
            )
            .description(description),
            &conn,
        )?;
    }

    println!("Creating installment plan...");
    create_installment_plan(
        NewInstallmentPlan {
            description: "Laptop".to_owned(),
            total_amount: Decimal::new(179999, 2),
            installment_count: 6,
            first_date: this_month,
            category_id: eating_out,
            account_id: credit_card,
        },
        &conn,
    )?;

    println!("Creating recurring transaction...");
    create_recurring_transaction(
        NewRecurringTransaction {
            category_id: rent,
            account_id: checking,
            amount: Decimal::new(180000, 2),
            description: "Rent".to_owned(),
            frequency: Frequency::Monthly,
            start_date: this_month,
            end_date: None,
        },
        &conn,
    )?;

    println!("Creating goal...");
    create_goal(
        NewGoal {
            name: "Emergency fund".to_owned(),
            target_amount: Decimal::new(1000000, 2),
            target_date: today + Duration::days(365),
            linked_category_id: emergency_fund,
            notes: Some("Six months of expenses".to_owned()),
        },
        &conn,
    )?;

    println!("Success! Run generate_recurrences to create the rent entries.");

    Ok(())
}
