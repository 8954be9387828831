//! # Seed Data Generator
//!
//! Populates a development database with a water-park catalog.
//!
//! ## Usage
//! ```bash
//! # 40 lockers (default)
//! cargo run -p splash-db --bin seed
//!
//! # Custom locker count and database path
//! cargo run -p splash-db --bin seed -- --lockers 120 --db ./data/splash.db
//! ```
//!
//! ## Generated Catalog
//! - Ticket types: adult, child, senior day passes
//! - Costumes: every category in every size, 25 units each
//! - Lockers: `L-001` .. `L-NNN`

use splash_core::Money;
use splash_db::{Database, DbConfig, NewCostume, NewLocker};
use std::env;

const TICKETS: &[(&str, i64)] = &[
    ("Adult Day Pass", 50_000),
    ("Child Day Pass", 30_000),
    ("Senior Day Pass", 25_000),
];

/// (category, rental price, refund value) in paise.
const COSTUMES: &[(&str, i64, i64)] = &[
    ("Swimsuit", 15_000, 5_000),
    ("Swim Shorts", 10_000, 4_000),
    ("Float Vest", 8_000, 8_000),
    ("Swim Cap", 3_000, 1_000),
];

const SIZES: &[&str] = &["XS", "S", "M", "L", "XL"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut lockers: usize = 40;
    let mut db_path = String::from("./splash_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--lockers" | "-l" => {
                if i + 1 < args.len() {
                    lockers = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Splash POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --lockers <N>  Number of lockers to create (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./splash_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Splash POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.inventory().list_costumes().await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} costumes", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    for (name, price) in TICKETS {
        db.tickets().insert(name, Money::from_paise(*price)).await?;
    }
    println!("✓ {} ticket types", TICKETS.len());

    let mut costume_count = 0;
    for (category, price, refund) in COSTUMES {
        for size in SIZES {
            let new = NewCostume {
                category: category.to_string(),
                size: size.to_string(),
                quantity_available: 25,
                unit_price: Money::from_paise(*price),
                unit_refund_value: Money::from_paise(*refund),
            };
            if let Err(e) = db.inventory().insert_costume(&new).await {
                eprintln!("Failed to insert {} ({}): {}", category, size, e);
                continue;
            }
            costume_count += 1;
        }
    }
    println!("✓ {} costume lines", costume_count);

    for n in 1..=lockers {
        let new = NewLocker {
            locker_no: format!("L-{:03}", n),
            unit_price: Money::from_paise(10_000),
            unit_refund_value: Money::from_paise(5_000),
        };
        if let Err(e) = db.inventory().insert_locker(&new).await {
            eprintln!("Failed to insert {}: {}", new.locker_no, e);
        }
    }
    println!("✓ {} lockers", lockers);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
