//! # Floor Plan Seeder
//!
//! Installs the house floor plan into a Bistro database.
//!
//! ## Usage
//! ```bash
//! # Seed ./bistro.db (default)
//! cargo run -p bistro-db --bin seed
//!
//! # Specify database path and add a few demo clients
//! cargo run -p bistro-db --bin seed -- --db ./data/bistro.db --demo-clients
//! ```
//!
//! ## Floor Plan
//! - Tables 1-8: regular, four seats
//! - Table 9: VIP, six seats, exclusive view
//! - Table 10: VIP, four seats

use std::env;

use bistro_core::Client;
use bistro_db::{Database, DbConfig};

/// Demo clients: (name, phone, VIP discount)
const DEMO_CLIENTS: &[(&str, &str, Option<f64>)] = &[
    ("Ana Silva", "11999990001", None),
    ("Bruno Costa", "21988880002", None),
    ("Carla Mendes", "31977770003", Some(10.0)),
    ("Diego Rocha", "41966660004", Some(25.0)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bistro.db");
    let mut demo_clients = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo-clients" => demo_clients = true,
            "--help" | "-h" => {
                println!("Bistro Floor Plan Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./bistro.db)");
                println!("      --demo-clients  Also insert a handful of demo clients");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Bistro Floor Plan Seeder");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    match db.seed_default_tables().await? {
        0 => println!("⚠ Floor plan already present, skipping tables"),
        n => println!("✓ Inserted {} tables", n),
    }

    if demo_clients {
        if !db.clients().list().await?.is_empty() {
            println!("⚠ Database already has clients, skipping demo clients");
        } else {
            for (name, phone, discount) in DEMO_CLIENTS {
                let client = match discount {
                    Some(pct) => Client::vip(*name, *phone, *pct)?,
                    None => Client::regular(*name, *phone)?,
                };
                let id = db.clients().save(&client).await?;
                println!("  + client #{} {}", id, name);
            }
        }
    }

    println!();
    for table in db.tables().list().await? {
        println!(
            "  table {:>2}  seats {:>2}  {}{}",
            table.number(),
            table.capacity(),
            if table.is_vip() { "VIP" } else { "   " },
            if table.has_exclusive_view() { " (view)" } else { "" }
        );
    }

    db.close().await;
    Ok(())
}
