//! # Seed Data Generator
//!
//! Populates a development database with an administrator, a vendor, one
//! shop and a small catalog of everyday products.
//!
//! ## Usage
//! ```bash
//! # Seed ./duka_dev.db
//! cargo run -p duka-db --bin seed
//!
//! # Specify database path
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//! ```
//!
//! Log output honours `RUST_LOG` (default `info,duka=debug,sqlx=warn`).

use chrono::Utc;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use duka_core::{Product, Role, Shop, User, DEFAULT_LANGUAGE};
use duka_db::{Database, DbConfig};

/// `(name, category, unit, price_cents, cost_cents, quantity, reorder_level)`
const CATALOG: &[(&str, &str, &str, i64, i64, i64, i64)] = &[
    ("Unga wa Sembe 2kg", "Vyakula", "pcs", 4_500, 3_800, 40, 10),
    ("Mchele 1kg", "Vyakula", "kg", 3_200, 2_600, 60, 15),
    ("Sukari 1kg", "Vyakula", "kg", 3_000, 2_500, 8, 10),
    ("Mafuta ya Kupikia 1L", "Vyakula", "pcs", 6_500, 5_600, 25, 5),
    ("Chumvi 500g", "Vyakula", "pcs", 800, 500, 50, 10),
    ("Maji ya Kunywa 500ml", "Vinywaji", "pcs", 700, 450, 120, 24),
    ("Soda 350ml", "Vinywaji", "pcs", 1_000, 750, 48, 24),
    ("Sabuni ya Kufulia", "Usafi", "pcs", 2_000, 1_500, 30, 10),
    ("Dawa ya Meno", "Usafi", "pcs", 2_500, 1_900, 4, 5),
    ("Kiberiti", "Nyumbani", "pcs", 200, 120, 200, 50),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,duka=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./duka_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Duka POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./duka_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    if !db.users().list().await?.is_empty() {
        warn!("Database already has users, skipping seed");
        return Ok(());
    }

    let now = Utc::now();

    let admin = User {
        id: Uuid::new_v4().to_string(),
        phone: "+255700000001".to_string(),
        name: "Msimamizi".to_string(),
        email: Some("admin@duka.local".to_string()),
        role: Role::Admin,
        is_active: true,
        language: DEFAULT_LANGUAGE.to_string(),
        created_at: now,
    };
    let vendor = User {
        id: Uuid::new_v4().to_string(),
        phone: "+255700000002".to_string(),
        name: "Mama Neema".to_string(),
        email: None,
        role: Role::Vendor,
        is_active: true,
        language: DEFAULT_LANGUAGE.to_string(),
        created_at: now,
    };
    db.users().insert(&admin).await?;
    db.users().insert(&vendor).await?;
    info!(admin = %admin.id, vendor = %vendor.id, "Users created");

    let shop = Shop {
        id: Uuid::new_v4().to_string(),
        owner_id: vendor.id.clone(),
        name: "Duka la Neema".to_string(),
        category: Some("Rejareja".to_string()),
        location: Some("Kariakoo, Dar es Salaam".to_string()),
        description: None,
        is_active: true,
        created_at: now,
    };
    db.shops().insert(&shop).await?;

    let mut inserted = 0;
    for (idx, (name, category, unit, price, cost, quantity, reorder)) in CATALOG.iter().enumerate() {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            shop_id: shop.id.clone(),
            name: name.to_string(),
            description: None,
            price_cents: *price,
            cost_cents: Some(*cost),
            quantity: *quantity,
            unit: unit.to_string(),
            sku: Some(format!("SEED-{:04}", idx + 1)),
            barcode: None,
            category: Some(category.to_string()),
            expiry_date: None,
            reorder_level: *reorder,
            is_active: true,
            created_at: now,
            updated_at: now,
            version: 1,
        };

        if let Err(e) = db.products().insert(&product).await {
            warn!(name = %product.name, error = %e, "Failed to insert product");
            continue;
        }
        inserted += 1;
    }

    info!(shop = %shop.id, products = inserted, "Seed complete");
    db.close().await;

    Ok(())
}
