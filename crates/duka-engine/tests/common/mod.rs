//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use duka_core::{
    ActingUser, FixedClock, NewProduct, NewShop, NewUser, Product, RandomReference, ReferenceGenerator, Role,
    Shop,
};
use duka_db::{Database, DbConfig};
use duka_engine::Engine;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap()
}

pub async fn engine() -> (Engine, Arc<FixedClock>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let clock = Arc::new(FixedClock::new(start_time()));
    let engine = Engine::new(db).with_clock(clock.clone());
    (engine, clock)
}

pub async fn vendor(engine: &Engine, phone: &str) -> ActingUser {
    let user = engine
        .users()
        .register_user(NewUser {
            phone: phone.to_string(),
            name: "Mama Test".to_string(),
            email: None,
            role: Role::Vendor,
            language: None,
        })
        .await
        .unwrap();
    ActingUser::vendor(user.id)
}

pub async fn admin(engine: &Engine) -> ActingUser {
    let user = engine
        .users()
        .register_user(NewUser {
            phone: "+255700999999".to_string(),
            name: "Msimamizi".to_string(),
            email: None,
            role: Role::Admin,
            language: Some("en".to_string()),
        })
        .await
        .unwrap();
    ActingUser::admin(user.id)
}

pub async fn shop(engine: &Engine, owner: &ActingUser, name: &str) -> Shop {
    engine
        .catalog()
        .create_shop(
            owner,
            NewShop {
                name: name.to_string(),
                ..NewShop::default()
            },
        )
        .await
        .unwrap()
}

pub async fn product(
    engine: &Engine,
    owner: &ActingUser,
    shop: &Shop,
    name: &str,
    price_cents: i64,
    quantity: i64,
    reorder_level: i64,
) -> Product {
    engine
        .catalog()
        .add_product(
            owner,
            NewProduct {
                shop_id: shop.id.clone(),
                name: name.to_string(),
                price_cents,
                quantity,
                reorder_level: Some(reorder_level),
                ..NewProduct::default()
            },
        )
        .await
        .unwrap()
}

pub async fn quantity_of(engine: &Engine, product_id: &str) -> i64 {
    engine
        .db()
        .products()
        .get_by_id(product_id)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

/// Hands out sale numbers from a script; other prefixes are random.
/// The last scripted number repeats once the script runs out.
#[derive(Debug)]
pub struct ScriptedSaleNumbers {
    numbers: Mutex<VecDeque<String>>,
    last: Mutex<String>,
}

impl ScriptedSaleNumbers {
    pub fn new(numbers: &[&str]) -> Arc<Self> {
        Arc::new(ScriptedSaleNumbers {
            numbers: Mutex::new(numbers.iter().map(|n| n.to_string()).collect()),
            last: Mutex::new(String::new()),
        })
    }
}

impl ReferenceGenerator for ScriptedSaleNumbers {
    fn generate(&self, prefix: &str, at: DateTime<Utc>) -> String {
        if prefix != "SALE" {
            return RandomReference.generate(prefix, at);
        }
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.numbers.lock().unwrap().pop_front() {
            *last = next;
        }
        last.clone()
    }
}
