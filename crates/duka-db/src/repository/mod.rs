//! # Repository Module
//!
//! One repository per aggregate. Pool-level methods take `&self`;
//! functions that must join the caller's transaction are associated
//! functions taking `&mut SqliteConnection`.
//!
//! ```text
//! Database::products()                           → pool-level reads/writes
//! ProductRepository::adjust_quantity(&mut tx, …) → inside a transaction
//! ```

pub mod alert;
pub mod analytics;
pub mod expense;
pub mod order;
pub mod product;
pub mod sale;
pub mod shop;
pub mod supplier;
pub mod sync;
pub mod user;

pub use alert::AlertRepository;
pub use analytics::AnalyticsRepository;
pub use expense::ExpenseRepository;
pub use order::OrderRepository;
pub use product::{ProductRepository, StockLevel};
pub use sale::SaleRepository;
pub use shop::{ShopDeletion, ShopRepository};
pub use supplier::SupplierRepository;
pub use sync::SyncRecordRepository;
pub use user::UserRepository;
