//! # Reference Numbers
//!
//! Human-readable business numbers for sales, orders and payments.
//!
//! ## Format
//! ```text
//!   SALE-260301-9F3A0C1B
//!   ──── ────── ────────
//!    │     │       └── 32 random bits (uuid v4)
//!    │     └────────── UTC date of the operation (YYMMDD)
//!    └──────────────── prefix (SALE, ORD, PAY)
//! ```
//! Randomness alone does not make a number unique. The store holds a UNIQUE
//! constraint and the engine regenerates on collision.

use chrono::{DateTime, Utc};
use std::fmt::Debug;
use uuid::Uuid;

/// Produces candidate business numbers.
pub trait ReferenceGenerator: Send + Sync + Debug {
    fn generate(&self, prefix: &str, at: DateTime<Utc>) -> String;
}

/// `{PREFIX}-{YYMMDD}-{8 hex}` with random hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReference;

impl ReferenceGenerator for RandomReference {
    fn generate(&self, prefix: &str, at: DateTime<Utc>) -> String {
        let entropy = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}",
            prefix,
            at.format("%y%m%d"),
            entropy[..8].to_ascii_uppercase()
        )
    }
}

/// New UUID v4 primary key.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_random_reference_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let number = RandomReference.generate("SALE", at);

        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "SALE");
        assert_eq!(parts[1], "260301");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_consecutive_references_differ() {
        let at = Utc::now();
        assert_ne!(RandomReference.generate("ORD", at), RandomReference.generate("ORD", at));
    }
}
