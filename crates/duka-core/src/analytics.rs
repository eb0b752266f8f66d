//! # Analytics Math
//!
//! Reporting windows and the aggregation shapes returned by the engine's
//! analytics operations. Row fetching happens in `duka-db`; bucketing
//! happens here so it can be tested without a database.
//!
//! ## Windows
//! ```text
//!   Period::Last7Days    now - 7d   ─────────────► now
//!   Period::Last30Days   now - 30d  ─────────────► now
//!   Period::LastYear     now - 365d ─────────────► now
//!
//!   Month-over-month:    [previous month start, current month start)
//!                        [current month start, now]
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Alert, Sale};

// =============================================================================
// Period
// =============================================================================

/// Look-back window of the sales chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Period {
    #[default]
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "365days")]
    LastYear,
}

impl Period {
    /// Parses a query-string period. Unknown values fall back to a year.
    pub fn from_query(value: &str) -> Self {
        match value {
            "7days" => Period::Last7Days,
            "30days" => Period::Last30Days,
            _ => Period::LastYear,
        }
    }

    pub const fn days(&self) -> i64 {
        match self {
            Period::Last7Days => 7,
            Period::Last30Days => 30,
            Period::LastYear => 365,
        }
    }

    /// Inclusive start of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

// =============================================================================
// Report Shapes
// =============================================================================

/// Sales total of one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_cents: i64,
}

/// Units sold of one product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub total_sold: i64,
}

/// Expense total of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryTotal {
    pub category: String,
    pub total_cents: i64,
}

/// Platform-wide figures for administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdminStatistics {
    pub total_revenue_cents: i64,
    pub total_expenses_cents: i64,
    pub current_month_cents: i64,
    pub previous_month_cents: i64,
    /// Month-over-month revenue change in percent.
    pub growth_rate: f64,
}

/// Figures shown on a vendor's home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VendorDashboard {
    pub shop_count: i64,
    pub total_sales_cents: i64,
    pub today_sales_cents: i64,
    pub product_count: i64,
    pub low_stock_count: i64,
    pub recent_sales: Vec<Sale>,
    pub unread_alerts: Vec<Alert>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Buckets `(created_at, total_cents)` pairs by UTC day, oldest first.
/// Days without sales are omitted.
pub fn daily_totals<I>(sales: I) -> Vec<DailyTotal>
where
    I: IntoIterator<Item = (DateTime<Utc>, i64)>,
{
    let mut buckets: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    for (created_at, total_cents) in sales {
        *buckets.entry(created_at.date_naive()).or_default() += Money::from_cents(total_cents);
    }

    buckets
        .into_iter()
        .map(|(date, total)| DailyTotal {
            date,
            total_cents: total.cents(),
        })
        .collect()
}

/// Start of the month containing `now`, and of the month before it (UTC).
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let current = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let (year, month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    let previous = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(current);
    (current, previous)
}

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_period_from_query() {
        assert_eq!(Period::from_query("7days"), Period::Last7Days);
        assert_eq!(Period::from_query("30days"), Period::Last30Days);
        assert_eq!(Period::from_query("forever"), Period::LastYear);
        assert_eq!(Period::Last30Days.start(at(2026, 3, 31, 0)), at(2026, 3, 1, 0));
    }

    #[test]
    fn test_daily_totals_groups_by_day() {
        let totals = daily_totals(vec![
            (at(2026, 3, 2, 9), 500),
            (at(2026, 3, 1, 23), 1_000),
            (at(2026, 3, 2, 18), 250),
        ]);

        assert_eq!(
            totals,
            vec![
                DailyTotal { date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(), total_cents: 1_000 },
                DailyTotal { date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), total_cents: 750 },
            ]
        );
    }

    #[test]
    fn test_month_bounds_wrap_year() {
        let (current, previous) = month_bounds(at(2026, 1, 15, 10));
        assert_eq!(current, at(2026, 1, 1, 0));
        assert_eq!(previous, at(2025, 12, 1, 0));

        let (current, previous) = month_bounds(at(2026, 3, 31, 23));
        assert_eq!(current, at(2026, 3, 1, 0));
        assert_eq!(previous, at(2026, 2, 1, 0));
    }

    #[test]
    fn test_start_of_day() {
        assert_eq!(start_of_day(at(2026, 3, 2, 17)), at(2026, 3, 2, 0));
    }
}
