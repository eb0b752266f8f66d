//! # Analytics
//!
//! Read-only reports over sales and expenses, scoped by role: an
//! administrator reports over the whole platform, a vendor over their own
//! shops.
//!
//! ## Reports
//! ```text
//! sales_by_day(period)   daily totals since period start, oldest first
//! top_products(limit)    units sold per product name, best first
//! admin_statistics()     revenue, expenses, this month vs last month
//! vendor_dashboard()     counts, today's sales, recent sales, unread alerts
//! ```

use tracing::debug;

use crate::error::EngineResult;
use crate::{owner_scope, Engine};
use duka_core::analytics::{
    daily_totals, month_bounds, start_of_day, AdminStatistics, DailyTotal, Period, TopProduct,
    VendorDashboard,
};
use duka_core::{ActingUser, Money};

/// Default number of best sellers.
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;

const DASHBOARD_RECENT_SALES: u32 = 10;
const DASHBOARD_UNREAD_ALERTS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Analytics<'a> {
    engine: &'a Engine,
}

impl<'a> Analytics<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Analytics { engine }
    }

    pub async fn sales_by_day(&self, actor: &ActingUser, period: Period) -> EngineResult<Vec<DailyTotal>> {
        let since = period.start(self.engine.now());
        let rows = self
            .engine
            .db()
            .analytics()
            .sales_since(owner_scope(actor), since)
            .await?;
        Ok(daily_totals(rows))
    }

    pub async fn top_products(&self, actor: &ActingUser, limit: Option<u32>) -> EngineResult<Vec<TopProduct>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_PRODUCTS);
        Ok(self
            .engine
            .db()
            .analytics()
            .top_products(owner_scope(actor), limit)
            .await?)
    }

    /// Revenue and expense totals with month-over-month growth.
    pub async fn admin_statistics(&self, actor: &ActingUser) -> EngineResult<AdminStatistics> {
        let scope = owner_scope(actor);
        let analytics = self.engine.db().analytics();
        let (current_start, previous_start) = month_bounds(self.engine.now());

        let total_revenue_cents = analytics.revenue(scope, None, None).await?;
        let total_expenses_cents = analytics.expenses_total(scope).await?;
        let current_month_cents = analytics.revenue(scope, Some(current_start), None).await?;
        let previous_month_cents = analytics
            .revenue(scope, Some(previous_start), Some(current_start))
            .await?;

        let growth_rate =
            Money::from_cents(current_month_cents).growth_rate_from(Money::from_cents(previous_month_cents));
        debug!(current_month_cents, previous_month_cents, growth_rate, "Statistics computed");

        Ok(AdminStatistics {
            total_revenue_cents,
            total_expenses_cents,
            current_month_cents,
            previous_month_cents,
            growth_rate,
        })
    }

    /// Home screen figures over the actor's own shops.
    pub async fn vendor_dashboard(&self, actor: &ActingUser) -> EngineResult<VendorDashboard> {
        let owner_id = actor.user_id.as_str();
        let db = self.engine.db();

        let (shop_count, product_count, low_stock_count) = db.analytics().catalog_counts(owner_id).await?;
        let total_sales_cents = db.analytics().revenue(Some(owner_id), None, None).await?;
        let today_sales_cents = db
            .analytics()
            .revenue(Some(owner_id), Some(start_of_day(self.engine.now())), None)
            .await?;
        let recent_sales = db.sales().list_for_owner(owner_id, DASHBOARD_RECENT_SALES).await?;

        let mut unread_alerts = db.alerts().list_for_user(owner_id, true).await?;
        unread_alerts.truncate(DASHBOARD_UNREAD_ALERTS);

        Ok(VendorDashboard {
            shop_count,
            total_sales_cents,
            today_sales_cents,
            product_count,
            low_stock_count,
            recent_sales,
            unread_alerts,
        })
    }
}
