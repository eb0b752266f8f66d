//! # Expenses
//!
//! Vendor expense book. Offline replays reuse [`Expenses::commit_expense`]
//! with the client's idempotency key as `client_ref`.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::{owner_scope, Engine};
use duka_core::analytics::CategoryTotal;
use duka_core::numbering::new_id;
use duka_core::validation::{normalize_optional, validate_amount_cents, validate_idempotency_key, validate_text};
use duka_core::{ActingUser, Expense, NewExpense};

/// Result of [`Expenses::commit_expense`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExpenseCommit {
    Created(Expense),
    /// The idempotency key already produced this expense.
    Existing(Expense),
}

impl ExpenseCommit {
    pub fn expense(&self) -> &Expense {
        match self {
            ExpenseCommit::Created(expense) | ExpenseCommit::Existing(expense) => expense,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, ExpenseCommit::Existing(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Expenses<'a> {
    engine: &'a Engine,
}

impl<'a> Expenses<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Expenses { engine }
    }

    /// Records an expense for the actor. Returns the expense id.
    pub async fn record_expense(&self, actor: &ActingUser, request: NewExpense) -> EngineResult<String> {
        Ok(self
            .commit_expense(actor, request, None)
            .await?
            .expense()
            .id
            .clone())
    }

    /// Validates and persists an expense, collapsing repeats of `client_ref`.
    pub async fn commit_expense(
        &self,
        actor: &ActingUser,
        request: NewExpense,
        client_ref: Option<&str>,
    ) -> EngineResult<ExpenseCommit> {
        validate_amount_cents("amount_cents", request.amount_cents)?;
        let client_ref = client_ref.map(validate_idempotency_key).transpose()?;

        let expenses = self.engine.db().expenses();
        if let Some(key) = client_ref.as_deref() {
            if let Some(existing) = expenses.find_by_client_ref(&actor.user_id, key).await? {
                return Ok(ExpenseCommit::Existing(existing));
            }
        }

        let expense = Expense {
            id: new_id(),
            user_id: actor.user_id.clone(),
            category: validate_text("category", &request.category, 100)?,
            amount_cents: request.amount_cents,
            description: normalize_optional(request.description.as_deref()),
            date: request.date,
            payment_method: request.payment_method,
            receipt_number: normalize_optional(request.receipt_number.as_deref()),
            client_ref,
            created_at: self.engine.now(),
        };

        match expenses.insert(&expense).await {
            Ok(()) => {
                info!(
                    expense_id = %expense.id,
                    user_id = %expense.user_id,
                    amount_cents = expense.amount_cents,
                    "Expense recorded"
                );
                Ok(ExpenseCommit::Created(expense))
            }
            Err(err) if err.is_unique_violation_on("expenses.client_ref") => {
                let key = expense.client_ref.as_deref().unwrap_or_default();
                expenses
                    .find_by_client_ref(&actor.user_id, key)
                    .await?
                    .map(ExpenseCommit::Existing)
                    .ok_or_else(|| EngineError::Conflict(format!("client_ref {key} is taken")))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Administrators see every expense, vendors their own.
    pub async fn list_expenses(&self, actor: &ActingUser) -> EngineResult<Vec<Expense>> {
        let expenses = match owner_scope(actor) {
            Some(user_id) => self.engine.db().expenses().list_for_user(user_id).await?,
            None => self.engine.db().expenses().list_all().await?,
        };
        Ok(expenses)
    }

    pub async fn expense_totals_by_category(&self, actor: &ActingUser) -> EngineResult<Vec<CategoryTotal>> {
        Ok(self
            .engine
            .db()
            .expenses()
            .totals_by_category(owner_scope(actor))
            .await?)
    }
}
