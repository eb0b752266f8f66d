//! # Payments
//!
//! Mobile money initiation stub. No provider is contacted: the request is
//! validated and acknowledged with a `PAY-…` reference in `pending` state.

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::Engine;
use duka_core::validation::{validate_amount_cents, validate_phone};
use duka_core::{ActingUser, PaymentInitiation, PaymentRequest, PaymentStatus};

/// Shown to the customer while the push prompt is pending.
pub const PAYMENT_PROMPT: &str = "Angalia simu yako kumaliza malipo";

#[derive(Debug, Clone, Copy)]
pub struct Payments<'a> {
    engine: &'a Engine,
}

impl<'a> Payments<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        Payments { engine }
    }

    pub async fn initiate_payment(
        &self,
        actor: &ActingUser,
        request: PaymentRequest,
    ) -> EngineResult<PaymentInitiation> {
        if !request.payment_method.is_mobile_money() {
            return Err(EngineError::validation("payment_method must be a mobile money provider"));
        }
        validate_amount_cents("amount_cents", request.amount_cents)?;
        if request.amount_cents == 0 {
            return Err(EngineError::validation("amount_cents must be greater than zero"));
        }
        let phone = validate_phone(&request.phone_number)?;

        let reference = self
            .engine
            .next_reference(&self.engine.config().numbering.payment_prefix, self.engine.now());

        info!(
            payment_reference = %reference,
            method = request.payment_method.as_str(),
            phone = %phone,
            amount_cents = request.amount_cents,
            by = %actor.user_id,
            "Payment initiated"
        );

        Ok(PaymentInitiation {
            payment_reference: reference,
            status: PaymentStatus::Pending,
            payment_method: request.payment_method,
            amount_cents: request.amount_cents,
            message: PAYMENT_PROMPT.to_string(),
        })
    }
}
