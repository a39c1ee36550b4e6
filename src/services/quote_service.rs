use crate::models::promo::PromoCode;
use crate::models::quote::{round_usd, Quote};

use super::pricing_service::PricingService;
use super::promo_service::PromoService;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// The computed deposit is zero or less. Providers reject zero-amount
    /// sessions, so this is a hard stop before any external call.
    #[error("booking amount must be greater than zero")]
    EmptyBooking,
}

pub struct QuoteService;

impl QuoteService {
    /// Compose subtotal, discount and deposit into a final quote.
    /// `deposit_rate` is fixed per payment flow (0.30 for the hosted Stripe
    /// flow, 0.20 for the Razorpay flow), never user input.
    pub fn build(
        base_price: f64,
        adults: u32,
        children: u32,
        promo: Option<&PromoCode>,
        deposit_rate: f64,
    ) -> Result<Quote, QuoteError> {
        let subtotal = PricingService::party_subtotal(base_price, adults as i64, children as i64);
        let discount_amount = promo
            .map(|p| PromoService::discount_for(p, subtotal))
            .unwrap_or(0.0);
        let final_total = subtotal - discount_amount;
        let deposit_amount = round_usd(final_total * deposit_rate);

        if deposit_amount <= 0.0 {
            return Err(QuoteError::EmptyBooking);
        }

        Ok(Quote {
            subtotal: round_usd(subtotal),
            discount_amount: round_usd(discount_amount),
            final_total: round_usd(final_total),
            deposit_amount,
            currency: "USD".to_string(),
        })
    }
}
