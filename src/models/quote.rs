use serde::{Deserialize, Serialize};

/// Round to currency-minor-unit precision. Applied once per amount, when the
/// quote is assembled, so the displayed and charged figures cannot drift.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// An ephemeral pricing result. Quotes are computed per request and never
/// persisted; the durable copy of these numbers lives in provider session
/// metadata until a booking is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub final_total: f64,
    pub deposit_amount: f64,
    pub currency: String,
}

impl Quote {
    /// Remainder due on arrival.
    pub fn balance_due(&self) -> f64 {
        round_usd((self.final_total - self.deposit_amount).max(0.0))
    }

    /// Deposit in cents, as payment providers expect it.
    pub fn deposit_minor_units(&self) -> i64 {
        (self.deposit_amount * 100.0).round() as i64
    }
}
