pub mod bookings;
pub mod checkout;
pub mod confirm;
pub mod experiences;
pub mod health;
pub mod promo;
pub mod webhook;
