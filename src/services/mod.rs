pub mod notification_service;
pub mod payment;
pub mod pricing_service;
pub mod promo_service;
pub mod quote_service;
