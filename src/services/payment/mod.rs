pub mod interface;
pub mod razorpay;
pub mod stripe;
