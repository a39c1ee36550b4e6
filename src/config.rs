use std::env;

/// Hosted Stripe Checkout flow settings.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Webhook signing secret. Empty means webhooks are accepted unverified,
    /// which is tolerated for local development only.
    pub webhook_secret: String,
    /// Fraction of the trip total charged as the deposit in this flow.
    pub deposit_rate: f64,
}

/// Razorpay Orders flow settings. This flow legitimately runs a different
/// deposit rate than Stripe; the two are deliberately separate knobs.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base_url: String,
    pub deposit_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// From address, e.g. `Trailhead <bookings@trailhead.travel>`.
    pub from: String,
    /// Operator inbox copied on every booking event.
    pub operator_email: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public site origin used to build checkout return URLs.
    pub base_url: String,
    pub stripe: StripeConfig,
    pub razorpay: RazorpayConfig,
    pub smtp: Option<SmtpConfig>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_rate(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let stripe = StripeConfig {
            secret_key: env_or("STRIPE_SECRET_KEY", ""),
            webhook_secret: env_or("STRIPE_WEBHOOK_SECRET", ""),
            deposit_rate: env_rate("STRIPE_DEPOSIT_RATE", 0.3),
        };

        let razorpay = RazorpayConfig {
            key_id: env_or("RAZORPAY_KEY_ID", ""),
            key_secret: env_or("RAZORPAY_KEY_SECRET", ""),
            api_base_url: env_or("RAZORPAY_API_URL", "https://api.razorpay.com/v1"),
            deposit_rate: env_rate("RAZORPAY_DEPOSIT_RATE", 0.2),
        };

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => Some(SmtpConfig {
                host,
                port: env_or("SMTP_PORT", "587").parse().unwrap_or(587),
                user: env_or("SMTP_USER", ""),
                password: env_or("SMTP_PASSWORD", ""),
                from: env_or("SMTP_FROM", "bookings@trailhead.travel"),
                operator_email: env_or("OPERATOR_EMAIL", "ops@trailhead.travel"),
            }),
            _ => None,
        };

        Self {
            base_url: env_or("BASE_URL", "http://localhost:3000"),
            stripe,
            razorpay,
            smtp,
        }
    }
}
