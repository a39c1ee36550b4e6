use crate::models::promo::{PromoCode, PromoKind};

pub struct PromoService;

impl PromoService {
    /// Codes match case-insensitively with surrounding whitespace ignored.
    /// The registry stores codes in this normalized form.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_lowercase()
    }

    /// Discount a promo grants against a base amount, clamped to
    /// `[0, base_amount]` so a promo can never push a total negative.
    /// Inactive promos grant nothing.
    pub fn discount_for(promo: &PromoCode, base_amount: f64) -> f64 {
        if !promo.active {
            return 0.0;
        }
        let base_amount = base_amount.max(0.0);
        let raw = match promo.kind {
            PromoKind::Percent => base_amount * promo.value / 100.0,
            PromoKind::Fixed => promo.value,
        };
        raw.clamp(0.0, base_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo(kind: PromoKind, value: f64, active: bool) -> PromoCode {
        PromoCode {
            id: None,
            code: "summer10".to_string(),
            kind,
            value,
            active,
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(PromoService::normalize_code("  SUMMER10 "), "summer10");
        assert_eq!(PromoService::normalize_code("Flat500"), "flat500");
    }

    #[test]
    fn test_percent_discount() {
        let p = promo(PromoKind::Percent, 10.0, true);
        assert_eq!(PromoService::discount_for(&p, 250.0), 25.0);
        assert_eq!(PromoService::discount_for(&p, 0.0), 0.0);
    }

    #[test]
    fn test_fixed_discount_clamped_to_base() {
        let p = promo(PromoKind::Fixed, 500.0, true);
        assert_eq!(PromoService::discount_for(&p, 250.0), 250.0);
        assert_eq!(PromoService::discount_for(&p, 800.0), 500.0);
    }

    #[test]
    fn test_inactive_promo_grants_nothing() {
        let p = promo(PromoKind::Percent, 50.0, false);
        assert_eq!(PromoService::discount_for(&p, 250.0), 0.0);
    }

    #[test]
    fn test_negative_value_clamped() {
        let p = promo(PromoKind::Fixed, -40.0, true);
        assert_eq!(PromoService::discount_for(&p, 250.0), 0.0);
    }
}
