/// Children are always charged at half the adult rate. Business policy, not
/// configuration.
pub const CHILD_RATE: f64 = 0.5;

pub struct PricingService;

impl PricingService {
    /// Party subtotal in USD. Negative inputs are treated as zero, so the
    /// result is never negative.
    pub fn party_subtotal(base_price: f64, adults: i64, children: i64) -> f64 {
        let base_price = base_price.max(0.0);
        let adults = adults.max(0) as f64;
        let children = children.max(0) as f64;
        base_price * adults + base_price * CHILD_RATE * children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal_calculation() {
        assert_eq!(PricingService::party_subtotal(100.0, 2, 1), 250.0);
        assert_eq!(PricingService::party_subtotal(100.0, 1, 0), 100.0);
        assert_eq!(PricingService::party_subtotal(80.0, 0, 2), 80.0);
    }

    #[test]
    fn test_zero_party() {
        assert_eq!(PricingService::party_subtotal(100.0, 0, 0), 0.0);
        assert_eq!(PricingService::party_subtotal(0.0, 3, 2), 0.0);
    }

    #[test]
    fn test_negative_inputs_clamped() {
        assert_eq!(PricingService::party_subtotal(100.0, -2, 1), 50.0);
        assert_eq!(PricingService::party_subtotal(100.0, 2, -1), 200.0);
        assert_eq!(PricingService::party_subtotal(-100.0, 2, 1), 0.0);
    }
}
