//! Property-based integration tests for commission pricing.

use billpay_core::commission::{compute_price, CommissionConfig, CommissionTier};
use billpay_core::Error;
use billpay_vendors::ServiceCategory;
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

/// Rates in hundredths of a percent, 0.00%..=50.00%.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=5000).prop_map(|bp| Decimal::new(bp, 2))
}

/// A config with `min <= max`.
fn arb_config() -> impl Strategy<Value = CommissionConfig> {
    (arb_rate(), 1i64..10_000, 0i64..100_000).prop_map(|(rate, min, span)| CommissionConfig {
        service: ServiceCategory::Electricity,
        key: None,
        commission_rate: rate,
        min_amount: Decimal::from(min),
        max_amount: Decimal::from(min + span),
        updated_at: Utc::now().naive_utc(),
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For whole amounts in range, charged + commission is the nominal
    /// amount, both are whole units, and the user never pays more.
    #[test]
    fn prop_discount_adds_back_to_nominal(
        config in arb_config(),
        offset in 0i64..100_000,
    ) {
        let span = config.max_amount - config.min_amount;
        let amount = config.min_amount + Decimal::from(offset) % (span + Decimal::ONE);
        let quote = compute_price(&config, amount, CommissionTier::Global).unwrap();

        prop_assert_eq!(quote.charged_amount + quote.commission, amount);
        prop_assert_eq!(quote.commission.fract(), Decimal::ZERO);
        prop_assert_eq!(quote.charged_amount.fract(), Decimal::ZERO);
        prop_assert!(quote.commission >= Decimal::ZERO);
        prop_assert!(quote.charged_amount <= amount);
    }

    /// Amounts outside the bounds always fail; nothing is clamped.
    #[test]
    fn prop_out_of_range_always_fails(
        config in arb_config(),
        distance in 1i64..1_000_000,
        above in any::<bool>(),
    ) {
        let amount = if above {
            config.max_amount + Decimal::from(distance)
        } else {
            config.min_amount - Decimal::from(distance)
        };
        let result = compute_price(&config, amount, CommissionTier::Global);
        if amount > Decimal::ZERO {
            prop_assert!(matches!(result, Err(Error::AmountOutOfRange { .. })), "amount {} accepted", amount);
        } else {
            prop_assert!(result.is_err());
        }
    }
}
