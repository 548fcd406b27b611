//! Commission domain models and pure pricing.

use billpay_vendors::ServiceCategory;
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DISCOS, MAX_ELECTRICITY_COMMISSION_RATE, MAX_TELECOM_COMMISSION_RATE, NETWORKS,
};
use crate::errors::{Error, Result, ValidationError};

/// One commission record. `key == None` is the global tier for the
/// service; otherwise it is the override for that network or disco.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionConfig {
    pub service: ServiceCategory,
    pub key: Option<String>,
    /// Percent.
    pub commission_rate: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub updated_at: NaiveDateTime,
}

/// Administrator input for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRateInput {
    pub commission_rate: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

impl CommissionRateInput {
    pub fn validate(&self, service: ServiceCategory) -> Result<()> {
        let cap = max_rate(service)?;
        if self.commission_rate < Decimal::ZERO || self.commission_rate > cap {
            return Err(ValidationError::invalid(format!(
                "commissionRate for {} must be between 0 and {}",
                service, cap
            ))
            .into());
        }
        if self.min_amount < Decimal::ZERO {
            return Err(ValidationError::invalid("minAmount must not be negative").into());
        }
        if self.min_amount > self.max_amount {
            return Err(ValidationError::invalid("minAmount must not exceed maxAmount").into());
        }
        Ok(())
    }
}

/// Which tier priced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionTier {
    Global,
    Override,
    /// Service without a commission family; charged at face value.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub service: ServiceCategory,
    pub key: Option<String>,
    pub nominal_amount: Decimal,
    pub commission_rate: Decimal,
    pub commission: Decimal,
    pub charged_amount: Decimal,
    pub tier: CommissionTier,
}

/// Highest commission rate allowed for a service.
pub fn max_rate(service: ServiceCategory) -> Result<Decimal> {
    match service {
        ServiceCategory::Airtime | ServiceCategory::Data => {
            Ok(Decimal::from(MAX_TELECOM_COMMISSION_RATE))
        }
        ServiceCategory::Electricity => Ok(Decimal::from(MAX_ELECTRICITY_COMMISSION_RATE)),
        ServiceCategory::Cable => Err(ValidationError::invalid(
            "cable purchases have no commission tier",
        )
        .into()),
    }
}

/// Canonical override key for a network or disco.
///
/// Networks accept `etisalat` for `9mobile`; discos accept forms such as
/// `ikeja-electric` or `Port Harcourt`. Cable keys (bouquets) pass through
/// lowercased.
pub fn normalize_key(service: ServiceCategory, key: &str) -> Result<String> {
    let lowered = key.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Err(ValidationError::MissingField("key".to_string()).into());
    }
    match service {
        ServiceCategory::Airtime | ServiceCategory::Data => {
            let network = if lowered == "etisalat" {
                "9mobile".to_string()
            } else {
                lowered
            };
            if NETWORKS.contains(&network.as_str()) {
                Ok(network)
            } else {
                Err(ValidationError::invalid(format!("unknown network '{}'", key)).into())
            }
        }
        ServiceCategory::Electricity => {
            let base = lowered
                .strip_suffix("-electric")
                .or_else(|| lowered.strip_suffix("_electric"))
                .or_else(|| lowered.strip_suffix(" electric"))
                .unwrap_or(&lowered);
            let disco: String = base
                .chars()
                .filter(|c| !matches!(c, '-' | '_' | ' '))
                .collect();
            if DISCOS.contains(&disco.as_str()) {
                Ok(disco)
            } else {
                Err(ValidationError::invalid(format!("unknown disco '{}'", key)).into())
            }
        }
        ServiceCategory::Cable => Ok(lowered),
    }
}

/// Round to whole currency units, half away from zero.
fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Price `amount` under `config`.
///
/// The amount must lie within `[min_amount, max_amount]`; it is never
/// clamped. Commission is deducted from the nominal amount (the user pays
/// less). Rounding happens once, on the final commission; the charged
/// amount is the nominal amount minus that rounded commission, so the two
/// always add back up to the nominal amount.
pub fn compute_price(
    config: &CommissionConfig,
    amount: Decimal,
    tier: CommissionTier,
) -> Result<PriceQuote> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::invalid("amount must be positive").into());
    }
    if amount < config.min_amount || amount > config.max_amount {
        return Err(Error::AmountOutOfRange {
            amount,
            min: config.min_amount,
            max: config.max_amount,
        });
    }

    let commission = round_currency(amount * config.commission_rate / Decimal::ONE_HUNDRED);
    let charged_amount = round_currency(amount - commission);

    Ok(PriceQuote {
        service: config.service,
        key: config.key.clone(),
        nominal_amount: amount,
        commission_rate: config.commission_rate,
        commission,
        charged_amount,
        tier,
    })
}

/// Face-value quote for services without a commission family.
pub fn pass_through(service: ServiceCategory, key: Option<String>, amount: Decimal) -> Result<PriceQuote> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::invalid("amount must be positive").into());
    }
    Ok(PriceQuote {
        service,
        key,
        nominal_amount: amount,
        commission_rate: Decimal::ZERO,
        commission: Decimal::ZERO,
        charged_amount: round_currency(amount),
        tier: CommissionTier::PassThrough,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn config(rate: Decimal, min: Decimal, max: Decimal) -> CommissionConfig {
        CommissionConfig {
            service: ServiceCategory::Electricity,
            key: None,
            commission_rate: rate,
            min_amount: min,
            max_amount: max,
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_discount_model() {
        let quote =
            compute_price(&config(dec!(5), dec!(1000), dec!(50000)), dec!(2000), CommissionTier::Global)
                .unwrap();
        assert_eq!(quote.commission, dec!(100));
        assert_eq!(quote.charged_amount, dec!(1900));
    }

    #[test]
    fn test_rounding_half_up_once() {
        // 2.5% of 1010 = 25.25
        let quote =
            compute_price(&config(dec!(2.5), dec!(0), dec!(5000)), dec!(1010), CommissionTier::Global)
                .unwrap();
        assert_eq!(quote.commission, dec!(25));
        assert_eq!(quote.charged_amount, dec!(985));

        // 5% of 10 = 0.5 rounds up; the parts still add back to 10
        let quote =
            compute_price(&config(dec!(5), dec!(0), dec!(5000)), dec!(10), CommissionTier::Global)
                .unwrap();
        assert_eq!(quote.commission, dec!(1));
        assert_eq!(quote.charged_amount, dec!(9));
    }

    #[test]
    fn test_out_of_range_is_never_clamped() {
        let cfg = config(dec!(5), dec!(1000), dec!(50000));
        for amount in [dec!(999), dec!(50001)] {
            let err = compute_price(&cfg, amount, CommissionTier::Global).unwrap_err();
            assert!(matches!(err, Error::AmountOutOfRange { .. }));
        }
        assert!(compute_price(&cfg, dec!(1000), CommissionTier::Global).is_ok());
        assert!(compute_price(&cfg, dec!(50000), CommissionTier::Global).is_ok());
    }

    #[test]
    fn test_rate_caps() {
        let input = CommissionRateInput {
            commission_rate: dec!(60),
            min_amount: dec!(100),
            max_amount: dec!(1000),
        };
        assert!(input.validate(ServiceCategory::Airtime).is_ok());
        assert!(input.validate(ServiceCategory::Electricity).is_err());
        assert!(input.validate(ServiceCategory::Cable).is_err());

        let inverted = CommissionRateInput {
            commission_rate: dec!(1),
            min_amount: dec!(1000),
            max_amount: dec!(100),
        };
        assert!(inverted.validate(ServiceCategory::Data).is_err());

        let negative = CommissionRateInput {
            commission_rate: dec!(-1),
            min_amount: dec!(0),
            max_amount: dec!(100),
        };
        assert!(negative.validate(ServiceCategory::Data).is_err());
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(ServiceCategory::Airtime, " GLO ").unwrap(), "glo");
        assert_eq!(normalize_key(ServiceCategory::Data, "etisalat").unwrap(), "9mobile");
        assert_eq!(
            normalize_key(ServiceCategory::Electricity, "ikeja-electric").unwrap(),
            "ikeja"
        );
        assert_eq!(
            normalize_key(ServiceCategory::Electricity, "Port Harcourt").unwrap(),
            "portharcourt"
        );
        assert_eq!(normalize_key(ServiceCategory::Cable, "DSTV").unwrap(), "dstv");
        assert!(normalize_key(ServiceCategory::Airtime, "ntel").is_err());
        assert!(normalize_key(ServiceCategory::Electricity, "lagos").is_err());
        assert!(normalize_key(ServiceCategory::Airtime, "  ").is_err());
    }

    #[test]
    fn test_pass_through() {
        let quote = pass_through(ServiceCategory::Cable, Some("dstv".to_string()), dec!(4615))
            .unwrap();
        assert_eq!(quote.charged_amount, dec!(4615));
        assert_eq!(quote.commission, Decimal::ZERO);
        assert_eq!(quote.tier, CommissionTier::PassThrough);
    }
}
