use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Child rate used when a tour has no explicit child price, as a
    /// percentage of the adult price.
    #[serde(default = "default_child_rate_percent")]
    pub child_rate_percent: i64,
}

fn default_child_rate_percent() -> i64 {
    70
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            child_rate_percent: default_child_rate_percent(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Negative headcount: adults {adults}, children {children}")]
    NegativeHeadcount { adults: i32, children: i32 },

    #[error("Quote overflows the currency range")]
    Overflow,
}

/// Stateless quote calculator. Prices are whole currency units; every step
/// is integer arithmetic so a quote is exact and reproducible.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Child price falling back to `child_rate_percent` of the adult price,
    /// rounded half up to the nearest unit.
    pub fn effective_child_price(&self, adult_price: i64, child_price: Option<i64>) -> Result<i64, PricingError> {
        match child_price {
            Some(price) => Ok(price),
            None => adult_price
                .checked_mul(self.config.child_rate_percent)
                .and_then(|scaled| scaled.checked_add(50))
                .map(|scaled| scaled / 100)
                .ok_or(PricingError::Overflow),
        }
    }

    /// `adults * adult_price + children * effective_child_price`.
    pub fn quote(
        &self,
        adults: i32,
        children: i32,
        adult_price: i64,
        child_price: Option<i64>,
    ) -> Result<i64, PricingError> {
        if adults < 0 || children < 0 {
            return Err(PricingError::NegativeHeadcount { adults, children });
        }

        let child_unit = self.effective_child_price(adult_price, child_price)?;
        let adult_total = adult_price
            .checked_mul(i64::from(adults))
            .ok_or(PricingError::Overflow)?;
        let child_total = child_unit
            .checked_mul(i64::from(children))
            .ok_or(PricingError::Overflow)?;

        adult_total.checked_add(child_total).ok_or(PricingError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_price_falls_back_to_seventy_percent() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(2, 1, 1_000_000, None), Ok(2_700_000));
    }

    #[test]
    fn test_explicit_child_price_wins() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(2, 1, 1_000_000, Some(500_000)), Ok(2_500_000));
        assert_eq!(engine.quote(1, 2, 900_000, Some(0)), Ok(900_000));
    }

    #[test]
    fn test_fallback_rounds_half_up() {
        let engine = PricingEngine::default();
        // 0.7 * 15 = 10.5
        assert_eq!(engine.effective_child_price(15, None), Ok(11));
        // 0.7 * 13 = 9.1
        assert_eq!(engine.effective_child_price(13, None), Ok(9));
    }

    #[test]
    fn test_configured_child_rate() {
        let engine = PricingEngine::new(PricingConfig { child_rate_percent: 50 });
        assert_eq!(engine.quote(1, 2, 800_000, None), Ok(1_600_000));
    }

    #[test]
    fn test_rejects_negative_headcount() {
        let engine = PricingEngine::default();
        assert_eq!(
            engine.quote(-1, 0, 1_000, None),
            Err(PricingError::NegativeHeadcount { adults: -1, children: 0 })
        );
        assert!(engine.quote(1, -2, 1_000, None).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let engine = PricingEngine::default();
        assert_eq!(engine.quote(i32::MAX, 0, i64::MAX / 2, None), Err(PricingError::Overflow));
    }

    #[test]
    fn test_config_defaults_when_missing() {
        let config: PricingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.child_rate_percent, 70);
    }
}
