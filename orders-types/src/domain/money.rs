//! Monetary value in minor units and the fee rate applied to orders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Number of minor units in one major unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

const BPS_DENOMINATOR: i64 = 10_000;

/// Non-negative money amount.
///
/// Amount is stored in the smallest unit of the deployment currency (cents)
/// to avoid floating-point precision issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Creates a new Money value from minor units.
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self(amount))
    }

    /// Creates a zero-value Money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Converts a decimal major-unit amount (e.g. `10.5`) into minor units.
    ///
    /// Rounds half away from zero to the nearest minor unit.
    pub fn from_major_decimal(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::ValidationError(format!(
                "Price is not a finite number: {}",
                value
            )));
        }
        let minor = (value * MINOR_UNITS_PER_MAJOR as f64).round();
        if minor > i64::MAX as f64 {
            return Err(DomainError::ValidationError("Price is too large".into()));
        }
        Self::new(minor as i64)
    }

    /// Returns the amount in minor units.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::ValidationError("Amount overflow".into()))
    }

    /// Checked multiplication by a line-item quantity.
    pub fn checked_mul(&self, quantity: u32) -> Result<Money, DomainError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::ValidationError("Amount overflow".into()))
    }
}

impl TryFrom<i64> for Money {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0 / MINOR_UNITS_PER_MAJOR;
        let minor = self.0 % MINOR_UNITS_PER_MAJOR;
        write!(f, "{}.{:02}", major, minor)
    }
}

/// Fee charged on an order subtotal, in basis points (500 = 5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a fee rate from basis points. Rates above 100% are rejected.
    pub fn from_bps(bps: u32) -> Result<Self, DomainError> {
        if i64::from(bps) > BPS_DENOMINATOR {
            return Err(DomainError::ValidationError(format!(
                "Fee rate {} bps exceeds 100%",
                bps
            )));
        }
        Ok(Self(bps))
    }

    /// Returns the rate in basis points.
    pub fn bps(&self) -> u32 {
        self.0
    }

    /// Computes the fee on `subtotal`, rounding half up to the nearest minor unit.
    pub fn fee_on(&self, subtotal: Money) -> Result<Money, DomainError> {
        let scaled = subtotal
            .amount()
            .checked_mul(i64::from(self.0))
            .and_then(|v| v.checked_add(BPS_DENOMINATOR / 2))
            .ok_or_else(|| DomainError::ValidationError("Amount overflow".into()))?;
        Money::new(scaled / BPS_DENOMINATOR)
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(1000).unwrap();
        assert_eq!(money.amount(), 1000);
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(-100);
        assert!(matches!(result, Err(DomainError::NegativeAmount)));
    }

    #[test]
    fn test_money_from_decimal_price() {
        assert_eq!(Money::from_major_decimal(10.0).unwrap().amount(), 1000);
        assert_eq!(Money::from_major_decimal(19.99).unwrap().amount(), 1999);
        assert_eq!(Money::from_major_decimal(0.005).unwrap().amount(), 1);
        assert!(Money::from_major_decimal(-1.0).is_err());
        assert!(Money::from_major_decimal(f64::NAN).is_err());
    }

    #[test]
    fn test_money_mul_overflow() {
        let money = Money::new(i64::MAX / 2).unwrap();
        assert!(money.checked_mul(3).is_err());
    }

    #[test]
    fn test_fee_rounds_half_up() {
        let rate = FeeRate::from_bps(500).unwrap();
        assert_eq!(rate.fee_on(Money::new(2000).unwrap()).unwrap().amount(), 100);
        // 5% of 0.10 is 0.005, which rounds up to one cent
        assert_eq!(rate.fee_on(Money::new(10).unwrap()).unwrap().amount(), 1);
        // 5% of 0.09 is 0.0045, which rounds down
        assert_eq!(rate.fee_on(Money::new(9).unwrap()).unwrap().amount(), 0);
    }

    #[test]
    fn test_fee_rate_above_hundred_percent_fails() {
        assert!(FeeRate::from_bps(10_001).is_err());
        assert!(FeeRate::from_bps(10_000).is_ok());
    }

    #[test]
    fn test_money_serde_rejects_negative() {
        let result: Result<Money, _> = serde_json::from_str("-5");
        assert!(result.is_err());
        assert_eq!(serde_json::to_string(&Money::new(250).unwrap()).unwrap(), "250");
    }

    #[test]
    fn test_money_display() {
        let money = Money::new(1050).unwrap();
        assert_eq!(format!("{}", money), "10.50");
    }
}
