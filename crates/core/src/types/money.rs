//! Money amounts in Bangladeshi Taka and discount arithmetic.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount string could not be parsed as a decimal.
    #[error("invalid amount: {0}")]
    Parse(String),
}

/// A non-negative amount in Taka, rounded to two decimal places.
///
/// ```
/// use dokan_core::Money;
/// use rust_decimal::Decimal;
///
/// let total = Money::new(Decimal::new(125_000, 2)).unwrap();
/// assert_eq!(total.display(), "৳1,250.00");
/// assert_eq!(total.plain(), "Tk 1250.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero Taka.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(round2(amount)))
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(round2(self.0 * Decimal::from(quantity)))
    }

    /// Formats with the Taka sign and thousands separators: `৳1,250.00`.
    #[must_use]
    pub fn display(self) -> String {
        let fixed = format!("{:.2}", self.0);
        let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        format!("৳{grouped}.{frac}")
    }

    /// Latin-only formatting for contexts without Bengali glyphs: `Tk 1250.00`.
    #[must_use]
    pub fn plain(self) -> String {
        format!("Tk {:.2}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| MoneyError::Parse(e.to_string()))?;
        Self::new(amount)
    }
}

impl core::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage off the list price, for "-20%" badges.
///
/// Returns `None` when there is no discount price, when the discount price
/// is not below the list price, or when the list price is zero.
///
/// ```
/// use dokan_core::discount_percentage;
/// use rust_decimal::Decimal;
///
/// assert_eq!(discount_percentage(Decimal::from(1000), Some(Decimal::from(750))), Some(25));
/// assert_eq!(discount_percentage(Decimal::from(1000), None), None);
/// ```
#[must_use]
pub fn discount_percentage(price: Decimal, discount_price: Option<Decimal>) -> Option<u8> {
    let discount = discount_price?;
    if price <= Decimal::ZERO || discount >= price || discount.is_sign_negative() {
        return None;
    }

    let pct = ((price - discount) / price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    pct.to_u8()
}

/// The price a customer actually pays: the discount price when it undercuts
/// the list price, the list price otherwise.
#[must_use]
pub fn effective_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(d) if d >= Decimal::ZERO && d < price => d,
        _ => price,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_money_rejects_negative() {
        assert_eq!(Money::new(dec("-0.01")), Err(MoneyError::Negative));
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_money_rounds_half_away_from_zero() {
        assert_eq!(Money::new(dec("10.005")).unwrap().amount(), dec("10.01"));
        assert_eq!(Money::new(dec("10.004")).unwrap().amount(), dec("10.00"));
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::new(dec("0")).unwrap().display(), "৳0.00");
        assert_eq!(Money::new(dec("999.5")).unwrap().display(), "৳999.50");
        assert_eq!(Money::new(dec("1250")).unwrap().display(), "৳1,250.00");
        assert_eq!(Money::new(dec("1234567.8")).unwrap().display(), "৳1,234,567.80");
    }

    #[test]
    fn test_plain_and_display_trait() {
        let m = Money::new(dec("1250")).unwrap();
        assert_eq!(m.plain(), "Tk 1250.00");
        assert_eq!(m.to_string(), "1250.00");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Money::new(dec("99.99")).unwrap();
        let total: Money = [unit.times(3), Money::new(dec("60")).unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.amount(), dec("359.97"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("  42.5 ".parse::<Money>().unwrap().amount(), dec("42.50"));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Parse(_))));
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(dec("1000"), Some(dec("800"))), Some(20));
        // 1/3 off rounds to 33
        assert_eq!(discount_percentage(dec("300"), Some(dec("200"))), Some(33));
        // 2.5% rounds away from zero
        assert_eq!(discount_percentage(dec("200"), Some(dec("195"))), Some(3));
        assert_eq!(discount_percentage(dec("1000"), None), None);
        assert_eq!(discount_percentage(dec("1000"), Some(dec("1000"))), None);
        assert_eq!(discount_percentage(dec("1000"), Some(dec("1200"))), None);
        assert_eq!(discount_percentage(Decimal::ZERO, Some(Decimal::ZERO)), None);
    }

    #[test]
    fn test_effective_price() {
        assert_eq!(effective_price(dec("500"), Some(dec("450"))), dec("450"));
        assert_eq!(effective_price(dec("500"), Some(dec("550"))), dec("500"));
        assert_eq!(effective_price(dec("500"), None), dec("500"));
    }
}
