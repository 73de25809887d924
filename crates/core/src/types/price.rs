//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are currency-agnostic: the shop shows a single display unit
//! (e.g. `MAD`) configured per binary, so a `Price` only carries the amount.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount is above [`Price::MAX`].
    #[error("price cannot exceed {}", Price::MAX)]
    TooLarge,
}

/// A monetary amount between zero and [`Price::MAX`].
///
/// ## Examples
///
/// ```
/// use curio_core::Price;
///
/// let price: Price = "10".parse().unwrap();
/// assert_eq!(price.times(3).to_string(), "30.00");
/// assert_eq!(price.label("MAD"), "10.00 MAD");
/// assert!("-1".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price, `999999999.99`.
    ///
    /// Line totals and cart totals stay far inside `Decimal`'s range below
    /// this bound.
    pub const MAX: Self = Self(Decimal::from_parts(1_215_752_191, 23, 0, false, 2));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero, or
    /// [`PriceError::TooLarge`] if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in hundredths (e.g. `1050` is `10.50`).
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units. Saturates at `Decimal::MAX`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Format with two decimals and a trailing display unit, e.g. `"35.00 MAD"`.
    #[must_use]
    pub fn label(&self, unit: &str) -> String {
        if unit.is_empty() {
            self.to_string()
        } else {
            format!("{self} {unit}")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0.round_dp(2))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl From<u16> for Price {
    fn from(whole: u16) -> Self {
        Self(Decimal::from(whole))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_always_has_two_decimals() {
        assert_eq!(Price::from(10).to_string(), "10.00");
        assert_eq!(Price::from_cents(1999).to_string(), "19.99");
        assert_eq!("2.5".parse::<Price>().unwrap().to_string(), "2.50");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Price>(), Err(PriceError::Empty));
        assert_eq!("abc".parse::<Price>(), Err(PriceError::NotANumber));
        assert_eq!("-3".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_amounts_above_max() {
        assert_eq!(Price::MAX.to_string(), "999999999.99");
        assert_eq!("999999999.99".parse::<Price>(), Ok(Price::MAX));
        assert_eq!("1000000000".parse::<Price>(), Err(PriceError::TooLarge));
        assert_eq!(
            "79228162514264337593543950335".parse::<Price>(),
            Err(PriceError::TooLarge)
        );
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price(Decimal::MAX);
        assert_eq!(huge.times(2).amount(), Decimal::MAX);
        assert_eq!((huge + Price::from(1)).amount(), Decimal::MAX);
        let most = Price::MAX.times(u32::MAX);
        assert!(most > Price::MAX);
        assert_ne!(most.amount(), Decimal::MAX);
    }

    #[test]
    fn test_sum_and_times() {
        let total: Price = [Price::from(10).times(2), Price::from(5).times(3)]
            .into_iter()
            .sum();
        assert_eq!(total.to_string(), "35.00");
    }

    #[test]
    fn test_label_without_unit() {
        assert_eq!(Price::from(7).label(""), "7.00");
        assert_eq!(Price::from(7).label("MAD"), "7.00 MAD");
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("129.5").unwrap();
        assert_eq!(price.to_string(), "129.50");
    }

    #[test]
    fn test_deserialize_applies_the_same_bounds() {
        assert!(serde_json::from_str::<Price>("\"-4.00\"").is_err());
        assert!(serde_json::from_str::<Price>("-4").is_err());
        assert!(serde_json::from_str::<Price>("\"1000000000\"").is_err());

        let price: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.50\"");
    }
}
