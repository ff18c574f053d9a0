//! Type-safe price representation using decimal arithmetic.
//!
//! Product listings store their price as free text typed by the seller, with
//! thousands grouped by `.` or `,` depending on locale ("100.000" and
//! "100,000" are both one hundred thousand rupiah). Rupiah have no minor unit
//! in practice, so every separator is stripped and the remaining digits are the
//! amount in the smallest currency unit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors produced while reading a listing price or computing a total.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The listing has no price at all.
    #[error("price is missing")]
    Missing,
    /// Something other than digits remained after stripping separators.
    #[error("price is not a whole number: {0}")]
    Malformed(String),
    /// The amount or the multiplied total does not fit.
    #[error("price overflow")]
    Overflow,
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Read a seller-entered listing price.
    ///
    /// `.` `,` and whitespace are treated as grouping separators and removed.
    ///
    /// # Errors
    ///
    /// [`PriceError::Missing`] for blank input, [`PriceError::Malformed`] when
    /// any non-digit remains, [`PriceError::Overflow`] past `i64::MAX`.
    ///
    /// ```
    /// use skillx_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// let a = Price::parse_listing("100.000").unwrap();
    /// let b = Price::parse_listing("100,000").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.amount, Decimal::from(100_000));
    /// ```
    pub fn parse_listing(raw: &str) -> Result<Self, PriceError> {
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
            .collect();

        if digits.is_empty() {
            return if raw.trim().is_empty() {
                Err(PriceError::Missing)
            } else {
                Err(PriceError::Malformed(raw.to_owned()))
            };
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Malformed(raw.to_owned()));
        }

        let units: i64 = digits.parse().map_err(|_| PriceError::Overflow)?;
        Ok(Self::new(Decimal::from(units), CurrencyCode::IDR))
    }

    /// Multiply a unit price by a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] when the product exceeds the decimal range.
    pub fn total(&self, quantity: u32) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency_code))
    }

    /// Whole amount in the smallest unit, as payment gateways expect it.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] when the amount does not fit an `i64`.
    pub fn minor_units(&self) -> Result<i64, PriceError> {
        i64::try_from(self.amount.trunc()).map_err(|_| PriceError::Overflow)
    }

    /// Fixed two-decimal rendering used on stored transaction records.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        format!("{:.2}", self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    IDR,
    USD,
}
