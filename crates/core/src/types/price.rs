//! Type-safe price representation using decimal arithmetic.
//!
//! Listing prices are whole rupees. On the wire they are plain JSON numbers;
//! form input may arrive as text with digit grouping (`"1,50,000"`).

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// Errors that can occur when building a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a number.
    #[error("Price must be a number")]
    NotANumber,
    /// The amount is below [`Price::MIN`].
    #[error("Price must be at least ₹1,000")]
    TooLow,
    /// The amount is above [`Price::MAX`].
    #[error("Price must be reasonable")]
    TooHigh,
}

/// A listing price in the marketplace currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    amount: Decimal,
}

impl Price {
    /// Lowest price a listing may be created with.
    pub const MIN: i64 = 1_000;
    /// Highest price a listing may be created with.
    pub const MAX: i64 = 100_000_000;

    /// Create a price without range checks (for values read from the API).
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }

    /// Create a price from a whole number of rupees without range checks.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self::new(Decimal::from(rupees))
    }

    /// Create a price that is acceptable for a new listing.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::TooLow` or `PriceError::TooHigh` when the amount
    /// falls outside `[Price::MIN, Price::MAX]`.
    pub fn checked(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::from(Self::MIN) {
            return Err(PriceError::TooLow);
        }
        if amount > Decimal::from(Self::MAX) {
            return Err(PriceError::TooHigh);
        }
        Ok(Self::new(amount))
    }

    /// Coerce form text into a price, ignoring digit-grouping commas,
    /// surrounding whitespace and a leading rupee sign.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` for non-numeric input, otherwise the
    /// range errors of [`Price::checked`].
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err(PriceError::NotANumber);
        }
        let amount = cleaned
            .parse::<Decimal>()
            .map_err(|_| PriceError::NotANumber)?;
        Self::checked(amount)
    }

    /// The amount in rupees.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Currency every price is quoted in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        CurrencyCode::INR
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.amount.fract().is_zero()
            && let Some(whole) = self.amount.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        serializer.serialize_f64(self.amount.to_f64().unwrap_or_default())
    }
}

impl fmt::Display for Price {
    /// Formats with Indian digit grouping, e.g. `₹12,50,000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.amount.round_dp(2).normalize();
        let text = rounded.abs().to_string();
        let (whole, fraction) = text
            .split_once('.')
            .map_or((text.as_str(), None), |(w, fr)| (w, Some(fr)));
        let sign = if rounded.is_sign_negative() { "-" } else { "" };

        write!(f, "{sign}{}{}", self.currency().symbol(), group_indian(whole))?;
        if let Some(fraction) = fraction {
            write!(f, ".{fraction}")?;
        }
        Ok(())
    }
}

/// Insert commas the way Indian numbering does: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_bounds() {
        assert_eq!(Price::checked(Decimal::from(500)), Err(PriceError::TooLow));
        assert_eq!(
            Price::checked(Decimal::from(100_000_001)),
            Err(PriceError::TooHigh)
        );
        assert!(Price::checked(Decimal::from(Price::MIN)).is_ok());
        assert!(Price::checked(Decimal::from(Price::MAX)).is_ok());
    }

    #[test]
    fn test_parse_coerces_text() {
        assert_eq!(Price::parse("1,50,000").unwrap(), Price::from_rupees(150_000));
        assert_eq!(Price::parse(" ₹2500 ").unwrap(), Price::from_rupees(2_500));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("cheap"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("500"), Err(PriceError::TooLow));
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Price::from_rupees(999).to_string(), "₹999");
        assert_eq!(Price::from_rupees(1_000).to_string(), "₹1,000");
        assert_eq!(Price::from_rupees(150_000).to_string(), "₹1,50,000");
        assert_eq!(Price::from_rupees(12_500_000).to_string(), "₹1,25,00,000");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::from_rupees(450_000)).unwrap();
        assert_eq!(json, "450000");
    }

    #[test]
    fn test_deserializes_number_or_string() {
        let from_number: Price = serde_json::from_str("450000").unwrap();
        let from_text: Price = serde_json::from_str("\"450000\"").unwrap();
        assert_eq!(from_number, from_text);
    }
}
