//! Amount type for handling unit prices and totals as they appear in spreadsheets.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a currency sign and thousands separators.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Currency signs that are accepted, and discarded, in front of a number.
const CURRENCY_SIGNS: [char; 2] = ['$', '₩'];

/// Represents a monetary value.
///
/// Whether the source text used thousands separators is remembered so that the value is written
/// back the way it was read. Formatting is considered significant for the purposes of equality,
/// so for numeric comparisons, you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use cert_recon::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("12500").unwrap();
/// let b = Amount::from_str("₩12,500").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// assert_eq!(b.to_string(), "12,500.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl Amount {
    /// Creates a new Amount from a Decimal value, formatted without separators.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            commas: false,
        }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // "-₩50", "₩-50" and "-50" are all accepted
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.trim_start_matches(CURRENCY_SIGNS);
        let unsigned = if negative {
            format!("-{rest}")
        } else {
            rest.to_string()
        };

        let without_commas = unsigned.replace(',', "");
        let commas = without_commas.len() < unsigned.len();

        // Spreadsheet readers sometimes hand over scientific notation for large floats
        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(AmountError)?;
        Ok(Amount { value, commas })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commas {
            let (sign, num) = if self.is_negative() {
                ("-", self.value().abs())
            } else {
                ("", self.value())
            };
            write!(
                f,
                "{sign}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{}", self.value.normalize())
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
