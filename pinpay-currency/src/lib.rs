//! Currency table and minor-unit conversions.
//!
//! Pin Payments expresses every amount as an integer in the smallest unit
//! of its currency (cents for AUD, yen for JPY). This crate knows, for each
//! supported currency, how many decimal places separate the minor unit from
//! the major unit, and converts between the two without floating point.
//!
//! Currencies are declared once in the `define_currencies!` invocation below.
//!
//! # Example
//! ```
//! use pinpay_currency::{value, CurrencyCode};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(value(1000, CurrencyCode::AUD), Decimal::new(1000, 2)); // 10.00
//! assert_eq!(value(1000, CurrencyCode::JPY), Decimal::from(1000));
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Errors raised by currency parsing and conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("Amount {amount} {currency} does not fit in minor units")]
    AmountOutOfRange { amount: Decimal, currency: CurrencyCode },
}

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Defines the CurrencyCode enum and its exponent table
// ─────────────────────────────────────────────────────────────────────────────

/// Defines the supported currencies.
///
/// # Syntax
/// ```ignore
/// define_currencies! {
///     Name => ("CODE", minor_unit_exponent),
/// }
/// ```
macro_rules! define_currencies {
    (
        $(
            $name:ident => ($code:literal, $exponent:literal)
        ),* $(,)?
    ) => {
        /// ISO 4217 code of a currency accepted by the gateway.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum CurrencyCode {
            $($name),*
        }

        impl CurrencyCode {
            pub fn code(&self) -> &'static str {
                match self {
                    $(CurrencyCode::$name => $code),*
                }
            }

            /// Number of decimal places between the minor and major unit.
            pub fn exponent(&self) -> u32 {
                match self {
                    $(CurrencyCode::$name => $exponent),*
                }
            }

            pub fn all() -> &'static [CurrencyCode] {
                &[$(CurrencyCode::$name),*]
            }
        }

        impl std::str::FromStr for CurrencyCode {
            type Err = CurrencyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_uppercase().as_str() {
                    $($code => Ok(CurrencyCode::$name),)*
                    _ => Err(CurrencyError::UnknownCurrency(s.to_string())),
                }
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// CURRENCY DEFINITIONS
// ─────────────────────────────────────────────────────────────────────────────

define_currencies! {
    AUD => ("AUD", 2),
    USD => ("USD", 2),
    NZD => ("NZD", 2),
    SGD => ("SGD", 2),
    EUR => ("EUR", 2),
    GBP => ("GBP", 2),
    CAD => ("CAD", 2),
    HKD => ("HKD", 2),
    JPY => ("JPY", 0),
}

impl CurrencyCode {
    /// True for currencies whose minor unit is the major unit (e.g. yen).
    pub fn is_zero_decimal(&self) -> bool {
        self.exponent() == 0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        CurrencyCode::AUD
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

/// Value of `amount` minor units in the major unit of `currency`.
///
/// 1000 cents is `10.00`, 1000 yen is `1000`.
pub fn value(amount: i64, currency: CurrencyCode) -> Decimal {
    Decimal::new(amount, currency.exponent())
}

/// Converts a major-unit amount into integer minor units, truncating any
/// precision finer than the currency's minor unit.
pub fn to_minor_units(amount: Decimal, currency: CurrencyCode) -> Result<i64, CurrencyError> {
    let scale = Decimal::from(10i64.pow(currency.exponent()));
    amount
        .checked_mul(scale)
        .and_then(|minor| minor.trunc().to_i64())
        .ok_or(CurrencyError::AmountOutOfRange { amount, currency })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
