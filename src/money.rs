//! Exact decimal amounts and their storage representation.
//!
//! Amounts are handled as [Decimal] in the domain and stored as integer cents
//! in SQLite so that sums computed by the database stay exact.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::Error;

/// The number of fractional digits kept for monetary amounts.
pub const CENT_DECIMAL_PLACES: u32 = 2;

/// Check that `amount` is positive and has at most two fractional digits.
///
/// Trailing zeros do not count, so `12.500` is accepted as `12.50`.
///
/// # Errors
///
/// Returns [Error::NonPositiveAmount] for zero or negative amounts and
/// [Error::TooManyDecimalPlaces] if the amount cannot be expressed in cents.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::NonPositiveAmount(amount));
    }

    if amount.normalize().scale() > CENT_DECIMAL_PLACES {
        return Err(Error::TooManyDecimalPlaces(amount));
    }

    Ok(amount)
}

/// Parse and validate an amount entered as text, e.g. `"1299.90"`.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if the text is not a number, otherwise the
/// errors of [validate_amount].
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let amount =
        Decimal::from_str(text.trim()).map_err(|_| Error::InvalidAmount(text.to_owned()))?;

    validate_amount(amount)
}

/// Round half-up (midpoint away from zero) to cents.
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CENT_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert an amount with at most two fractional digits to integer cents.
///
/// # Errors
///
/// Returns [Error::TooManyDecimalPlaces] if converting would lose precision
/// and [Error::AmountOutOfRange] if the cents do not fit in an `i64`.
pub fn to_cents(amount: Decimal) -> Result<i64, Error> {
    if amount.normalize().scale() > CENT_DECIMAL_PLACES {
        return Err(Error::TooManyDecimalPlaces(amount));
    }

    let mut scaled = amount;
    scaled.rescale(CENT_DECIMAL_PLACES);

    i64::try_from(scaled.mantissa()).map_err(|_| Error::AmountOutOfRange(amount))
}

/// Convert integer cents back to a decimal amount with two fractional digits.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CENT_DECIMAL_PLACES)
}

/// Express `part` as a percentage of `whole`, rounded to cents.
///
/// Returns zero when `whole` is zero so callers can render empty periods.
pub fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }

    round_to_cents(part / whole * Decimal::ONE_HUNDRED)
}
