//! Fixed-point money for the settlement engine
//!
//! All monetary values are held as signed integer cents. Decimal strings are
//! parsed through `rust_decimal` and truncated toward zero to two fractional
//! digits, so no binary floating point ever reaches a balance.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Signed amount in minor currency units (cents)
///
/// Positive values are money owed to a participant, negative values are
/// money a participant owes. One cent is the smallest representable
/// amount and doubles as the engine's epsilon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Threshold below which a balance or transfer counts as settled
    pub const EPSILON: Cents = Cents(1);

    pub const fn new(cents: i64) -> Self {
        Cents(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value; saturates at `i64::MAX` for `i64::MIN`
    pub fn abs(self) -> Cents {
        Cents(self.0.checked_abs().unwrap_or(i64::MAX))
    }

    /// Whether the magnitude is below [`Cents::EPSILON`]
    pub fn is_negligible(self) -> bool {
        self.0.unsigned_abs() < Self::EPSILON.0.unsigned_abs()
    }

    pub fn checked_add(self, rhs: Cents) -> Option<Cents> {
        self.0.checked_add(rhs.0).map(Cents)
    }

    pub fn checked_sub(self, rhs: Cents) -> Option<Cents> {
        self.0.checked_sub(rhs.0).map(Cents)
    }

    /// Convert a decimal amount to cents, truncating extra fractional digits
    ///
    /// Returns `None` if the value does not fit in an `i64` number of cents.
    pub fn from_decimal(amount: Decimal) -> Option<Cents> {
        let truncated = amount.round_dp_with_strategy(2, RoundingStrategy::ToZero);
        truncated
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Cents)
    }

    /// Exact decimal representation with two fractional digits
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Error returned when a string is not a decimal amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCentsError(String);

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid amount", self.0)
    }
}

impl std::error::Error for ParseCentsError {}

impl FromStr for Cents {
    type Err = ParseCentsError;

    /// Parse a decimal string such as `"12.5"` or `"-0.01"`
    ///
    /// Digits beyond the second decimal place are truncated, so `"0.005"`
    /// parses to zero cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal =
            Decimal::from_str(trimmed).map_err(|_| ParseCentsError(trimmed.to_string()))?;
        Cents::from_decimal(decimal).ok_or_else(|| ParseCentsError(trimmed.to_string()))
    }
}

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Cents(value)
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Self::Output {
        Cents(self.0 + rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Self::Output {
        Cents(self.0 - rhs.0)
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 -= rhs.0;
    }
}

impl Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Self::Output {
        Cents(-self.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}
