//! Monetary amounts using decimal arithmetic.
//!
//! The backend API sends prices as JSON numbers. They are parsed through
//! their shortest decimal representation so `19.99` stays `19.99` instead
//! of picking up binary floating point noise.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An amount of money in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole currency units, e.g. `Money::from_units(10)` is `$10.00`.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to two decimal places, half away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a percentage expressed as a decimal fraction (0.15 = 15 %).
    #[must_use]
    pub fn percent(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Format for display in the shop, e.g. `$12.50`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.round_cents().0)
    }

    /// Format as Colombian pesos with `.` thousands and `,` decimals,
    /// e.g. `$ 1.234.567,00`.
    #[must_use]
    pub fn display_cop(&self) -> String {
        let rounded = format!("{:.2}", self.round_cents().0.abs());
        let (whole, cents) = rounded.split_once('.').unwrap_or((&rounded, "00"));

        let digits: Vec<char> = whole.chars().collect();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, digit) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(*digit);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}$ {grouped},{cents}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Serialized as a JSON number, which is what the backend expects in
/// request bodies (`totalPrice`, product `price`).
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        // `f64`'s Display is the shortest string that round-trips.
        Decimal::from_str(&v.to_string())
            .or_else(|_| Decimal::from_scientific(&format!("{v:e}")))
            .map(Money)
            .map_err(|_| E::custom(format!("invalid amount: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse::<Money>()
            .map_err(|_| E::custom(format!("invalid amount: {v}")))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(money("12.5").display(), "$12.50");
        assert_eq!(money("0").display(), "$0.00");
        assert_eq!(money("19.999").display(), "$20.00");
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(money("1.005").round_cents(), money("1.01"));
        assert_eq!(money("1.004").round_cents(), money("1.00"));
    }

    #[test]
    fn test_display_cop() {
        assert_eq!(money("1234567").display_cop(), "$ 1.234.567,00");
        assert_eq!(money("999.5").display_cop(), "$ 999,50");
        assert_eq!(money("1000").display_cop(), "$ 1.000,00");
        assert_eq!(money("0").display_cop(), "$ 0,00");
    }

    #[test]
    fn test_arithmetic() {
        let line = money("19.99") * 3;
        assert_eq!(line, money("59.97"));
        let total: Money = [money("1.10"), money("2.20")].into_iter().sum();
        assert_eq!(total, money("3.30"));
    }

    #[test]
    fn test_deserialize_number_without_float_noise() {
        let m: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(m.amount().to_string(), "19.99");
        let m: Money = serde_json::from_str("150").unwrap();
        assert_eq!(m, Money::from_units(150));
        let m: Money = serde_json::from_str("\"7.25\"").unwrap();
        assert_eq!(m, money("7.25"));
        assert!(serde_json::from_str::<Money>("\"abc\"").is_err());
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&money("10.5")).unwrap(), "10.5");
    }
}
