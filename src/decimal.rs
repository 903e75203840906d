use crate::encoding::{Decode, Encode, Terminated};
use crate::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal as NumDecimal, MathematicalOps};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A fixed-point decimal used for exchange rates and every fraction in the
/// oracle parameters.
///
/// All arithmetic is checked. Overflow and division by zero surface as errors
/// instead of wrapping or panicking, so callers inside the tally can fall back
/// to a zero rate for the offending vote.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal {
    pub(crate) value: NumDecimal,
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.normalize().fmt(f)
    }
}

impl Encode for Decimal {
    fn encode_into<W: std::io::Write>(&self, dest: &mut W) -> ed::Result<()> {
        dest.write_all(&self.value.serialize())?;

        Ok(())
    }

    fn encoding_length(&self) -> ed::Result<usize> {
        Ok(16)
    }
}

impl Decode for Decimal {
    fn decode<R: std::io::Read>(mut source: R) -> ed::Result<Self> {
        let mut bytes = [0u8; 16];
        source.read_exact(&mut bytes)?;
        Ok(Decimal {
            value: NumDecimal::deserialize(bytes),
        })
    }
}

impl Terminated for Decimal {}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Decimal::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal {
            value: value.into(),
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal {
            value: value.into(),
        }
    }
}

impl From<NumDecimal> for Decimal {
    fn from(value: NumDecimal) -> Self {
        Decimal { value }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self {
            value: NumDecimal::from_str(s)?,
        })
    }
}

impl Decimal {
    pub fn zero() -> Self {
        Decimal {
            value: NumDecimal::ZERO,
        }
    }

    pub fn one() -> Self {
        Decimal {
            value: NumDecimal::ONE,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.value.is_zero() && self.value.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.value.is_zero() && self.value.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal {
            value: self.value.abs(),
        }
    }

    pub fn checked_add(self, other: Decimal) -> Result<Decimal> {
        self.value
            .checked_add(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }

    pub fn checked_sub(self, other: Decimal) -> Result<Decimal> {
        self.value
            .checked_sub(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }

    pub fn checked_mul(self, other: Decimal) -> Result<Decimal> {
        self.value
            .checked_mul(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }

    pub fn checked_div(self, other: Decimal) -> Result<Decimal> {
        if other.is_zero() {
            return Err(Error::DivideByZero);
        }
        self.value
            .checked_div(other.value)
            .map(Decimal::from)
            .ok_or(Error::Overflow)
    }

    pub fn mul_int(self, n: i64) -> Result<Decimal> {
        self.checked_mul(n.into())
    }

    pub fn quo_int(self, n: i64) -> Result<Decimal> {
        self.checked_div(n.into())
    }

    /// Square root, or `None` for negative values or if the iteration fails
    /// to converge.
    pub fn sqrt(&self) -> Option<Decimal> {
        self.value.sqrt().map(Decimal::from)
    }

    /// Rounds to the nearest integer, ties to even.
    pub fn round_to_i64(&self) -> Result<i64> {
        self.value.round().to_i64().ok_or(Error::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format() {
        let formatted: Decimal = dec!(1.230).into();
        assert_eq!(format!("{}", formatted), "1.23");
    }

    #[test]
    fn checked_ops() -> Result<()> {
        let a: Decimal = dec!(1.5).into();
        let b: Decimal = dec!(0.5).into();
        assert_eq!(a.checked_add(b)?, Decimal::from(2u64));
        assert_eq!(a.checked_div(b)?, Decimal::from(3u64));
        assert!(matches!(a.checked_div(Decimal::zero()), Err(Error::DivideByZero)));

        let max: Decimal = NumDecimal::MAX.into();
        assert!(matches!(max.checked_mul(a), Err(Error::Overflow)));
        Ok(())
    }

    #[test]
    fn round_half_even() -> Result<()> {
        let threshold: Decimal = dec!(20.01).into();
        assert_eq!(threshold.round_to_i64()?, 20);
        let half: Decimal = dec!(20.5).into();
        assert_eq!(half.round_to_i64()?, 20);
        Ok(())
    }

    #[test]
    fn sign_checks() {
        assert!(Decimal::one().is_positive());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
        let neg: Decimal = dec!(-0.1).into();
        assert!(neg.is_negative());
    }
}
