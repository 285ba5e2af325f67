// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize, Serializer};

use crate::bigint::bigint_ser;

/// A quantity of native tokens, counted in attoFIL (10^-18 of a whole token).
///
/// Balances, message values and the circulating supply all cross the bridge as this type. It is
/// a newtype so that it can't be mixed up with the other big integers the bridge carries
/// (storage power, deal sizes).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenAmount {
    atto: BigInt,
}

impl TokenAmount {
    /// The logical number of decimal places of a token unit.
    pub const DECIMALS: usize = 18;

    /// The logical precision of a token unit.
    pub const PRECISION: u64 = 10u64.pow(Self::DECIMALS as u32);

    /// Creates a token amount from a quantity of indivisible units  (10^-18 whole units).
    pub fn from_atto(atto: impl Into<BigInt>) -> Self {
        Self { atto: atto.into() }
    }

    /// Creates a token amount from a quantity of whole units (10^18 indivisible units).
    pub fn from_whole(tokens: i64) -> Self {
        Self::from_atto((tokens as i128) * (Self::PRECISION as i128))
    }

    /// Returns the quantity of indivisible units.
    pub fn atto(&self) -> &BigInt {
        &self.atto
    }

    pub fn is_positive(&self) -> bool {
        self.atto.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.atto.is_negative()
    }
}

impl Zero for TokenAmount {
    #[inline]
    fn zero() -> Self {
        Self {
            atto: BigInt::zero(),
        }
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.atto.is_zero()
    }
}

impl PartialOrd for TokenAmount {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenAmount {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.atto.cmp(&other.atto)
    }
}

impl Default for TokenAmount {
    #[inline]
    fn default() -> TokenAmount {
        TokenAmount::zero()
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self)
    }
}

/// Displays a token amount as a decimal in whole units, always with a decimal point.
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (q, r) = self.atto.div_rem(&BigInt::from(Self::PRECISION));
        let whole = q.abs().to_str_radix(10);
        let fraction = if r.is_zero() {
            "0".to_owned()
        } else {
            let digits = r.abs().to_str_radix(10);
            let padded = "0".repeat(Self::DECIMALS - digits.len()) + &digits;
            padded.trim_end_matches('0').to_owned()
        };
        let sign = if self.atto.is_negative() { "-" } else { "" };
        write!(f, "{}{}.{}", sign, whole, fraction)
    }
}

impl Neg for TokenAmount {
    type Output = TokenAmount;

    #[inline]
    fn neg(self) -> TokenAmount {
        TokenAmount { atto: -self.atto }
    }
}

// Add and Sub for every combination of value/reference receiver and parameter.
macro_rules! impl_arith {
    ($Trait:ident, $method:ident, $op:tt; $(impl<$($a:lifetime),*> for $Self:ty, $Other:ty;)*) => {$(
        impl<$($a),*> $Trait<$Other> for $Self {
            type Output = TokenAmount;

            #[inline]
            fn $method(self, other: $Other) -> TokenAmount {
                TokenAmount { atto: &self.atto $op &other.atto }
            }
        }
    )*}
}

impl_arith! { Add, add, +;
    impl<> for TokenAmount, TokenAmount;
    impl<'b> for TokenAmount, &'b TokenAmount;
    impl<'a> for &'a TokenAmount, TokenAmount;
    impl<'a, 'b> for &'a TokenAmount, &'b TokenAmount;
}

impl_arith! { Sub, sub, -;
    impl<> for TokenAmount, TokenAmount;
    impl<'b> for TokenAmount, &'b TokenAmount;
    impl<'a> for &'a TokenAmount, TokenAmount;
    impl<'a, 'b> for &'a TokenAmount, &'b TokenAmount;
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bigint_ser::serialize(&self.atto, serializer)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        bigint_ser::deserialize(deserializer).map(|v| TokenAmount { atto: v })
    }
}

#[cfg(test)]
mod test {
    use actor_bridge_encoding::{from_slice, to_vec};
    use num_traits::Zero;

    use super::TokenAmount;

    #[test]
    fn display() {
        assert_eq!(TokenAmount::zero().to_string(), "0.0");
        assert_eq!(TokenAmount::from_atto(1).to_string(), "0.000000000000000001");
        assert_eq!(TokenAmount::from_whole(3).to_string(), "3.0");
        assert_eq!(
            (TokenAmount::from_whole(1234) + TokenAmount::from_atto(123_456_789_u64)).to_string(),
            "1234.000000000123456789"
        );
        assert_eq!(TokenAmount::from_atto(-1).to_string(), "-0.000000000000000001");
        assert_eq!((-TokenAmount::from_whole(2)).to_string(), "-2.0");
    }

    #[test]
    fn arithmetic_and_order() {
        let a = TokenAmount::from_atto(10);
        let b = TokenAmount::from_atto(4);
        assert_eq!(&a - &b, TokenAmount::from_atto(6));
        assert_eq!(a.clone() + b.clone(), TokenAmount::from_atto(14));
        assert!(b < a);
        assert!((b - a).is_negative());
    }

    #[test]
    fn serializes_as_sign_magnitude_bytes() {
        assert_eq!(to_vec(&TokenAmount::zero()).unwrap(), vec![0x40]);
        let bz = to_vec(&TokenAmount::from_atto(255)).unwrap();
        assert_eq!(bz, vec![0x42, 0x00, 0xff]);
        assert_eq!(from_slice::<TokenAmount>(&bz).unwrap(), TokenAmount::from_atto(255));
    }
}
