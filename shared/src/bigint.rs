// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub use num_bigint::*;
pub use num_integer::{self, Integer};

/// The maximum number of bytes a sign-magnitude big integer may occupy, including the sign byte.
pub const MAX_BIGINT_SIZE: usize = 128;

/// Encodes a big integer as a sign byte (`0` positive, `1` negative) followed by the big-endian
/// magnitude. Zero is the empty string.
pub fn to_sign_magnitude(int: &BigInt) -> Vec<u8> {
    let (sign, mut bz) = int.to_bytes_be();
    match sign {
        Sign::Minus => bz.insert(0, 1),
        Sign::Plus => bz.insert(0, 0),
        Sign::NoSign => bz = Vec::new(),
    }
    bz
}

/// Inverse of [`to_sign_magnitude`].
pub fn from_sign_magnitude(bz: &[u8]) -> Result<BigInt, String> {
    if bz.len() > MAX_BIGINT_SIZE {
        return Err(format!("big integer exceeds {} bytes", MAX_BIGINT_SIZE));
    }
    match bz.split_first() {
        None => Ok(BigInt::default()),
        Some((0, magnitude)) => Ok(BigInt::from_bytes_be(Sign::Plus, magnitude)),
        Some((1, magnitude)) => Ok(BigInt::from_bytes_be(Sign::Minus, magnitude)),
        Some(_) => Err("First byte must be valid sign (0, 1)".to_owned()),
    }
}

pub mod bigint_ser {
    use std::borrow::Cow;

    use serde::{Deserialize, Serialize};

    use super::*;

    /// Wrapper for serializing big ints to match filecoin spec. Serializes as bytes.
    #[derive(Serialize)]
    #[serde(transparent)]
    pub struct BigIntSer<'a>(#[serde(with = "self")] pub &'a BigInt);

    /// Wrapper for deserializing as BigInt from bytes.
    #[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq, Debug)]
    #[serde(transparent)]
    pub struct BigIntDe(#[serde(with = "self")] pub BigInt);

    /// Serializes big int as bytes following Filecoin spec.
    pub fn serialize<S>(int: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let bz = to_sign_magnitude(int);
        if bz.len() > MAX_BIGINT_SIZE {
            return Err(<S::Error as serde::ser::Error>::custom(
                "BigInt too large".to_owned(),
            ));
        }
        // Serialize as bytes
        serde_bytes::Serialize::serialize(&bz, serializer)
    }

    /// Deserializes bytes into big int.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bz: Cow<'de, [u8]> = serde_bytes::Deserialize::deserialize(deserializer)?;
        from_sign_magnitude(&bz).map_err(serde::de::Error::custom)
    }
}
