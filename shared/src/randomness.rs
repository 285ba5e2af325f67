// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};

/// Length of the randomness the host draws for actors.
pub const RANDOMNESS_LENGTH: usize = 32;

/// Randomness type used for generating PoSt proof randomness.
#[derive(PartialEq, Eq, Default, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Randomness(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl From<Vec<u8>> for Randomness {
    fn from(v: Vec<u8>) -> Self {
        Randomness(v)
    }
}
