// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::atomic::{AtomicU8, Ordering};

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::{MAINNET_PREFIX, TESTNET_PREFIX};

static ATOMIC_NETWORK: AtomicU8 = AtomicU8::new(0);

/// Network defines the preconfigured networks to use with address encoding
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, Default)]
#[repr(u8)]
pub enum Network {
    #[default]
    Mainnet = 0,
    Testnet = 1,
}

impl Network {
    /// to_prefix is used to convert the network into a string
    /// used when converting address to string
    pub(super) fn to_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_PREFIX,
            Network::Testnet => TESTNET_PREFIX,
        }
    }
}

/// Gets the network used when displaying addresses.
pub fn current_network() -> Network {
    Network::from_u8(ATOMIC_NETWORK.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Sets the network used when displaying addresses.
pub fn set_current_network(network: Network) {
    ATOMIC_NETWORK.store(network as u8, Ordering::Relaxed)
}
