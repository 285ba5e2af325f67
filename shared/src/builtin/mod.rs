// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The builtin actor kinds and their code ids.

use std::collections::HashMap;

use actor_bridge_encoding::repr::*;
use cid::multihash::Multihash;
use cid::Cid;
use num_derive::FromPrimitive;

use crate::version::ActorsVersion;
use crate::{IDENTITY_HASH, IPLD_RAW};

/// Identifies the builtin actor types.
#[derive(
    PartialEq,
    Eq,
    Clone,
    Copy,
    PartialOrd,
    Ord,
    FromPrimitive,
    Debug,
    Deserialize_repr,
    Hash,
    Serialize_repr,
)]
#[repr(i32)]
pub enum Type {
    System = 1,
    Init = 2,
    Cron = 3,
    Account = 4,
    Power = 5,
    Miner = 6,
    Market = 7,
    PaymentChannel = 8,
    Multisig = 9,
    Reward = 10,
    VerifiedRegistry = 11,
}

impl Type {
    pub const ALL: [Type; 11] = [
        Type::System,
        Type::Init,
        Type::Cron,
        Type::Account,
        Type::Power,
        Type::Miner,
        Type::Market,
        Type::PaymentChannel,
        Type::Multisig,
        Type::Reward,
        Type::VerifiedRegistry,
    ];

    /// Returns true if the actor kind represents a singleton actor. That is, an actor
    /// that cannot be constructed by a user.
    pub fn is_singleton_actor(&self) -> bool {
        matches!(
            self,
            Type::System | Type::Init | Type::Reward | Type::Cron | Type::Power | Type::Market
        )
    }

    /// Returns true if the code belongs to an account actor.
    pub fn is_account_actor(&self) -> bool {
        self == &Type::Account
    }

    /// Tests whether an actor type represents an actor that can be an external
    /// principal: i.e. an account or multisig.
    pub fn is_principal(&self) -> bool {
        self == &Type::Account || self == &Type::Multisig
    }

    /// The name embedded in this kind's code ids.
    pub fn name(&self) -> &'static str {
        match self {
            Type::System => "system",
            Type::Init => "init",
            Type::Cron => "cron",
            Type::Account => "account",
            Type::Power => "storagepower",
            Type::Miner => "storageminer",
            Type::Market => "storagemarket",
            Type::PaymentChannel => "paymentchannel",
            Type::Multisig => "multisig",
            Type::Reward => "reward",
            Type::VerifiedRegistry => "verifiedregistry",
        }
    }

    /// The code id of this kind in the given actors generation: a raw, identity-hashed CID of
    /// `fil/<n>/<name>`.
    pub fn code_id(&self, version: ActorsVersion) -> Cid {
        let name = format!("fil/{}/{}", version.code_number(), self.name());
        // The identity hash fits any digest up to 64 bytes; the longest name is well below.
        let mh = Multihash::wrap(IDENTITY_HASH, name.as_bytes())
            .unwrap_or_else(|_| Multihash::default());
        Cid::new_v1(IPLD_RAW, mh)
    }
}

pub const CALLER_TYPES_SIGNABLE: &[Type] = &[Type::Account, Type::Multisig];

impl TryFrom<&str> for Type {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Type::ALL
            .into_iter()
            .find(|t| t.name() == value)
            .ok_or_else(|| String::from("unrecognized actor type"))
    }
}

lazy_static! {
    static ref BUILTIN_CODES: HashMap<Cid, (Type, ActorsVersion)> = ActorsVersion::ALL
        .into_iter()
        .flat_map(|v| Type::ALL.into_iter().map(move |t| (t.code_id(v), (t, v))))
        .collect();
}

/// Resolves a code id to the builtin actor kind and generation it names, if any.
pub fn resolve(code: &Cid) -> Option<(Type, ActorsVersion)> {
    BUILTIN_CODES.get(code).copied()
}
