// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

#[macro_use]
extern crate lazy_static;

pub mod address;
pub mod bigint;
pub mod builtin;
pub mod clock;
pub mod codec;
pub mod consensus;
pub mod crypto;
pub mod econ;
pub mod error;
pub mod piece;
pub mod randomness;
pub mod sector;
pub mod version;

pub use actor_bridge_encoding::{EMPTY_ARR_CID, IDENTITY_HASH, IPLD_RAW};

/// Identifier for Actors, includes builtin and initialized actors
pub type ActorID = u64;

/// Method number indicator for calling actor methods.
pub type MethodNum = u64;

/// Base actor send method.
pub const METHOD_SEND: MethodNum = 0;
/// Base actor constructor method.
pub const METHOD_CONSTRUCTOR: MethodNum = 1;
