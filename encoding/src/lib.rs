// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The binary codec shared by both directions of the host/actor boundary.
//!
//! Two layers live here:
//!
//! 1. A streaming [`Encoder`]/[`Decoder`] pair over a strict subset of CBOR, used to frame every
//!    request and response crossing the boundary one primitive at a time.
//! 2. Serde helpers ([`to_vec`], [`from_slice`], [`RawBytes`]) producing DAG-CBOR, used for
//!    structured values (method parameters, return values, actor state) that are embedded in
//!    those frames.
//!
//! Both layers agree on the encoding of every primitive, so a structured value can be written
//! into a frame with [`Encoder::value`] and read back with [`Decoder::value`].

#[macro_use]
extern crate lazy_static;

mod bytes;
mod cbor;
mod errors;

use cid::multihash::{Code, MultihashDigest};
use cid::Cid;

pub use serde::{self, de, ser};
pub use serde_bytes;

pub use self::bytes::*;
pub use self::cbor::{Decoder, Encoder, Major, MAX_NESTING};
pub use self::errors::*;

/// Multicodec for DAG-CBOR encoded blocks.
pub const DAG_CBOR: u64 = 0x71;

/// Multicodec for raw data.
pub const IPLD_RAW: u64 = 0x55;

/// Multihash code for the identity hash function.
pub const IDENTITY_HASH: u64 = 0x0;

/// CBOR tag marking an embedded content identifier.
pub const CID_TAG: u64 = 42;

lazy_static! {
    /// Cid of the empty array Cbor bytes (`0x80`). This is the state root of an actor that has
    /// been created but not yet constructed.
    pub static ref EMPTY_ARR_CID: Cid = cid_of(&[0x80]);
}

/// Serializes a value to DAG-CBOR.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: ser::Serialize + ?Sized,
{
    serde_ipld_dagcbor::to_vec(value).map_err(|e| Error::Serde(e.to_string()))
}

/// Deserializes a value from DAG-CBOR. The whole input must be consumed.
pub fn from_slice<'a, T>(bytes: &'a [u8]) -> Result<T, Error>
where
    T: de::Deserialize<'a>,
{
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| Error::Serde(e.to_string()))
}

/// Returns the DAG-CBOR, blake2b-256 content identifier of an encoded block.
pub fn cid_of(block: &[u8]) -> Cid {
    Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(block))
}

pub mod tuple {
    pub use serde_tuple::{self, Deserialize_tuple, Serialize_tuple};
}

pub mod repr {
    pub use serde_repr::{Deserialize_repr, Serialize_repr};
}
