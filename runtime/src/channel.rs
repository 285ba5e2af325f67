// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! One request buffer to the host, one response buffer back.
//!
//! Every capability the runtime offers is a single [`Channel::call`]. The request is only lent
//! to the host for the length of the call. The response buffer belongs to the caller, which
//! decodes it and drops it (releasing it back to the host) before doing anything else.
//!
//! Every response starts with a signed exit code. Anything after it is only meaningful when that
//! code is zero.

use std::fmt;

use actor_bridge_encoding::{Decoder, Error as EncodingError};
use actor_bridge_shared::codec::DecoderExt;
use actor_bridge_shared::error::ExitCode;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use thiserror::Error;

/// The host call points. The discriminant is the call number used across the C ABI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u32)]
pub enum HostCall {
    CurrentBalance = 1,
    ResolveAddress = 2,
    GetActorCodeCid = 3,
    RandomnessFromBeacon = 4,
    RandomnessFromTickets = 5,
    Send = 6,
    NewActorAddress = 7,
    CreateActor = 8,
    DeleteActor = 9,
    ChargeGas = 10,
    Log = 11,
    StateGet = 12,
    StateCommit = 13,
    StoreGet = 14,
    StorePut = 15,
    VerifySignature = 16,
    HashBlake2b = 17,
    ComputeUnsealedSectorCid = 18,
    VerifySeal = 19,
    BatchVerifySeals = 20,
    VerifyPost = 21,
    VerifyAggregateSeals = 22,
    VerifyReplicaUpdate = 23,
    VerifyConsensusFault = 24,
    TotalFilCircSupply = 25,
}

impl HostCall {
    pub fn from_u32(n: u32) -> Option<Self> {
        FromPrimitive::from_u32(n)
    }

    /// The capability group this call belongs to.
    pub fn module(self) -> &'static str {
        use HostCall::*;
        match self {
            CurrentBalance | StateGet | StateCommit | DeleteActor => "self",
            ResolveAddress | GetActorCodeCid | NewActorAddress | CreateActor => "actor",
            RandomnessFromBeacon | RandomnessFromTickets => "rand",
            Send => "send",
            ChargeGas => "gas",
            Log => "debug",
            StoreGet | StorePut => "ipld",
            VerifySignature
            | HashBlake2b
            | ComputeUnsealedSectorCid
            | VerifySeal
            | BatchVerifySeals
            | VerifyPost
            | VerifyAggregateSeals
            | VerifyReplicaUpdate
            | VerifyConsensusFault => "crypto",
            TotalFilCircSupply => "network",
        }
    }

    pub fn name(self) -> &'static str {
        use HostCall::*;
        match self {
            CurrentBalance => "current_balance",
            ResolveAddress => "resolve_address",
            GetActorCodeCid => "get_actor_code_cid",
            RandomnessFromBeacon => "get_beacon_randomness",
            RandomnessFromTickets => "get_chain_randomness",
            Send => "send",
            NewActorAddress => "new_actor_address",
            CreateActor => "create_actor",
            DeleteActor => "self_destruct",
            ChargeGas => "charge",
            Log => "log",
            StateGet => "state_get",
            StateCommit => "state_commit",
            StoreGet => "block_get",
            StorePut => "block_put",
            VerifySignature => "verify_signature",
            HashBlake2b => "hash_blake2b",
            ComputeUnsealedSectorCid => "compute_unsealed_sector_cid",
            VerifySeal => "verify_seal",
            BatchVerifySeals => "batch_verify_seals",
            VerifyPost => "verify_post",
            VerifyAggregateSeals => "verify_aggregate_seals",
            VerifyReplicaUpdate => "verify_replica_update",
            VerifyConsensusFault => "verify_consensus_fault",
            TotalFilCircSupply => "total_fil_circ_supply",
        }
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module(), self.name())
    }
}

/// A failure to complete a round trip at all, as opposed to a non-success exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("host returned no response to {0}")]
    NoResponse(HostCall),
    #[error("host call {0} failed: {1}")]
    Host(HostCall, String),
}

/// The host side of a round trip.
pub trait Channel {
    /// The owned response buffer. Dropping it hands the memory back to the host.
    type Buffer: AsRef<[u8]>;

    /// Sends one encoded request and returns the host's encoded response.
    fn call(&self, call: HostCall, request: &[u8]) -> Result<Self::Buffer, ChannelError>;
}

/// A response buffer with its leading exit code already read.
pub struct Response<B> {
    buf: B,
    exit_code: ExitCode,
    body: usize,
}

impl<B: AsRef<[u8]>> Response<B> {
    pub fn new(buf: B) -> Result<Self, EncodingError> {
        let bytes = buf.as_ref();
        let mut dec = Decoder::new(bytes);
        let exit_code = dec.exit_code()?;
        let body = bytes.len() - dec.remaining();
        Ok(Self {
            buf,
            exit_code,
            body,
        })
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    /// A decoder over everything following the exit code.
    pub fn decoder(&self) -> Decoder<'_> {
        Decoder::new(&self.buf.as_ref()[self.body..])
    }
}

#[cfg(test)]
mod tests {
    use actor_bridge_encoding::Encoder;
    use actor_bridge_shared::codec::EncoderExt;

    use super::*;

    #[test]
    fn call_numbers_roundtrip() {
        for n in 1..=25 {
            let call = HostCall::from_u32(n).unwrap();
            assert_eq!(call as u32, n);
        }
        assert_eq!(HostCall::from_u32(0), None);
        assert_eq!(HostCall::from_u32(26), None);
        assert_eq!(HostCall::StateCommit.to_string(), "self::state_commit");
    }

    #[test]
    fn response_body_follows_exit_code() {
        let mut enc = Encoder::new();
        enc.exit_code(ExitCode::OK).bool(true).uint(300);
        let resp = Response::new(enc.into_bytes()).unwrap();
        assert!(resp.exit_code().is_success());
        let mut dec = resp.decoder();
        assert!(dec.bool().unwrap());
        assert_eq!(dec.uint().unwrap(), 300);
        assert!(dec.is_empty());
    }

    #[test]
    fn empty_response_is_malformed() {
        assert_eq!(
            Response::new(Vec::new()).err(),
            Some(EncodingError::Truncated)
        );
    }
}
