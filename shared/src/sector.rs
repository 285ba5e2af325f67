// Copyright 2021-2023 Protocol Labs
// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Sector and proof descriptions handed to the host's proof verifiers.

use actor_bridge_encoding::repr::*;
use actor_bridge_encoding::tuple::*;
use cid::Cid;
use num_derive::FromPrimitive;

use crate::randomness::Randomness;
use crate::ActorID;

/// SectorNumber is a numeric identifier for a sector. It is usually relative to a miner.
pub type SectorNumber = u64;

/// Identifier of a storage deal.
pub type DealID = u64;

/// Randomness used for sealing.
pub type SealRandomness = Randomness;

/// Randomness used when verifying the interactive part of a seal.
pub type InteractiveSealRandomness = Randomness;

/// Randomness used for PoSt challenges.
pub type PoStRandomness = Randomness;

/// Sector size in bytes.
#[derive(Clone, Debug, PartialEq, Eq, Copy, FromPrimitive, Serialize_repr, Deserialize_repr)]
#[repr(u64)]
pub enum SectorSize {
    _2KiB = 2 << 10,
    _8MiB = 8 << 20,
    _512MiB = 512 << 20,
    _32GiB = 32 << 30,
    _64GiB = 2 * (32 << 30),
}

/// Seal proof type which defines the version and sector size.
#[derive(
    PartialEq, Eq, Copy, Clone, Debug, Hash, PartialOrd, Ord, FromPrimitive, Serialize_repr,
    Deserialize_repr,
)]
#[repr(i64)]
pub enum RegisteredSealProof {
    StackedDRG2KiBV1 = 0,
    StackedDRG8MiBV1 = 1,
    StackedDRG512MiBV1 = 2,
    StackedDRG32GiBV1 = 3,
    StackedDRG64GiBV1 = 4,

    StackedDRG2KiBV1P1 = 5,
    StackedDRG8MiBV1P1 = 6,
    StackedDRG512MiBV1P1 = 7,
    StackedDRG32GiBV1P1 = 8,
    StackedDRG64GiBV1P1 = 9,
}

impl RegisteredSealProof {
    /// Returns the sector size of the proof type.
    pub fn sector_size(self) -> SectorSize {
        use RegisteredSealProof::*;
        match self {
            StackedDRG2KiBV1 | StackedDRG2KiBV1P1 => SectorSize::_2KiB,
            StackedDRG8MiBV1 | StackedDRG8MiBV1P1 => SectorSize::_8MiB,
            StackedDRG512MiBV1 | StackedDRG512MiBV1P1 => SectorSize::_512MiB,
            StackedDRG32GiBV1 | StackedDRG32GiBV1P1 => SectorSize::_32GiB,
            StackedDRG64GiBV1 | StackedDRG64GiBV1P1 => SectorSize::_64GiB,
        }
    }
}

/// Proof of spacetime type, indicating version and sector size of the proof.
#[derive(
    PartialEq, Eq, Copy, Clone, Debug, Hash, PartialOrd, Ord, FromPrimitive, Serialize_repr,
    Deserialize_repr,
)]
#[repr(i64)]
pub enum RegisteredPoStProof {
    StackedDRGWinning2KiBV1 = 0,
    StackedDRGWinning8MiBV1 = 1,
    StackedDRGWinning512MiBV1 = 2,
    StackedDRGWinning32GiBV1 = 3,
    StackedDRGWinning64GiBV1 = 4,
    StackedDRGWindow2KiBV1 = 5,
    StackedDRGWindow8MiBV1 = 6,
    StackedDRGWindow512MiBV1 = 7,
    StackedDRGWindow32GiBV1 = 8,
    StackedDRGWindow64GiBV1 = 9,
}

/// Seal aggregation scheme.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, FromPrimitive, Serialize_repr, Deserialize_repr)]
#[repr(i64)]
pub enum RegisteredAggregateProof {
    SnarkPackV1 = 0,
}

/// Replica update proof type.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, FromPrimitive, Serialize_repr, Deserialize_repr)]
#[repr(i64)]
pub enum RegisteredUpdateProof {
    StackedDRG2KiBV1 = 0,
    StackedDRG8MiBV1 = 1,
    StackedDRG512MiBV1 = 2,
    StackedDRG32GiBV1 = 3,
    StackedDRG64GiBV1 = 4,
}

/// Determines the storage miner and sector number of a sector.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct SectorID {
    pub miner: ActorID,
    pub number: SectorNumber,
}

/// Information needed to verify a seal proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct SealVerifyInfo {
    pub registered_proof: RegisteredSealProof,
    pub sector_id: SectorID,
    pub deal_ids: Vec<DealID>,
    pub randomness: SealRandomness,
    pub interactive_randomness: InteractiveSealRandomness,
    #[serde(with = "serde_bytes")]
    pub proof: Vec<u8>,
    pub sealed_cid: Cid,   // Commr
    pub unsealed_cid: Cid, // Commd
}

/// Proof of spacetime data stored on chain.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct PoStProof {
    pub post_proof: RegisteredPoStProof,
    #[serde(with = "serde_bytes")]
    pub proof_bytes: Vec<u8>,
}

/// Information about a sector necessary for PoSt verification.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct SectorInfo {
    /// Used when sealing - needs to be mapped to PoSt registered proof when used to verify a PoSt
    pub proof: RegisteredSealProof,
    pub sector_number: SectorNumber,
    pub sealed_cid: Cid,
}

/// Information needed to verify a Window PoSt submitted directly to a miner actor.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct WindowPoStVerifyInfo {
    pub randomness: PoStRandomness,
    pub proofs: Vec<PoStProof>,
    pub challenged_sectors: Vec<SectorInfo>,
    pub prover: ActorID,
}

/// One sector of an aggregated seal proof.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct AggregateSealVerifyInfo {
    pub sector_number: SectorNumber,
    pub randomness: SealRandomness,
    pub interactive_randomness: InteractiveSealRandomness,
    pub sealed_cid: Cid,   // Commr
    pub unsealed_cid: Cid, // Commd
}

/// An aggregated seal proof together with the sectors it covers.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct AggregateSealVerifyProofAndInfos {
    pub miner: ActorID,
    pub seal_proof: RegisteredSealProof,
    pub aggregate_proof: RegisteredAggregateProof,
    #[serde(with = "serde_bytes")]
    pub proof: Vec<u8>,
    pub infos: Vec<AggregateSealVerifyInfo>,
}

/// Information needed to verify a replica update.
#[derive(Debug, PartialEq, Eq, Clone, Serialize_tuple, Deserialize_tuple)]
pub struct ReplicaUpdateInfo {
    pub update_proof_type: RegisteredUpdateProof,
    pub old_sealed_cid: Cid,
    pub new_sealed_cid: Cid,
    pub new_unsealed_cid: Cid,
    #[serde(with = "serde_bytes")]
    pub proof: Vec<u8>,
}
